//! Provider intrinsic expressions.
//!
//! Values that are only known at deploy time (the account ID, a bucket's
//! generated name, a role's ARN) are carried as `Ref` / `Fn::GetAtt` /
//! `Fn::Join` expressions. Joins whose parts are all literal collapse to a
//! plain string.

use serde::ser::{Serialize, SerializeMap, Serializer};

pub const ACCOUNT_ID: &str = "AWS::AccountId";
pub const REGION: &str = "AWS::Region";
pub const PARTITION: &str = "AWS::Partition";

/// A template value that may be resolved by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Literal(String),
    Ref(String),
    GetAtt(String, String),
    Join(Vec<Expr>),
}

impl Expr {
    pub fn lit(s: impl Into<String>) -> Self {
        Self::Literal(s.into())
    }

    pub fn reference(logical_id: impl Into<String>) -> Self {
        Self::Ref(logical_id.into())
    }

    pub fn get_att(logical_id: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::GetAtt(logical_id.into(), attribute.into())
    }

    /// Concatenate with an empty delimiter, merging adjacent literals and
    /// flattening nested joins.
    pub fn concat(parts: impl IntoIterator<Item = Expr>) -> Self {
        let mut merged: Vec<Expr> = Vec::new();
        for part in parts {
            let pieces = match part {
                Self::Join(inner) => inner,
                other => vec![other],
            };
            for piece in pieces {
                if let Self::Literal(ref s) = piece {
                    if s.is_empty() {
                        continue;
                    }
                }
                if let (Some(Self::Literal(prev)), Self::Literal(s)) = (merged.last_mut(), &piece) {
                    prev.push_str(s);
                    continue;
                }
                merged.push(piece);
            }
        }
        match merged.len() {
            0 => Self::Literal(String::new()),
            1 => merged.remove(0),
            _ => Self::Join(merged),
        }
    }

    /// The literal value, when nothing is left to the provider.
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Self::Literal(s) => Some(s),
            _ => None,
        }
    }

    /// Flat `${...}` placeholder form, as used by asset manifests:
    /// `Ref` becomes `${Id}` and `Fn::GetAtt` becomes `${Id.Attr}`.
    pub fn to_placeholder(&self) -> String {
        match self {
            Self::Literal(s) => s.clone(),
            Self::Ref(id) => format!("${{{}}}", id),
            Self::GetAtt(id, attr) => format!("${{{}.{}}}", id, attr),
            Self::Join(parts) => parts.iter().map(Self::to_placeholder).collect(),
        }
    }
}

impl Serialize for Expr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Literal(s) => serializer.serialize_str(s),
            Self::Ref(id) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Ref", id)?;
                map.end()
            }
            Self::GetAtt(id, attr) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Fn::GetAtt", &[id, attr])?;
                map.end()
            }
            Self::Join(parts) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Fn::Join", &("", parts))?;
                map.end()
            }
        }
    }
}

/// Walk a rendered property bag and collect every logical ID it references.
pub fn collect_references(value: &serde_json::Value, out: &mut Vec<String>) {
    match value {
        serde_json::Value::Object(map) => {
            if map.len() == 1 {
                if let Some(serde_json::Value::String(id)) = map.get("Ref") {
                    if !id.starts_with("AWS::") {
                        out.push(id.clone());
                    }
                    return;
                }
                if let Some(serde_json::Value::Array(args)) = map.get("Fn::GetAtt") {
                    if let Some(serde_json::Value::String(id)) = args.first() {
                        out.push(id.clone());
                    }
                    return;
                }
            }
            for v in map.values() {
                collect_references(v, out);
            }
        }
        serde_json::Value::Array(items) => {
            for v in items {
                collect_references(v, out);
            }
        }
        _ => {}
    }
}
