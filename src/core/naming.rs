//! Child resource names, all derived from one base name.
//!
//! Buckets: `<prefix>-raw-<account>` / `<prefix>-results-<account>` where the
//! prefix defaults to the base name in kebab case plus `-s3`. Everything else
//! is `<base>_<suffix>`.

use super::environment::Environment;
use super::intrinsic::Expr;
use regex::Regex;
use std::sync::OnceLock;

const MAX_BUCKET_NAME: usize = 63;
const MAX_ROLE_NAME: usize = 64;
const MAX_FUNCTION_NAME: usize = 64;
// Account IDs are always 12 digits, so the length check also holds when the
// account is left to the provider.
const ACCOUNT_ID_LEN: usize = 12;

/// The pre-canned queries registered against the workgroup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedQueryKind {
    SelectAll,
    SelectInStock,
    SelectCheapOrder,
}

impl NamedQueryKind {
    pub const ALL: [NamedQueryKind; 3] = [
        Self::SelectAll,
        Self::SelectInStock,
        Self::SelectCheapOrder,
    ];

    pub fn suffix(&self) -> &'static str {
        match self {
            Self::SelectAll => "select_all",
            Self::SelectInStock => "select_in_stock",
            Self::SelectCheapOrder => "select_cheap_order",
        }
    }

    pub fn logical_id(&self) -> &'static str {
        match self {
            Self::SelectAll => "NamedQuerySelectAll",
            Self::SelectInStock => "NamedQuerySelectInStock",
            Self::SelectCheapOrder => "NamedQuerySelectCheapOrder",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::SelectAll => "Select every row of the sample data",
            Self::SelectInStock => "Select the sample data rows that are in stock",
            Self::SelectCheapOrder => "Select the sample data ordered by ascending price",
        }
    }

    fn clause(&self) -> &'static str {
        match self {
            Self::SelectAll => "",
            Self::SelectInStock => " WHERE availability = 'In Stock'",
            Self::SelectCheapOrder => " ORDER BY price ASC",
        }
    }
}

/// Every name the stack declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNames {
    pub base: String,
    pub bucket_prefix: String,
    pub raw_bucket: Expr,
    pub results_bucket: Expr,
    pub workgroup: String,
    pub database: String,
    pub table: String,
    pub role: String,
    pub deployment_role: String,
    pub deployment_function: String,
}

impl ResourceNames {
    /// Derive all names. Fails on a malformed base name or prefix, or when a
    /// derived name would exceed the provider's length limit.
    pub fn derive(
        base: &str,
        bucket_prefix: Option<&str>,
        env: &Environment,
    ) -> Result<Self, String> {
        validate_base_name(base)?;
        let prefix = match bucket_prefix {
            Some(p) => {
                validate_bucket_prefix(p)?;
                p.to_string()
            }
            None => format!("{}-s3", base.replace('_', "-")),
        };

        // "-results-" is the longer of the two infixes
        let longest = prefix.len() + "-results-".len() + ACCOUNT_ID_LEN;
        if longest > MAX_BUCKET_NAME {
            return Err(format!(
                "bucket name '{}-results-<account>' would be {} characters (max {})",
                prefix, longest, MAX_BUCKET_NAME
            ));
        }

        let role = format!("{}_role", base);
        let deployment_role = format!("{}_deploy_role", base);
        for name in [&role, &deployment_role] {
            if name.len() > MAX_ROLE_NAME {
                return Err(format!(
                    "role name '{}' exceeds {} characters",
                    name, MAX_ROLE_NAME
                ));
            }
        }
        let deployment_function = format!("{}_bucket_deployment", base);
        if deployment_function.len() > MAX_FUNCTION_NAME {
            return Err(format!(
                "function name '{}' exceeds {} characters",
                deployment_function, MAX_FUNCTION_NAME
            ));
        }

        let bucket = |kind: &str| {
            Expr::concat([Expr::lit(format!("{}-{}-", prefix, kind)), env.account_expr()])
        };

        Ok(Self {
            base: base.to_string(),
            raw_bucket: bucket("raw"),
            results_bucket: bucket("results"),
            bucket_prefix: prefix,
            workgroup: format!("{}_workgroup", base),
            database: format!("{}_database", base),
            table: format!("{}_sample_data_table", base),
            role,
            deployment_role,
            deployment_function,
        })
    }

    pub fn query_name(&self, kind: NamedQueryKind) -> String {
        format!("{}_{}", self.base, kind.suffix())
    }

    pub fn query_text(&self, kind: NamedQueryKind) -> String {
        format!(
            "SELECT * FROM \"{}\".\"{}\"{};",
            self.database,
            self.table,
            kind.clause()
        )
    }
}

fn base_name_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z]([a-z0-9_]*[a-z0-9])?$").expect("static regex"))
}

fn bucket_prefix_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9.-]*[a-z0-9]$").expect("static regex"))
}

/// Lowercase letters, digits and underscores; starts with a letter, does not
/// end with an underscore. A single letter is allowed.
pub fn validate_base_name(base: &str) -> Result<(), String> {
    if base.is_empty() {
        return Err("base_name must not be empty".to_string());
    }
    if !base_name_pattern().is_match(base) {
        return Err(format!(
            "base_name '{}' must match [a-z]([a-z0-9_]*[a-z0-9])?",
            base
        ));
    }
    if base.contains("__") {
        return Err(format!("base_name '{}' must not contain '__'", base));
    }
    Ok(())
}

/// A complete bucket name, such as an asset staging bucket.
pub fn validate_bucket_name(name: &str) -> Result<(), String> {
    if name.len() < 3 || name.len() > MAX_BUCKET_NAME {
        return Err(format!(
            "bucket name '{}' must be 3 to {} characters",
            name, MAX_BUCKET_NAME
        ));
    }
    if !bucket_prefix_pattern().is_match(name) || name.contains("..") {
        return Err(format!("bucket name '{}' is not valid", name));
    }
    Ok(())
}

pub fn validate_bucket_prefix(prefix: &str) -> Result<(), String> {
    if !bucket_prefix_pattern().is_match(prefix) || prefix.contains("..") {
        return Err(format!(
            "bucket_prefix '{}' is not a valid bucket name prefix",
            prefix
        ));
    }
    Ok(())
}
