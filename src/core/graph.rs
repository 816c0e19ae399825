//! The synthesis context: an ordered registry of declared resources.
//!
//! Resources keep registration order. Explicit ordering edges live on each
//! resource's `depends_on`; reference-derived edges are computed later by the
//! resolver.

use super::assets::AssetFingerprint;
use super::environment::Environment;
use super::intrinsic::Expr;
use super::types::{Output, Resource, ResourceType};
use indexmap::IndexMap;

/// A fingerprinted local directory shipped with the template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetSource {
    pub fingerprint: AssetFingerprint,
    /// Bucket the zip is uploaded to before the consumer reads it
    pub bucket: Expr,
    /// Logical ID of the resource that consumes the staged asset
    pub consumer: String,
}

/// The declared resource graph of one stack.
#[derive(Debug, Clone)]
pub struct StackGraph {
    pub stack_name: String,
    pub description: Option<String>,
    pub environment: Environment,
    pub tags: IndexMap<String, String>,
    resources: IndexMap<String, Resource>,
    outputs: IndexMap<String, Output>,
    assets: Vec<AssetSource>,
}

/// Logical IDs are alphanumeric and at most 255 characters.
pub fn validate_logical_id(id: &str) -> Result<(), String> {
    if id.is_empty() || id.len() > 255 || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(format!("invalid logical ID '{}'", id));
    }
    Ok(())
}

impl StackGraph {
    pub fn new(stack_name: &str, environment: Environment) -> Self {
        Self {
            stack_name: stack_name.to_string(),
            description: None,
            environment,
            tags: IndexMap::new(),
            resources: IndexMap::new(),
            outputs: IndexMap::new(),
            assets: Vec::new(),
        }
    }

    /// Register a resource. Returns a `Ref` to it.
    pub fn add(&mut self, logical_id: &str, resource: Resource) -> Result<Expr, String> {
        validate_logical_id(logical_id)?;
        if self.resources.contains_key(logical_id) {
            return Err(format!("duplicate logical ID '{}'", logical_id));
        }
        self.resources.insert(logical_id.to_string(), resource);
        Ok(Expr::reference(logical_id))
    }

    /// Declare that `logical_id` must be created after `depends_on`.
    pub fn add_dependency(&mut self, logical_id: &str, depends_on: &str) -> Result<(), String> {
        if logical_id == depends_on {
            return Err(format!("resource '{}' depends on itself", logical_id));
        }
        if !self.resources.contains_key(depends_on) {
            return Err(format!(
                "resource '{}' depends on unknown resource '{}'",
                logical_id, depends_on
            ));
        }
        let resource = self
            .resources
            .get_mut(logical_id)
            .ok_or_else(|| format!("unknown resource '{}'", logical_id))?;
        if !resource.depends_on.iter().any(|d| d == depends_on) {
            resource.depends_on.push(depends_on.to_string());
        }
        Ok(())
    }

    pub fn add_output(&mut self, name: &str, description: &str, value: &Expr) -> Result<(), String> {
        validate_logical_id(name)?;
        let value =
            serde_json::to_value(value).map_err(|e| format!("output '{}': {}", name, e))?;
        self.outputs.insert(
            name.to_string(),
            Output {
                description: description.to_string(),
                value,
            },
        );
        Ok(())
    }

    pub fn add_asset(&mut self, asset: AssetSource) {
        self.assets.push(asset);
    }

    pub fn get(&self, logical_id: &str) -> Option<&Resource> {
        self.resources.get(logical_id)
    }

    pub fn resources(&self) -> &IndexMap<String, Resource> {
        &self.resources
    }

    pub fn outputs(&self) -> &IndexMap<String, Output> {
        &self.outputs
    }

    pub fn assets(&self) -> &[AssetSource] {
        &self.assets
    }

    /// Logical IDs of every resource of one type, in registration order.
    pub fn ids_of_type(&self, resource_type: ResourceType) -> Vec<&str> {
        self.resources
            .iter()
            .filter(|(_, r)| r.resource_type == resource_type)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
