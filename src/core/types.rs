//! Stack configuration, resource graph, template, plan, and event types.
//!
//! Config types derive Serialize/Deserialize for YAML roundtripping. Resource
//! and template types serialize to the provider's JSON template layout.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Top-level stack.yaml
// ============================================================================

/// Root configuration: the naming inputs of the stack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackConfig {
    /// Schema version (must be "1.0")
    pub version: String,

    /// Stack name as the provider knows it
    pub name: String,

    /// Optional template description
    #[serde(default)]
    pub description: Option<String>,

    /// Base name every child resource name is derived from
    pub base_name: String,

    /// Override for the bucket name prefix (default: `<base-name>-s3`)
    #[serde(default)]
    pub bucket_prefix: Option<String>,

    /// Account/region pinning; falls back to the process environment
    #[serde(default)]
    pub env: EnvConfig,

    /// Tags applied to every taggable resource
    #[serde(default)]
    pub tags: StackTags,

    /// Catalog table layout
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Sample content seeded into the raw bucket
    #[serde(default)]
    pub assets: AssetConfig,
}

/// Explicit account/region for the stack.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvConfig {
    #[serde(default)]
    pub account: Option<String>,

    #[serde(default)]
    pub region: Option<String>,
}

/// The uniform tag set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackTags {
    /// Deployment environment label
    #[serde(default = "default_environment")]
    pub environment: String,

    #[serde(default)]
    pub repository_url: Option<String>,

    /// Project label
    #[serde(default)]
    pub source: Option<String>,

    #[serde(default)]
    pub owner: Option<String>,
}

impl Default for StackTags {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            repository_url: None,
            source: None,
            owner: None,
        }
    }
}

fn default_environment() -> String {
    "dev".to_string()
}

impl StackTags {
    /// Provider tag keys and values, sorted by key.
    pub fn to_pairs(&self) -> IndexMap<String, String> {
        let mut pairs = IndexMap::new();
        pairs.insert("Environment".to_string(), self.environment.clone());
        if let Some(ref owner) = self.owner {
            pairs.insert("Owner".to_string(), owner.clone());
        }
        if let Some(ref url) = self.repository_url {
            pairs.insert("RepositoryUrl".to_string(), url.clone());
        }
        if let Some(ref source) = self.source {
            pairs.insert("Source".to_string(), source.clone());
        }
        pairs.sort_keys();
        pairs
    }
}

/// Catalog table settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub schema: SchemaVariant,

    /// Skip one header line when reading objects
    #[serde(default = "default_true")]
    pub skip_header: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            schema: SchemaVariant::default(),
            skip_header: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Asset settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetConfig {
    /// Local directory copied verbatim into the raw bucket
    #[serde(default = "default_asset_source")]
    pub source: String,

    /// Bucket the staged zip is uploaded to before deployment
    /// (default: the bootstrap assets bucket of the target environment)
    #[serde(default)]
    pub staging_bucket: Option<String>,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            source: default_asset_source(),
            staging_bucket: None,
        }
    }
}

fn default_asset_source() -> String {
    "sample_data".to_string()
}

// ============================================================================
// Catalog schema
// ============================================================================

/// Column layout of the sample data table. The variants are not
/// schema-compatible with each other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaVariant {
    #[default]
    Products,
    ProductsWithId,
}

const PRODUCT_COLUMNS: [(&str, &str); 9] = [
    ("price", "float"),
    ("owner", "string"),
    ("title", "string"),
    ("reviews", "float"),
    ("color", "string"),
    ("availability", "string"),
    ("datetime", "string"),
    ("views", "string"),
    ("url", "string"),
];

impl SchemaVariant {
    /// Ordered columns, matching the literal layout of the seeded rows.
    pub fn columns(&self) -> Vec<Column> {
        let mut columns = Vec::with_capacity(PRODUCT_COLUMNS.len() + 1);
        if *self == Self::ProductsWithId {
            columns.push(Column::new("id", "string"));
        }
        columns.extend(PRODUCT_COLUMNS.iter().map(|(n, t)| Column::new(n, t)));
        columns
    }
}

impl fmt::Display for SchemaVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Products => write!(f, "products"),
            Self::ProductsWithId => write!(f, "products_with_id"),
        }
    }
}

/// A catalog column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Column {
    pub name: String,
    #[serde(rename = "Type")]
    pub column_type: String,
}

impl Column {
    pub fn new(name: &str, column_type: &str) -> Self {
        Self {
            name: name.to_string(),
            column_type: column_type.to_string(),
        }
    }
}

// ============================================================================
// Resources
// ============================================================================

/// Provider resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    #[serde(rename = "AWS::S3::Bucket")]
    S3Bucket,
    #[serde(rename = "AWS::S3::BucketPolicy")]
    S3BucketPolicy,
    #[serde(rename = "Custom::BucketDeployment")]
    BucketDeployment,
    #[serde(rename = "AWS::Athena::WorkGroup")]
    AthenaWorkGroup,
    #[serde(rename = "AWS::Athena::NamedQuery")]
    AthenaNamedQuery,
    #[serde(rename = "AWS::Glue::Database")]
    GlueDatabase,
    #[serde(rename = "AWS::Glue::Table")]
    GlueTable,
    #[serde(rename = "AWS::IAM::Role")]
    IamRole,
    #[serde(rename = "AWS::IAM::Policy")]
    IamPolicy,
    #[serde(rename = "AWS::Lambda::Function")]
    LambdaFunction,
}

impl ResourceType {
    /// Whether the provider accepts a `Tags` list on this type.
    pub fn is_taggable(&self) -> bool {
        matches!(
            self,
            Self::S3Bucket | Self::AthenaWorkGroup | Self::IamRole | Self::LambdaFunction
        )
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::S3Bucket => "AWS::S3::Bucket",
            Self::S3BucketPolicy => "AWS::S3::BucketPolicy",
            Self::BucketDeployment => "Custom::BucketDeployment",
            Self::AthenaWorkGroup => "AWS::Athena::WorkGroup",
            Self::AthenaNamedQuery => "AWS::Athena::NamedQuery",
            Self::GlueDatabase => "AWS::Glue::Database",
            Self::GlueTable => "AWS::Glue::Table",
            Self::IamRole => "AWS::IAM::Role",
            Self::IamPolicy => "AWS::IAM::Policy",
            Self::LambdaFunction => "AWS::Lambda::Function",
        };
        write!(f, "{}", name)
    }
}

/// What happens to a resource when it leaves the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemovalPolicy {
    Delete,
}

/// A declared resource: type, property bag, explicit ordering edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Resource {
    #[serde(rename = "Type")]
    pub resource_type: ResourceType,

    pub properties: serde_json::Value,

    /// Logical IDs that must exist before this one
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_policy: Option<RemovalPolicy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_replace_policy: Option<RemovalPolicy>,
}

impl Resource {
    pub fn new(resource_type: ResourceType, properties: serde_json::Value) -> Self {
        Self {
            resource_type,
            properties,
            depends_on: Vec::new(),
            deletion_policy: None,
            update_replace_policy: None,
        }
    }

    /// Apply the same policy on stack deletion and on replacement.
    pub fn with_removal_policy(mut self, policy: RemovalPolicy) -> Self {
        self.deletion_policy = Some(policy);
        self.update_replace_policy = Some(policy);
        self
    }
}

/// A stack output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Output {
    pub description: String,
    pub value: serde_json::Value,
}

// ============================================================================
// Template / assembly
// ============================================================================

pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";

/// The provider-consumable deployment template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub resources: IndexMap<String, Resource>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub outputs: IndexMap<String, Output>,
}

/// `manifest.json` in the assembly directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyManifest {
    pub version: String,
    pub stack_name: String,
    pub template_file: String,
    /// BLAKE3 of the template file as written
    #[serde(default)]
    pub template_hash: String,
    pub environment: ManifestEnvironment,
    /// Stack-level tags for the provisioning toolchain
    pub tags: IndexMap<String, String>,
    #[serde(default)]
    pub assets: Vec<AssetManifestEntry>,
    pub generated_at: String,
    pub generator: String,
}

/// Target environment; `unknown-*` when left to the toolchain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEnvironment {
    pub account: String,
    pub region: String,
}

/// A staged asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetManifestEntry {
    /// Hex BLAKE3 fingerprint of the source directory
    pub id: String,
    pub source_path: String,
    pub packaging: String,
    /// Zip file name inside the assembly directory
    pub file: String,
    /// Bucket the zip must be uploaded to, `${...}` placeholders for
    /// values resolved at deploy time
    pub bucket: String,
    /// Object key the deployment reads the asset from
    pub object_key: String,
    /// Logical ID of the deployment resource consuming the asset
    pub consumer: String,
}

// ============================================================================
// Plan
// ============================================================================

/// Action the toolchain would take on a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanAction {
    Create,
    Update,
    Destroy,
    NoOp,
}

impl fmt::Display for PlanAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "CREATE"),
            Self::Update => write!(f, "UPDATE"),
            Self::Destroy => write!(f, "DESTROY"),
            Self::NoOp => write!(f, "NO-OP"),
        }
    }
}

/// A single planned change.
#[derive(Debug, Clone)]
pub struct PlannedChange {
    pub logical_id: String,
    pub resource_type: ResourceType,
    pub action: PlanAction,
    pub description: String,
}

/// Diff between a fresh synthesis and the previous assembly.
#[derive(Debug, Clone)]
pub struct DiffPlan {
    pub stack_name: String,
    pub changes: Vec<PlannedChange>,
    pub to_create: u32,
    pub to_update: u32,
    pub to_destroy: u32,
    pub unchanged: u32,
}

impl DiffPlan {
    pub fn has_changes(&self) -> bool {
        self.to_create + self.to_update + self.to_destroy > 0
    }
}

// ============================================================================
// Synthesis events
// ============================================================================

/// Provenance event for the JSONL event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SynthEvent {
    SynthStarted {
        stack: String,
        run_id: String,
        generator_version: String,
    },
    ResourceDeclared {
        stack: String,
        logical_id: String,
        resource_type: String,
    },
    AssetStaged {
        stack: String,
        asset_hash: String,
        file: String,
    },
    SynthCompleted {
        stack: String,
        run_id: String,
        resources: u32,
        assets: u32,
        total_seconds: f64,
    },
    SynthFailed {
        stack: String,
        run_id: String,
        error: String,
    },
}

/// Timestamped event wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimestampedEvent {
    pub ts: String,
    #[serde(flatten)]
    pub event: SynthEvent,
}
