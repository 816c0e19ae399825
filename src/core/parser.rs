//! stack.yaml parsing and validation.
//!
//! Validation collects every problem instead of stopping at the first:
//! - version must be "1.0"
//! - stack name must be a valid provider stack name
//! - base name and bucket prefix must produce valid child names
//! - pinned account/region must be well formed
//! - asset source and environment tag must be non-empty

use super::environment::resolve_environment;
use super::naming::{self, ResourceNames};
use super::types::*;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

const MAX_STACK_NAME: usize = 128;

/// Validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Parse a stack.yaml file from disk.
pub fn parse_config_file(path: &Path) -> Result<StackConfig, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    parse_config(&content)
}

/// Parse a stack.yaml from a string.
pub fn parse_config(yaml: &str) -> Result<StackConfig, String> {
    serde_yaml_ng::from_str(yaml).map_err(|e| format!("YAML parse error: {}", e))
}

fn stack_name_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9-]*$").expect("static regex"))
}

/// Validate a parsed config. Returns a list of errors (empty = valid).
pub fn validate_config(config: &StackConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut push = |message: String| errors.push(ValidationError { message });

    if config.version != "1.0" {
        push(format!(
            "version must be \"1.0\", got \"{}\"",
            config.version
        ));
    }

    if config.name.is_empty() {
        push("name must not be empty".to_string());
    } else if config.name.len() > MAX_STACK_NAME || !stack_name_pattern().is_match(&config.name)
    {
        push(format!(
            "name '{}' must start with a letter, contain only letters, digits and '-', and be at most {} characters",
            config.name, MAX_STACK_NAME
        ));
    }

    let base_ok = match naming::validate_base_name(&config.base_name) {
        Ok(()) => true,
        Err(e) => {
            push(e);
            false
        }
    };
    let prefix_ok = match config.bucket_prefix.as_deref() {
        Some(prefix) => match naming::validate_bucket_prefix(prefix) {
            Ok(()) => true,
            Err(e) => {
                push(e);
                false
            }
        },
        None => true,
    };

    match resolve_environment(&config.env, |_| None) {
        Ok(env) => {
            // Length limits only make sense once both inputs are well formed
            if base_ok && prefix_ok {
                if let Err(e) = ResourceNames::derive(
                    &config.base_name,
                    config.bucket_prefix.as_deref(),
                    &env,
                ) {
                    push(e);
                }
            }
        }
        Err(e) => push(e),
    }

    if config.assets.source.trim().is_empty() {
        push("assets.source must not be empty".to_string());
    }
    if let Some(bucket) = config.assets.staging_bucket.as_deref() {
        if let Err(e) = naming::validate_bucket_name(bucket) {
            push(format!("assets.staging_bucket: {}", e));
        }
    }

    if config.tags.environment.trim().is_empty() {
        push("tags.environment must not be empty".to_string());
    }

    errors
}

/// Parse and validate in one step, joining all validation errors.
pub fn load_config(path: &Path) -> Result<StackConfig, String> {
    let config = parse_config_file(path)?;
    let errors = validate_config(&config);
    if errors.is_empty() {
        return Ok(config);
    }
    let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
    Err(format!(
        "{} validation error(s) in {}:\n  - {}",
        errors.len(),
        path.display(),
        messages.join("\n  - ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
version: "1.0"
name: s3-athena-workflow
base_name: athena_tests
tags:
  environment: dev
  owner: Santiago Garcia Arango
catalog:
  schema: products_with_id
  skip_header: false
"#;

    fn messages(config: &StackConfig) -> Vec<String> {
        validate_config(config)
            .into_iter()
            .map(|e| e.message)
            .collect()
    }

    #[test]
    fn test_parse_valid() {
        let config = parse_config(VALID).unwrap();
        assert_eq!(config.name, "s3-athena-workflow");
        assert_eq!(config.catalog.schema, SchemaVariant::ProductsWithId);
        assert!(!config.catalog.skip_header);
        assert_eq!(config.tags.owner.as_deref(), Some("Santiago Garcia Arango"));
        assert!(validate_config(&config).is_empty());
    }

    #[test]
    fn test_bad_version() {
        let mut config = parse_config(VALID).unwrap();
        config.version = "2.0".to_string();
        let errors = messages(&config);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("version"));
    }

    #[test]
    fn test_bad_stack_name() {
        let mut config = parse_config(VALID).unwrap();
        config.name = "1-stack".to_string();
        assert!(messages(&config)[0].contains("name '1-stack'"));
        config.name = String::new();
        assert!(messages(&config)[0].contains("must not be empty"));
    }

    #[test]
    fn test_missing_base_name_fails_parse() {
        let yaml = "version: \"1.0\"\nname: s3-athena-workflow\n";
        assert!(parse_config(yaml).is_err());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = parse_config(VALID).unwrap();
        config.base_name = "Bad-Name".to_string();
        config.bucket_prefix = Some("UPPER".to_string());
        config.env.account = Some("12345".to_string());
        config.assets.source = String::new();
        let errors = messages(&config);
        assert_eq!(errors.len(), 4, "{:?}", errors);
    }

    #[test]
    fn test_bucket_name_length_checked() {
        let mut config = parse_config(VALID).unwrap();
        config.bucket_prefix = Some("a".repeat(45));
        let errors = messages(&config);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("max 63"));
    }

    #[test]
    fn test_staging_bucket_checked() {
        let mut config = parse_config(VALID).unwrap();
        config.assets.staging_bucket = Some("my-staging-bucket".to_string());
        assert!(messages(&config).is_empty());
        config.assets.staging_bucket = Some("Not_A_Bucket".to_string());
        let errors = messages(&config);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("assets.staging_bucket"));
    }

    #[test]
    fn test_bad_region() {
        let mut config = parse_config(VALID).unwrap();
        config.env.region = Some("mars".to_string());
        assert!(messages(&config)[0].contains("region 'mars'"));
    }

    #[test]
    fn test_unknown_schema_fails_parse() {
        let yaml = VALID.replace("products_with_id", "orders");
        assert!(parse_config(&yaml).is_err());
    }

    #[test]
    fn test_load_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stack.yaml");
        std::fs::write(&path, VALID).unwrap();
        assert_eq!(load_config(&path).unwrap().base_name, "athena_tests");

        std::fs::write(&path, VALID.replace("athena_tests", "athena__tests")).unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(err.contains("1 validation error(s)"));
        assert!(err.contains("'__'"));
    }

    #[test]
    fn test_parse_missing_file() {
        let err = parse_config_file(Path::new("/nonexistent/stack.yaml")).unwrap_err();
        assert!(err.contains("failed to read"));
    }
}
