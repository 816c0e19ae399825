//! Account/region resolution.
//!
//! Explicit values in `stack.yaml` win; otherwise `CDK_DEFAULT_ACCOUNT` and
//! `CDK_DEFAULT_REGION` are consulted. Whatever is still unknown renders as a
//! pseudo-parameter reference for the provider to fill in.

use super::intrinsic::{self, Expr};
use super::types::{EnvConfig, ManifestEnvironment};
use regex::Regex;
use std::sync::OnceLock;

pub const ACCOUNT_VAR: &str = "CDK_DEFAULT_ACCOUNT";
pub const REGION_VAR: &str = "CDK_DEFAULT_REGION";

/// The target environment of a synthesis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    pub account: Option<String>,
    pub region: Option<String>,
}

impl Environment {
    /// Environment-agnostic: both values left to the provider.
    pub fn agnostic() -> Self {
        Self::default()
    }

    pub fn new(account: &str, region: &str) -> Self {
        Self {
            account: Some(account.to_string()),
            region: Some(region.to_string()),
        }
    }

    pub fn account_expr(&self) -> Expr {
        match self.account {
            Some(ref a) => Expr::lit(a.as_str()),
            None => Expr::reference(intrinsic::ACCOUNT_ID),
        }
    }

    pub fn region_expr(&self) -> Expr {
        match self.region {
            Some(ref r) => Expr::lit(r.as_str()),
            None => Expr::reference(intrinsic::REGION),
        }
    }

    pub fn to_manifest(&self) -> ManifestEnvironment {
        ManifestEnvironment {
            account: self
                .account
                .clone()
                .unwrap_or_else(|| "unknown-account".to_string()),
            region: self
                .region
                .clone()
                .unwrap_or_else(|| "unknown-region".to_string()),
        }
    }
}

fn account_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{12}$").expect("static regex"))
}

fn region_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z]{2}(-[a-z]+)+-\d$").expect("static regex"))
}

/// Resolve the environment from config, falling back to `lookup` (normally
/// `std::env::var`). Malformed values fail rather than render.
pub fn resolve_environment<F>(config: &EnvConfig, lookup: F) -> Result<Environment, String>
where
    F: Fn(&str) -> Option<String>,
{
    let account = config
        .account
        .clone()
        .or_else(|| lookup(ACCOUNT_VAR))
        .filter(|a| !a.trim().is_empty());
    let region = config
        .region
        .clone()
        .or_else(|| lookup(REGION_VAR))
        .filter(|r| !r.trim().is_empty());

    if let Some(ref a) = account {
        if !account_pattern().is_match(a) {
            return Err(format!("account '{}' must be 12 digits", a));
        }
    }
    if let Some(ref r) = region {
        if !region_pattern().is_match(r) {
            return Err(format!("region '{}' is not a valid region name", r));
        }
    }

    Ok(Environment { account, region })
}

/// Resolve against the real process environment.
pub fn resolve_from_process(config: &EnvConfig) -> Result<Environment, String> {
    resolve_environment(config, |key| std::env::var(key).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_wins_over_process_env() {
        let config = EnvConfig {
            account: Some("111111111111".to_string()),
            region: None,
        };
        let env = resolve_environment(
            &config,
            lookup_from(&[(ACCOUNT_VAR, "222222222222"), (REGION_VAR, "eu-west-1")]),
        )
        .unwrap();
        assert_eq!(env.account.as_deref(), Some("111111111111"));
        assert_eq!(env.region.as_deref(), Some("eu-west-1"));
    }

    #[test]
    fn test_agnostic_when_nothing_set() {
        let env = resolve_environment(&EnvConfig::default(), lookup_from(&[])).unwrap();
        assert_eq!(env, Environment::agnostic());
        assert_eq!(
            serde_json::to_value(env.account_expr()).unwrap(),
            serde_json::json!({"Ref": "AWS::AccountId"})
        );
        assert_eq!(
            serde_json::to_value(env.region_expr()).unwrap(),
            serde_json::json!({"Ref": "AWS::Region"})
        );
    }

    #[test]
    fn test_blank_values_are_unset() {
        let env =
            resolve_environment(&EnvConfig::default(), lookup_from(&[(ACCOUNT_VAR, "  ")])).unwrap();
        assert!(env.account.is_none());
    }

    #[test]
    fn test_malformed_account_fails() {
        let config = EnvConfig {
            account: Some("12345".to_string()),
            region: None,
        };
        let err = resolve_environment(&config, lookup_from(&[])).unwrap_err();
        assert!(err.contains("12 digits"));
    }

    #[test]
    fn test_malformed_region_fails() {
        let err = resolve_environment(&EnvConfig::default(), lookup_from(&[(REGION_VAR, "mars")]))
            .unwrap_err();
        assert!(err.contains("region"));
    }

    #[test]
    fn test_region_names_accepted() {
        for region in ["us-east-1", "ap-southeast-2", "us-gov-west-1"] {
            let env =
                resolve_environment(&EnvConfig::default(), lookup_from(&[(REGION_VAR, region)]))
                    .unwrap();
            assert_eq!(env.region.as_deref(), Some(region));
        }
    }

    #[test]
    fn test_manifest_placeholders() {
        let m = Environment::agnostic().to_manifest();
        assert_eq!(m.account, "unknown-account");
        assert_eq!(m.region, "unknown-region");
        let m = Environment::new("123456789012", "us-east-1").to_manifest();
        assert_eq!(m.account, "123456789012");
    }
}
