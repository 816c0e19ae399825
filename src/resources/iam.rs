//! Access role and inline policies.

use crate::core::intrinsic::Expr;
use crate::core::types::{Resource, ResourceType};
use serde_json::{json, Value};

pub const POLICY_VERSION: &str = "2012-10-17";

/// Wildcard grant on the catalog and query services.
pub const CATALOG_QUERY_ACTIONS: [&str; 2] = ["athena:*", "glue:*"];

/// A role assumable by one service principal.
pub fn service_role(name: &str, service: &str, description: &str) -> Resource {
    Resource::new(
        ResourceType::IamRole,
        json!({
            "RoleName": name,
            "Description": description,
            "AssumeRolePolicyDocument": {
                "Version": POLICY_VERSION,
                "Statement": [{
                    "Action": "sts:AssumeRole",
                    "Effect": "Allow",
                    "Principal": {"Service": service}
                }]
            }
        }),
    )
}

/// Attach managed policies to a role.
pub fn with_managed_policies(mut role: Resource, arns: &[Expr]) -> Resource {
    if let Value::Object(ref mut props) = role.properties {
        props.insert("ManagedPolicyArns".to_string(), json!(arns));
    }
    role
}

/// An allow statement. A single action renders as a bare string.
pub fn allow(actions: &[&str], resources: &[Expr]) -> Value {
    let action = match actions {
        [single] => json!(single),
        many => json!(many),
    };
    let resource = match resources {
        [single] => json!(single),
        many => json!(many),
    };
    json!({"Action": action, "Effect": "Allow", "Resource": resource})
}

/// An inline policy attached to `roles`.
pub fn policy(name: &str, statements: Vec<Value>, roles: &[Expr]) -> Resource {
    Resource::new(
        ResourceType::IamPolicy,
        json!({
            "PolicyName": name,
            "PolicyDocument": {
                "Version": POLICY_VERSION,
                "Statement": statements
            },
            "Roles": roles
        }),
    )
}
