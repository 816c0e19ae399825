//! Asset deployment into a bucket.
//!
//! The deployment is a custom resource backed by a small inline function:
//! it reads the staged zip from the source bucket and unpacks it into the
//! destination bucket. `SourceAssetHash` changes with the asset content,
//! which is what makes the provider re-run the copy.

use crate::core::intrinsic::{self, Expr};
use crate::core::types::{Resource, ResourceType};
use serde_json::json;

/// Source of the deployment function, shipped inline as `Code.ZipFile`.
pub const HANDLER_SOURCE: &str = include_str!("bucket_deployment_handler.py");
/// Inline function code limit.
pub const MAX_INLINE_CODE: usize = 4096;
pub const HANDLER_RUNTIME: &str = "python3.12";
pub const HANDLER_TIMEOUT_SECONDS: u32 = 300;
pub const HANDLER_MEMORY_MB: u32 = 256;
pub const LAMBDA_SERVICE: &str = "lambda.amazonaws.com";

/// Object key of a staged asset.
pub fn asset_object_key(asset_hex: &str) -> String {
    format!("asset.{}.zip", asset_hex)
}

/// Seed `destination` with the contents of a staged asset read from
/// `source_bucket`, pruning objects that are no longer in the asset.
pub fn bucket_deployment(
    destination: &Expr,
    source_bucket: &Expr,
    asset_hex: &str,
    service_token: &Expr,
) -> Resource {
    Resource::new(
        ResourceType::BucketDeployment,
        json!({
            "ServiceToken": service_token,
            "SourceBucketNames": [source_bucket],
            "SourceObjectKeys": [asset_object_key(asset_hex)],
            "DestinationBucketName": destination,
            "SourceAssetHash": asset_hex,
            "Prune": true,
            "RetainOnDelete": false
        }),
    )
}

/// The function that serves deployment requests.
pub fn handler_function(name: &str, role_arn: &Expr) -> Resource {
    Resource::new(
        ResourceType::LambdaFunction,
        json!({
            "FunctionName": name,
            "Description": "Unpacks staged assets into their destination bucket",
            "Runtime": HANDLER_RUNTIME,
            "Handler": "index.handler",
            "Role": role_arn,
            "Timeout": HANDLER_TIMEOUT_SECONDS,
            "MemorySize": HANDLER_MEMORY_MB,
            "Code": {"ZipFile": HANDLER_SOURCE}
        }),
    )
}

/// ARN of the managed policy that lets a function write its logs.
pub fn basic_execution_policy_arn() -> Expr {
    Expr::concat([
        Expr::lit("arn:"),
        Expr::reference(intrinsic::PARTITION),
        Expr::lit(":iam::aws:policy/service-role/AWSLambdaBasicExecutionRole"),
    ])
}
