//! Object storage buckets: always private, always encrypted, SSL-only.
//!
//! No parameter controls public access, encryption or transport security;
//! every bucket declared here gets the same posture.

use crate::core::intrinsic::{self, Expr};
use crate::core::types::{RemovalPolicy, Resource, ResourceType};
use serde_json::{json, Value};

/// Read-write object and bucket actions granted to the access role.
pub const READ_WRITE_ACTIONS: [&str; 10] = [
    "s3:GetObject*",
    "s3:GetBucket*",
    "s3:List*",
    "s3:DeleteObject*",
    "s3:PutObject",
    "s3:PutObjectLegalHold",
    "s3:PutObjectRetention",
    "s3:PutObjectTagging",
    "s3:PutObjectVersionTagging",
    "s3:Abort*",
];

/// Read-only actions, for reading staged assets.
pub const READ_ACTIONS: [&str; 3] = ["s3:GetObject*", "s3:GetBucket*", "s3:List*"];

/// A private, SSE-S3 encrypted, unversioned bucket removed with the stack.
pub fn bucket(name: &Expr) -> Resource {
    Resource::new(
        ResourceType::S3Bucket,
        json!({
            "BucketName": name,
            "BucketEncryption": {
                "ServerSideEncryptionConfiguration": [
                    {"ServerSideEncryptionByDefault": {"SSEAlgorithm": "AES256"}}
                ]
            },
            "PublicAccessBlockConfiguration": {
                "BlockPublicAcls": true,
                "BlockPublicPolicy": true,
                "IgnorePublicAcls": true,
                "RestrictPublicBuckets": true
            }
        }),
    )
    .with_removal_policy(RemovalPolicy::Delete)
}

/// Bucket policy denying every request not made over TLS.
pub fn enforce_ssl_policy(bucket: &Expr, bucket_arn: &Expr) -> Resource {
    Resource::new(
        ResourceType::S3BucketPolicy,
        json!({
            "Bucket": bucket,
            "PolicyDocument": {
                "Version": "2012-10-17",
                "Statement": [{
                    "Action": "s3:*",
                    "Condition": {"Bool": {"aws:SecureTransport": "false"}},
                    "Effect": "Deny",
                    "Principal": {"AWS": "*"},
                    "Resource": [bucket_arn, objects_arn(bucket_arn)]
                }]
            }
        }),
    )
}

/// Statement granting [`READ_WRITE_ACTIONS`] on a bucket and its objects.
pub fn read_write_statement(bucket_arn: &Expr) -> Value {
    json!({
        "Action": READ_WRITE_ACTIONS,
        "Effect": "Allow",
        "Resource": [bucket_arn, objects_arn(bucket_arn)]
    })
}

/// Statement granting [`READ_ACTIONS`] on a bucket and its objects.
pub fn read_statement(bucket_arn: &Expr) -> Value {
    json!({
        "Action": READ_ACTIONS,
        "Effect": "Allow",
        "Resource": [bucket_arn, objects_arn(bucket_arn)]
    })
}

/// ARN of a bucket known only by name, such as one outside the stack.
pub fn bucket_arn_from_name(bucket_name: &Expr) -> Expr {
    Expr::concat([
        Expr::lit("arn:"),
        Expr::reference(intrinsic::PARTITION),
        Expr::lit(":s3:::"),
        bucket_name.clone(),
    ])
}

/// `s3://<bucket>/`
pub fn s3_uri(bucket_name: &Expr) -> Expr {
    Expr::concat([Expr::lit("s3://"), bucket_name.clone(), Expr::lit("/")])
}

/// `<bucket-arn>/*`
pub fn objects_arn(bucket_arn: &Expr) -> Expr {
    Expr::concat([bucket_arn.clone(), Expr::lit("/*")])
}
