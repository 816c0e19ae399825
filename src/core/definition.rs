//! The stack definition: every resource of the S3/Athena workflow, wired.
//!
//! `define_stack` is pure. The asset fingerprint is computed by the caller so
//! the same inputs always produce the same graph.

use super::assets::{self, AssetFingerprint};
use super::environment::Environment;
use super::graph::{AssetSource, StackGraph};
use super::intrinsic::Expr;
use super::naming::{NamedQueryKind, ResourceNames};
use super::types::StackConfig;
use crate::resources::{athena, deployment, glue, iam, s3};

pub const RAW_BUCKET: &str = "RawBucket";
pub const RAW_BUCKET_POLICY: &str = "RawBucketPolicy";
pub const RESULTS_BUCKET: &str = "ResultsBucket";
pub const RESULTS_BUCKET_POLICY: &str = "ResultsBucketPolicy";
pub const RAW_BUCKET_DEPLOYMENT: &str = "RawBucketDeployment";
pub const DEPLOYMENT_HANDLER: &str = "BucketDeploymentHandler";
pub const DEPLOYMENT_HANDLER_ROLE: &str = "BucketDeploymentHandlerRole";
pub const DEPLOYMENT_HANDLER_POLICY: &str = "BucketDeploymentHandlerRoleDefaultPolicy";
pub const WORKGROUP: &str = "AthenaWorkgroup";
pub const DATABASE: &str = "GlueDatabase";
pub const TABLE: &str = "GlueTable";
pub const ROLE: &str = "GlueS3Role";
pub const ROLE_DEFAULT_POLICY: &str = "GlueS3RoleDefaultPolicy";
pub const CATALOG_QUERY_POLICY: &str = "AthenaGluePolicy";

pub const ROLE_SERVICE: &str = "glue.amazonaws.com";
pub const ROLE_DESCRIPTION: &str = "Role for Glue-Athena based S3 workflows";
pub const DEPLOYMENT_ROLE_DESCRIPTION: &str = "Role for the sample data bucket deployment";

/// Template description when the config does not set one.
pub fn default_description(config: &StackConfig) -> String {
    format!(
        "Stack that creates the infrastructure for {} in {} environment",
        config.name, config.tags.environment
    )
}

/// Build the full resource graph for `config` in `env`.
pub fn define_stack(
    config: &StackConfig,
    env: &Environment,
    asset: &AssetFingerprint,
) -> Result<StackGraph, String> {
    let names = ResourceNames::derive(&config.base_name, config.bucket_prefix.as_deref(), env)?;

    let mut graph = StackGraph::new(&config.name, env.clone());
    graph.description = Some(
        config
            .description
            .clone()
            .unwrap_or_else(|| default_description(config)),
    );
    graph.tags = config.tags.to_pairs();

    // Buckets
    let raw = graph.add(RAW_BUCKET, s3::bucket(&names.raw_bucket))?;
    let raw_arn = Expr::get_att(RAW_BUCKET, "Arn");
    graph.add(RAW_BUCKET_POLICY, s3::enforce_ssl_policy(&raw, &raw_arn))?;

    let results = graph.add(RESULTS_BUCKET, s3::bucket(&names.results_bucket))?;
    let results_arn = Expr::get_att(RESULTS_BUCKET, "Arn");
    graph.add(
        RESULTS_BUCKET_POLICY,
        s3::enforce_ssl_policy(&results, &results_arn),
    )?;

    // Sample content: staged zip in the staging bucket, unpacked by the handler
    let staging = assets::staging_bucket(config.assets.staging_bucket.as_deref(), env);
    let handler_role = graph.add(
        DEPLOYMENT_HANDLER_ROLE,
        iam::with_managed_policies(
            iam::service_role(
                &names.deployment_role,
                deployment::LAMBDA_SERVICE,
                DEPLOYMENT_ROLE_DESCRIPTION,
            ),
            &[deployment::basic_execution_policy_arn()],
        ),
    )?;
    graph.add(
        DEPLOYMENT_HANDLER_POLICY,
        iam::policy(
            DEPLOYMENT_HANDLER_POLICY,
            vec![
                s3::read_statement(&s3::bucket_arn_from_name(&staging)),
                s3::read_write_statement(&raw_arn),
            ],
            std::slice::from_ref(&handler_role),
        ),
    )?;
    graph.add(
        DEPLOYMENT_HANDLER,
        deployment::handler_function(
            &names.deployment_function,
            &Expr::get_att(DEPLOYMENT_HANDLER_ROLE, "Arn"),
        ),
    )?;
    // The role's grants must exist before the handler runs
    graph.add_dependency(DEPLOYMENT_HANDLER, DEPLOYMENT_HANDLER_POLICY)?;

    graph.add(
        RAW_BUCKET_DEPLOYMENT,
        deployment::bucket_deployment(
            &raw,
            &staging,
            asset.hex(),
            &Expr::get_att(DEPLOYMENT_HANDLER, "Arn"),
        ),
    )?;
    graph.add_asset(AssetSource {
        fingerprint: asset.clone(),
        bucket: staging,
        consumer: RAW_BUCKET_DEPLOYMENT.to_string(),
    });

    // Query engine and catalog
    graph.add(
        WORKGROUP,
        athena::workgroup(&names.workgroup, &s3::s3_uri(&results)),
    )?;

    let catalog_id = env.account_expr();
    graph.add(
        DATABASE,
        glue::database(&catalog_id, &names.database, &s3::s3_uri(&results)),
    )?;
    graph.add(
        TABLE,
        glue::csv_table(
            &catalog_id,
            &names.database,
            &names.table,
            &config.catalog.schema.columns(),
            &s3::s3_uri(&raw),
            config.catalog.skip_header,
        ),
    )?;
    graph.add_dependency(TABLE, DATABASE)?;

    for kind in NamedQueryKind::ALL {
        graph.add(
            kind.logical_id(),
            athena::named_query(
                &names.query_name(kind),
                kind.description(),
                &names.database,
                &names.workgroup,
                &names.query_text(kind),
            ),
        )?;
        graph.add_dependency(kind.logical_id(), WORKGROUP)?;
    }

    // Access
    let role = graph.add(
        ROLE,
        iam::service_role(&names.role, ROLE_SERVICE, ROLE_DESCRIPTION),
    )?;
    graph.add(
        ROLE_DEFAULT_POLICY,
        iam::policy(
            ROLE_DEFAULT_POLICY,
            vec![
                s3::read_write_statement(&raw_arn),
                s3::read_write_statement(&results_arn),
            ],
            std::slice::from_ref(&role),
        ),
    )?;
    graph.add(
        CATALOG_QUERY_POLICY,
        iam::policy(
            CATALOG_QUERY_POLICY,
            vec![iam::allow(&iam::CATALOG_QUERY_ACTIONS, &[Expr::lit("*")])],
            std::slice::from_ref(&role),
        ),
    )?;

    graph.add_output("RawBucketName", "Bucket holding the raw sample data", &raw)?;
    graph.add_output(
        "ResultsBucketName",
        "Bucket receiving query results",
        &results,
    )?;
    graph.add_output("WorkgroupName", "Query workgroup", &Expr::lit(&*names.workgroup))?;
    graph.add_output("DatabaseName", "Catalog database", &Expr::lit(&*names.database))?;
    graph.add_output("TableName", "Sample data table", &Expr::lit(&*names.table))?;
    graph.add_output("RoleArn", "Access role ARN", &Expr::get_att(ROLE, "Arn"))?;

    Ok(graph)
}
