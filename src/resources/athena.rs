//! Query workgroup and named queries.

use crate::core::intrinsic::Expr;
use crate::core::types::{Resource, ResourceType};
use serde_json::json;

pub const WORKGROUP_DESCRIPTION: &str = "Athena workgroup for S3 workflows";

/// A workgroup that forces every query's results into `output_location`.
/// Removing it also removes the queries saved in it.
pub fn workgroup(name: &str, output_location: &Expr) -> Resource {
    Resource::new(
        ResourceType::AthenaWorkGroup,
        json!({
            "Name": name,
            "Description": WORKGROUP_DESCRIPTION,
            "RecursiveDeleteOption": true,
            "WorkGroupConfiguration": {
                "EnforceWorkGroupConfiguration": true,
                "ResultConfiguration": {"OutputLocation": output_location}
            }
        }),
    )
}

/// A saved query bound to a database and workgroup by name.
pub fn named_query(
    name: &str,
    description: &str,
    database: &str,
    workgroup: &str,
    query: &str,
) -> Resource {
    Resource::new(
        ResourceType::AthenaNamedQuery,
        json!({
            "Name": name,
            "Description": description,
            "Database": database,
            "WorkGroup": workgroup,
            "QueryString": query
        }),
    )
}
