//! Metadata catalog: database and a CSV-backed external table.

use crate::core::intrinsic::Expr;
use crate::core::types::{Column, Resource, ResourceType};
use serde_json::json;

pub const DATABASE_DESCRIPTION: &str = "Glue database to be used in simple s3-athena workflows";
pub const INPUT_FORMAT: &str = "org.apache.hadoop.mapred.TextInputFormat";
pub const OUTPUT_FORMAT: &str = "org.apache.hadoop.hive.ql.io.HiveIgnoreKeyTextOutputFormat";
pub const SERDE_LIBRARY: &str = "org.apache.hadoop.hive.serde2.lazy.LazySimpleSerDe";

pub fn database(catalog_id: &Expr, name: &str, location: &Expr) -> Resource {
    Resource::new(
        ResourceType::GlueDatabase,
        json!({
            "CatalogId": catalog_id,
            "DatabaseInput": {
                "Name": name,
                "LocationUri": location,
                "Description": DATABASE_DESCRIPTION
            }
        }),
    )
}

/// External table over comma-delimited text objects at `location`.
///
/// The database is referenced by name only, so the caller has to add the
/// ordering edge to the database resource.
pub fn csv_table(
    catalog_id: &Expr,
    database_name: &str,
    name: &str,
    columns: &[Column],
    location: &Expr,
    skip_header: bool,
) -> Resource {
    let mut parameters = json!({"classification": "csv"});
    if skip_header {
        parameters["skip.header.line.count"] = json!("1");
    }

    Resource::new(
        ResourceType::GlueTable,
        json!({
            "CatalogId": catalog_id,
            "DatabaseName": database_name,
            "TableInput": {
                "Name": name,
                "TableType": "EXTERNAL_TABLE",
                "Parameters": parameters,
                "StorageDescriptor": {
                    "Columns": columns,
                    "Location": location,
                    "InputFormat": INPUT_FORMAT,
                    "OutputFormat": OUTPUT_FORMAT,
                    "SerdeInfo": {
                        "SerializationLibrary": SERDE_LIBRARY,
                        "Parameters": {
                            "serialization.format": ",",
                            "line.delim": "",
                            "field.delim": ","
                        }
                    }
                }
            }
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::SchemaVariant;

    fn table(skip_header: bool) -> Resource {
        csv_table(
            &Expr::reference("AWS::AccountId"),
            "athena_tests_database",
            "athena_tests_sample_data_table",
            &SchemaVariant::Products.columns(),
            &Expr::lit("s3://raw/"),
            skip_header,
        )
    }

    #[test]
    fn test_database_properties() {
        let r = database(
            &Expr::reference("AWS::AccountId"),
            "athena_tests_database",
            &Expr::lit("s3://results/"),
        );
        assert_eq!(r.resource_type, ResourceType::GlueDatabase);
        assert_eq!(r.properties["CatalogId"], json!({"Ref": "AWS::AccountId"}));
        assert_eq!(r.properties["DatabaseInput"]["Name"], "athena_tests_database");
        assert_eq!(r.properties["DatabaseInput"]["LocationUri"], "s3://results/");
    }

    #[test]
    fn test_table_columns_in_order() {
        let r = table(true);
        let sd = &r.properties["TableInput"]["StorageDescriptor"];
        let cols = sd["Columns"].as_array().unwrap();
        assert_eq!(cols.len(), 9);
        assert_eq!(cols[0], json!({"Name": "price", "Type": "float"}));
        assert_eq!(cols[8], json!({"Name": "url", "Type": "string"}));
        assert_eq!(sd["Location"], "s3://raw/");
    }

    #[test]
    fn test_table_serde_is_comma_delimited() {
        let r = table(true);
        let serde = &r.properties["TableInput"]["StorageDescriptor"]["SerdeInfo"];
        assert_eq!(serde["SerializationLibrary"], SERDE_LIBRARY);
        assert_eq!(serde["Parameters"]["field.delim"], ",");
        assert_eq!(serde["Parameters"]["serialization.format"], ",");
        assert_eq!(serde["Parameters"]["line.delim"], "");
    }

    #[test]
    fn test_table_header_skip_flag() {
        let with = table(true);
        assert_eq!(
            with.properties["TableInput"]["Parameters"]["skip.header.line.count"],
            "1"
        );
        let without = table(false);
        assert!(without.properties["TableInput"]["Parameters"]
            .get("skip.header.line.count")
            .is_none());
    }
}
