//! s3-athena-workflow: synthesizes the deployment template for a serverless
//! S3 + Glue + Athena query workflow.
//!
//! Two private buckets, a catalog table over CSV sample data and a query
//! workgroup with canned queries. BLAKE3 asset fingerprints and a JSONL
//! provenance log ride along with every assembly.

pub mod cli;
pub mod core;
pub mod provenance;
pub mod resources;
