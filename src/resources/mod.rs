//! Resource handlers: property bags for each provider resource type.
//!
//! Each handler returns a [`Resource`](crate::core::types::Resource) with its
//! properties filled in. Cross-resource values come in as
//! [`Expr`](crate::core::intrinsic::Expr) so references survive into the
//! template untouched.

pub mod athena;
pub mod deployment;
pub mod glue;
pub mod iam;
pub mod s3;
