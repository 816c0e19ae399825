//! Provenance: BLAKE3 fingerprints and the JSONL synthesis event log.

pub mod eventlog;
pub mod hasher;
