//! Asset fingerprinting and zip staging.
//!
//! An asset directory is fingerprinted once (sorted walk, BLAKE3) and staged
//! into the assembly as `asset.<hex>.zip`. Staging is content-addressed: an
//! existing zip for the same fingerprint is left alone.

use super::environment::Environment;
use super::intrinsic::Expr;
use super::types::AssetManifestEntry;
use crate::provenance::hasher::{self, AssetFile};
use crate::resources::deployment;
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;

/// A fingerprinted asset directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetFingerprint {
    /// Source directory as configured
    pub source_path: String,
    /// `blake3:<hex>` over relative paths and file contents
    pub hash: String,
    pub files: Vec<AssetFile>,
}

impl AssetFingerprint {
    pub fn hex(&self) -> &str {
        hasher::hex_digest(&self.hash)
    }

    pub fn file_name(&self) -> String {
        deployment::asset_object_key(self.hex())
    }

    pub fn manifest_entry(&self, consumer: &str, bucket: &Expr) -> AssetManifestEntry {
        AssetManifestEntry {
            id: self.hex().to_string(),
            source_path: self.source_path.clone(),
            packaging: "zip".to_string(),
            file: self.file_name(),
            bucket: bucket.to_placeholder(),
            object_key: self.file_name(),
            consumer: consumer.to_string(),
        }
    }
}

/// Qualifier of the default bootstrap environment.
pub const BOOTSTRAP_QUALIFIER: &str = "hnb659fds";

/// Bucket staged assets are uploaded to. Defaults to the bootstrap assets
/// bucket, `cdk-<qualifier>-assets-<account>-<region>`.
pub fn staging_bucket(configured: Option<&str>, env: &Environment) -> Expr {
    match configured {
        Some(name) => Expr::lit(name),
        None => Expr::concat([
            Expr::lit(format!("cdk-{}-assets-", BOOTSTRAP_QUALIFIER)),
            env.account_expr(),
            Expr::lit("-"),
            env.region_expr(),
        ]),
    }
}

/// Fingerprint `source`, resolved against `base_dir` when relative.
/// A missing or empty directory fails.
pub fn fingerprint(base_dir: &Path, source: &str) -> Result<AssetFingerprint, String> {
    let path = base_dir.join(source);
    let files = hasher::walk_files(&path)?;
    if files.is_empty() {
        return Err(format!("asset source {} contains no files", path.display()));
    }
    let hash = hasher::hash_files(&files)?;
    Ok(AssetFingerprint {
        source_path: source.to_string(),
        hash,
        files,
    })
}

fn file_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .unix_permissions(0o644)
}

/// Package the asset into `out_dir`. Returns the zip path.
pub fn stage(asset: &AssetFingerprint, out_dir: &Path) -> Result<PathBuf, String> {
    let path = out_dir.join(asset.file_name());
    if path.exists() {
        return Ok(path);
    }
    std::fs::create_dir_all(out_dir)
        .map_err(|e| format!("cannot create {}: {}", out_dir.display(), e))?;

    let tmp_path = path.with_extension("zip.tmp");
    if let Err(e) = write_zip(asset, &tmp_path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e);
    }

    std::fs::rename(&tmp_path, &path).map_err(|e| {
        format!(
            "cannot rename {} → {}: {}",
            tmp_path.display(),
            path.display(),
            e
        )
    })?;
    Ok(path)
}

fn write_zip(asset: &AssetFingerprint, dest: &Path) -> Result<(), String> {
    let file = std::fs::File::create(dest)
        .map_err(|e| format!("cannot create {}: {}", dest.display(), e))?;
    let mut zip = zip::ZipWriter::new(file);
    for f in &asset.files {
        zip.start_file(f.relative.clone(), file_options())
            .map_err(|e| format!("zip error for {}: {}", f.relative, e))?;
        let bytes = std::fs::read(&f.absolute)
            .map_err(|e| format!("cannot read {}: {}", f.absolute.display(), e))?;
        zip.write_all(&bytes)
            .map_err(|e| format!("zip write error for {}: {}", f.relative, e))?;
    }
    zip.finish()
        .map_err(|e| format!("cannot finish {}: {}", dest.display(), e))?;
    Ok(())
}
