//! Assembly directory I/O: manifest and template load/save (atomic).

use super::types::{AssemblyManifest, Template};
use crate::provenance::hasher;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const ASSEMBLY_SCHEMA: &str = "1.0";

/// Template file name for a stack.
pub fn template_file_name(stack_name: &str) -> String {
    format!("{}.template.json", stack_name)
}

pub fn manifest_path(out_dir: &Path) -> PathBuf {
    out_dir.join(MANIFEST_FILE)
}

/// Write a file atomically (temp file + rename).
pub fn write_atomic(path: &Path, content: &str) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("cannot create dir {}: {}", parent.display(), e))?;
    }
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);
    std::fs::write(&tmp_path, content)
        .map_err(|e| format!("cannot write {}: {}", tmp_path.display(), e))?;
    std::fs::rename(&tmp_path, path).map_err(|e| {
        format!(
            "cannot rename {} → {}: {}",
            tmp_path.display(),
            path.display(),
            e
        )
    })
}

/// Load the assembly manifest. Returns None if the directory has none yet.
pub fn load_manifest(out_dir: &Path) -> Result<Option<AssemblyManifest>, String> {
    let path = manifest_path(out_dir);
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    let manifest: AssemblyManifest = serde_json::from_str(&content)
        .map_err(|e| format!("invalid manifest {}: {}", path.display(), e))?;
    Ok(Some(manifest))
}

pub fn save_manifest(out_dir: &Path, manifest: &AssemblyManifest) -> Result<(), String> {
    let json = serde_json::to_string_pretty(manifest)
        .map_err(|e| format!("serialize error: {}", e))?;
    write_atomic(&manifest_path(out_dir), &json)
}

/// Write a template and the manifest that describes it as one unit.
///
/// The template goes to `<file>.pending` first and is only renamed into
/// place after the manifest is saved, so a failed manifest write keeps the
/// previous pair intact. `manifest.template_hash` is filled from the bytes
/// written.
pub fn save_assembly(
    out_dir: &Path,
    template: &Template,
    manifest: &mut AssemblyManifest,
) -> Result<(), String> {
    let json = serde_json::to_string_pretty(template)
        .map_err(|e| format!("serialize error: {}", e))?;
    manifest.template_hash = hasher::hash_string(&json);

    let final_path = out_dir.join(&manifest.template_file);
    let mut pending_name = final_path.as_os_str().to_owned();
    pending_name.push(".pending");
    let pending = PathBuf::from(pending_name);

    write_atomic(&pending, &json)?;
    if let Err(e) = save_manifest(out_dir, manifest) {
        let _ = std::fs::remove_file(&pending);
        return Err(e);
    }
    std::fs::rename(&pending, &final_path).map_err(|e| {
        format!(
            "cannot rename {} → {}: {}",
            pending.display(),
            final_path.display(),
            e
        )
    })
}

/// Remove staged `asset.*.zip` files not named in `keep`.
pub fn prune_assets(out_dir: &Path, keep: &[String]) -> Result<Vec<PathBuf>, String> {
    let entries = std::fs::read_dir(out_dir)
        .map_err(|e| format!("cannot read dir {}: {}", out_dir.display(), e))?;
    let mut removed = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| format!("cannot read dir {}: {}", out_dir.display(), e))?;
        let name = entry.file_name().to_string_lossy().to_string();
        if !name.starts_with("asset.") || !name.ends_with(".zip") || keep.contains(&name) {
            continue;
        }
        let path = entry.path();
        std::fs::remove_file(&path)
            .map_err(|e| format!("cannot remove {}: {}", path.display(), e))?;
        removed.push(path);
    }
    removed.sort();
    Ok(removed)
}

pub fn load_template(path: &Path) -> Result<Template, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    serde_json::from_str(&content).map_err(|e| format!("invalid template {}: {}", path.display(), e))
}

/// The template recorded by the previous synthesis into `out_dir`, if any.
/// Fails when the file on disk no longer matches the manifest's hash.
pub fn load_previous_template(out_dir: &Path) -> Result<Option<Template>, String> {
    let Some(manifest) = load_manifest(out_dir)? else {
        return Ok(None);
    };
    let path = out_dir.join(&manifest.template_file);
    if !manifest.template_hash.is_empty() {
        let content = std::fs::read_to_string(&path)
            .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
        let actual = hasher::hash_string(&content);
        if actual != manifest.template_hash {
            return Err(format!(
                "{} does not match the manifest (expected {}, got {})",
                path.display(),
                manifest.template_hash,
                actual
            ));
        }
    }
    load_template(&path).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{
        ManifestEnvironment, Resource, ResourceType, TEMPLATE_FORMAT_VERSION,
    };
    use indexmap::IndexMap;

    fn make_manifest() -> AssemblyManifest {
        AssemblyManifest {
            version: ASSEMBLY_SCHEMA.to_string(),
            stack_name: "s3-athena-workflow".to_string(),
            template_file: template_file_name("s3-athena-workflow"),
            template_hash: String::new(),
            environment: ManifestEnvironment {
                account: "123456789012".to_string(),
                region: "us-east-1".to_string(),
            },
            tags: IndexMap::from([("Environment".to_string(), "dev".to_string())]),
            assets: vec![],
            generated_at: "2026-10-18T00:00:00Z".to_string(),
            generator: "s3-athena-workflow 0.3.0".to_string(),
        }
    }

    fn make_template() -> Template {
        let mut resources = IndexMap::new();
        resources.insert(
            "ZetaBucket".to_string(),
            Resource::new(ResourceType::S3Bucket, serde_json::json!({})),
        );
        resources.insert(
            "AlphaRole".to_string(),
            Resource::new(ResourceType::IamRole, serde_json::json!({})),
        );
        Template {
            format_version: TEMPLATE_FORMAT_VERSION.to_string(),
            description: None,
            resources,
            outputs: IndexMap::new(),
        }
    }

    #[test]
    fn test_template_file_name() {
        assert_eq!(template_file_name("stack"), "stack.template.json");
    }

    #[test]
    fn test_save_and_load_manifest() {
        let dir = tempfile::tempdir().unwrap();
        save_manifest(dir.path(), &make_manifest()).unwrap();
        let loaded = load_manifest(dir.path()).unwrap().unwrap();
        assert_eq!(loaded.stack_name, "s3-athena-workflow");
        assert_eq!(loaded.environment.region, "us-east-1");
        assert!(!dir.path().join("manifest.json.tmp").exists());
    }

    #[test]
    fn test_load_manifest_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_manifest(dir.path()).unwrap().is_none());
        assert!(load_previous_template(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_load_manifest_invalid() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(manifest_path(dir.path()), "{not json").unwrap();
        assert!(load_manifest(dir.path()).unwrap_err().contains("invalid manifest"));
    }

    #[test]
    fn test_previous_template_roundtrip_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut manifest = make_manifest();
        save_assembly(dir.path(), &make_template(), &mut manifest).unwrap();
        assert!(manifest.template_hash.starts_with("blake3:"));
        let loaded = load_previous_template(dir.path()).unwrap().unwrap();
        let keys: Vec<_> = loaded.resources.keys().collect();
        assert_eq!(keys, vec!["ZetaBucket", "AlphaRole"]);
        assert!(!dir
            .path()
            .join("s3-athena-workflow.template.json.pending")
            .exists());
    }

    #[test]
    fn test_manifest_failure_keeps_previous_pair() {
        let dir = tempfile::tempdir().unwrap();
        let mut first = make_manifest();
        save_assembly(dir.path(), &make_template(), &mut first).unwrap();
        let template_path = dir.path().join(&first.template_file);
        let before = std::fs::read_to_string(&template_path).unwrap();

        // A directory squatting on the temp name makes the manifest write fail
        std::fs::create_dir(dir.path().join("manifest.json.tmp")).unwrap();
        let mut changed = make_template();
        changed.description = Some("changed".to_string());
        let mut second = make_manifest();
        assert!(save_assembly(dir.path(), &changed, &mut second).is_err());

        assert_eq!(std::fs::read_to_string(&template_path).unwrap(), before);
        assert!(!dir
            .path()
            .join("s3-athena-workflow.template.json.pending")
            .exists());
        let loaded = load_previous_template(dir.path()).unwrap().unwrap();
        assert_eq!(loaded.description, None);
    }

    #[test]
    fn test_previous_template_hash_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let mut manifest = make_manifest();
        save_assembly(dir.path(), &make_template(), &mut manifest).unwrap();
        let mut other = make_template();
        other.description = Some("edited".to_string());
        std::fs::write(
            dir.path().join(&manifest.template_file),
            serde_json::to_string_pretty(&other).unwrap(),
        )
        .unwrap();
        let err = load_previous_template(dir.path()).unwrap_err();
        assert!(err.contains("does not match the manifest"));
    }

    #[test]
    fn test_prune_assets_keeps_referenced() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("asset.aaa.zip"), "old").unwrap();
        std::fs::write(dir.path().join("asset.bbb.zip"), "new").unwrap();
        std::fs::write(dir.path().join("manifest.json"), "{}").unwrap();
        let removed = prune_assets(dir.path(), &["asset.bbb.zip".to_string()]).unwrap();
        assert_eq!(removed, vec![dir.path().join("asset.aaa.zip")]);
        assert!(dir.path().join("asset.bbb.zip").exists());
        assert!(dir.path().join("manifest.json").exists());
    }
}
