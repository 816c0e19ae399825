//! BLAKE3 fingerprints for asset directories and rendered resources.
//!
//! All hashes are rendered as `"blake3:{hex}"`. Asset file names and the
//! deployment resource use the bare hex via [`hex_digest`].

use std::io::Read;
use std::path::{Path, PathBuf};

const STREAM_BUF_SIZE: usize = 65536;
const PREFIX: &str = "blake3:";

/// A regular file found under an asset directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetFile {
    /// Path relative to the asset root, `/`-separated.
    pub relative: String,
    pub absolute: PathBuf,
}

/// Hash a file's contents, streaming.
pub fn hash_file(path: &Path) -> Result<String, String> {
    let mut file =
        std::fs::File::open(path).map_err(|e| format!("cannot open {}: {}", path.display(), e))?;
    let mut hasher = blake3::Hasher::new();
    let mut buf = [0u8; STREAM_BUF_SIZE];
    loop {
        let n = file
            .read(&mut buf)
            .map_err(|e| format!("read error {}: {}", path.display(), e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{}{}", PREFIX, hasher.finalize().to_hex()))
}

/// Hash a string.
pub fn hash_string(s: &str) -> String {
    format!("{}{}", PREFIX, blake3::hash(s.as_bytes()).to_hex())
}

/// Hash any serializable value through its compact JSON form.
///
/// `serde_json::Value` objects are key-sorted, so equal resources hash equal
/// regardless of how their properties were assembled.
pub fn hash_json<T: serde::Serialize>(value: &T) -> Result<String, String> {
    let json = serde_json::to_string(value).map_err(|e| format!("JSON serialize error: {}", e))?;
    Ok(hash_string(&json))
}

/// Strip the `blake3:` prefix.
pub fn hex_digest(hash: &str) -> &str {
    hash.strip_prefix(PREFIX).unwrap_or(hash)
}

/// List every regular file under `root`, sorted by relative path.
/// Symlinks are skipped.
pub fn walk_files(root: &Path) -> Result<Vec<AssetFile>, String> {
    fn walk(base: &Path, current: &Path, files: &mut Vec<AssetFile>) -> Result<(), String> {
        let read_dir = std::fs::read_dir(current)
            .map_err(|e| format!("cannot read dir {}: {}", current.display(), e))?;
        let mut children: Vec<std::fs::DirEntry> = read_dir.filter_map(|e| e.ok()).collect();
        children.sort_by_key(|e| e.file_name());

        for entry in children {
            let ft = entry
                .file_type()
                .map_err(|e| format!("stat error: {}", e))?;
            if ft.is_symlink() {
                continue;
            }
            let path = entry.path();
            if ft.is_dir() {
                walk(base, &path, files)?;
            } else if ft.is_file() {
                let rel = path
                    .strip_prefix(base)
                    .map_err(|e| format!("path prefix error: {}", e))?
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("/");
                files.push(AssetFile {
                    relative: rel,
                    absolute: path,
                });
            }
        }
        Ok(())
    }

    if !root.is_dir() {
        return Err(format!("asset source {} is not a directory", root.display()));
    }
    let mut files = Vec::new();
    walk(root, root, &mut files)?;
    files.sort_by(|a, b| a.relative.cmp(&b.relative));
    Ok(files)
}

/// Fingerprint a set of asset files: relative path and content hash of each,
/// in order.
pub fn hash_files(files: &[AssetFile]) -> Result<String, String> {
    let mut hasher = blake3::Hasher::new();
    for f in files {
        let content = hash_file(&f.absolute)?;
        hasher.update(f.relative.as_bytes());
        hasher.update(b"\0");
        hasher.update(content.as_bytes());
        hasher.update(b"\n");
    }
    Ok(format!("{}{}", PREFIX, hasher.finalize().to_hex()))
}
