//! Artifact path resolution and digests.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Resolve a potentially glob-patterned path (relative to `root`) to one file.
///
/// - Without glob chars the path must exist
/// - With a glob, the most recently modified match wins
pub fn resolve_artifact_path(root: &Path, pattern: &str) -> Result<PathBuf> {
    let full = root.join(pattern);
    let full_str = full.to_string_lossy().to_string();

    if !contains_glob_chars(pattern) {
        if full.is_file() {
            return Ok(full);
        }
        return Err(Error::artifact_missing(full_str));
    }

    let entries: Vec<PathBuf> = glob::glob(&full_str)
        .map_err(|e| {
            Error::validation_invalid_argument(
                "output",
                format!("Invalid glob pattern '{}': {}", pattern, e),
                Some(pattern.to_string()),
                None,
            )
        })?
        .filter_map(|entry| entry.ok())
        .filter(|p| p.is_file())
        .collect();

    let newest = entries
        .into_iter()
        .max_by_key(|p| p.metadata().and_then(|m| m.modified()).ok());

    match newest {
        Some(path) => {
            log_status!("build", "Resolved '{}' -> '{}'", pattern, path.display());
            Ok(path)
        }
        None => Err(Error::artifact_missing(full_str)),
    }
}

fn contains_glob_chars(s: &str) -> bool {
    s.contains('*') || s.contains('?') || s.contains('[') || s.contains(']')
}

/// Hex-encoded SHA-256 of a file's contents.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| {
        Error::internal_io(e.to_string(), Some(format!("open {}", path.display())))
    })?;

    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let read = file.read(&mut buf).map_err(|e| {
            Error::internal_io(e.to_string(), Some(format!("read {}", path.display())))
        })?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn contains_glob_chars_detects_patterns() {
        assert!(contains_glob_chars("dist/*.exe"));
        assert!(contains_glob_chars("dist/app-?"));
        assert!(!contains_glob_chars("dist/smb3-foundry"));
    }

    #[test]
    fn resolves_plain_path() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("dist")).unwrap();
        fs::write(dir.path().join("dist/app"), b"x").unwrap();

        let path = resolve_artifact_path(dir.path(), "dist/app").unwrap();
        assert_eq!(path, dir.path().join("dist/app"));
    }

    #[test]
    fn missing_plain_path_is_artifact_missing() {
        let dir = TempDir::new().unwrap();
        let err = resolve_artifact_path(dir.path(), "dist/app").unwrap_err();
        assert_eq!(err.code.as_str(), "build.artifact_missing");
    }

    #[test]
    fn glob_without_matches_is_artifact_missing() {
        let dir = TempDir::new().unwrap();
        let err = resolve_artifact_path(dir.path(), "dist/*.exe").unwrap_err();
        assert_eq!(err.code.as_str(), "build.artifact_missing");
    }

    #[test]
    fn glob_resolves_single_match() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("dist")).unwrap();
        fs::write(dir.path().join("dist/app.exe"), b"x").unwrap();

        let path = resolve_artifact_path(dir.path(), "dist/*.exe").unwrap();
        assert_eq!(path.file_name().unwrap(), "app.exe");
    }

    #[test]
    fn sha256_of_known_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("abc");
        fs::write(&path, b"abc").unwrap();

        assert_eq!(
            sha256_file(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
