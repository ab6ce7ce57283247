//! The single-line version file.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::ReleaseConfig;
use crate::error::{Error, Result};
use crate::utils::io;

#[derive(Debug, Clone, Serialize)]
pub struct VersionInfo {
    pub version: String,
    pub file: String,
}

/// Read and trim the version file. A missing file means we are not at the repository root.
pub fn read_version_file(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(Error::validation_invalid_argument(
            "version_file",
            format!("Version file not found: {}", path.display()),
            None,
            None,
        )
        .with_hint("You need to be in the root of the repository (or pass --path)"));
    }

    let content = io::read_file(path, &format!("read {}", path.display()))?;
    Ok(content.trim().to_string())
}

pub fn write_version_file(path: &Path, version: &str) -> Result<()> {
    io::write_file_atomic(path, &format!("{}\n", version), "write version file")
}

pub fn read_version(root: &Path, config: &ReleaseConfig) -> Result<VersionInfo> {
    let path: PathBuf = config.version_path(root);
    Ok(VersionInfo {
        version: read_version_file(&path)?,
        file: config.version_file.clone(),
    })
}

/// Increment a semver version.
/// bump_type: "patch", "minor", or "major"
pub fn increment_version(version: &str, bump_type: &str) -> Option<String> {
    let mut parsed = semver::Version::parse(version).ok()?;
    match bump_type {
        "patch" => {
            parsed.patch += 1;
        }
        "minor" => {
            parsed.minor += 1;
            parsed.patch = 0;
        }
        "major" => {
            parsed.major += 1;
            parsed.minor = 0;
            parsed.patch = 0;
        }
        _ => return None,
    }
    parsed.pre = semver::Prerelease::EMPTY;
    parsed.build = semver::BuildMetadata::EMPTY;
    Some(parsed.to_string())
}

/// Resolve operator input: either an explicit version or a bump keyword.
pub fn resolve_requested(current: &str, requested: &str) -> Result<String> {
    let requested = requested.trim();
    if requested.is_empty() {
        return Err(Error::validation_missing_argument(vec!["version".to_string()]));
    }
    if requested.chars().any(char::is_whitespace) {
        return Err(Error::validation_invalid_argument(
            "version",
            format!("Version '{}' must be a single word", requested),
            None,
            None,
        ));
    }

    match requested {
        "patch" | "minor" | "major" => increment_version(current, requested).ok_or_else(|| {
            Error::validation_invalid_argument(
                "version",
                format!(
                    "Cannot apply '{}' bump: current version '{}' is not semver",
                    requested, current
                ),
                None,
                None,
            )
        }),
        explicit => Ok(explicit.to_string()),
    }
}

/// Non-blocking observations about a version change.
pub fn bump_warnings(current: &str, new: &str) -> Vec<String> {
    let mut warnings = Vec::new();
    match (semver::Version::parse(current), semver::Version::parse(new)) {
        (_, Err(_)) => warnings.push(format!("New version '{}' is not semver", new)),
        (Ok(old), Ok(next)) if next < old => warnings.push(format!(
            "New version '{}' is lower than current version '{}'",
            new, current
        )),
        _ => {}
    }
    warnings
}
