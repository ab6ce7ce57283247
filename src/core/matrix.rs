//! Build matrix: one entry per target platform.
//!
//! Artifact names follow `{prefix}-{app_name}{suffix}`. The matrix is plain
//! data, so adding a platform is a config change rather than a code change.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Host operating systems a platform can be built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostOs {
    Linux,
    Windows,
    Macos,
}

impl HostOs {
    pub fn current() -> Option<Self> {
        Self::from_consts(std::env::consts::OS)
    }

    fn from_consts(os: &str) -> Option<Self> {
        match os {
            "linux" => Some(HostOs::Linux),
            "windows" => Some(HostOs::Windows),
            "macos" => Some(HostOs::Macos),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HostOs::Linux => "linux",
            HostOs::Windows => "windows",
            HostOs::Macos => "macos",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Platform {
    pub prefix: String,
    #[serde(default)]
    pub suffix: String,
    pub os: HostOs,
    pub runner: String,
    pub build_command: String,
    /// Path or glob of the packager's output, relative to the repository root.
    pub output: String,
}

impl Platform {
    pub fn artifact_name(&self, app_name: &str) -> String {
        artifact_name(&self.prefix, app_name, &self.suffix)
    }

    pub fn step_id(&self) -> String {
        format!("build.{}", self.prefix)
    }

    pub fn buildable_on(&self, host: Option<HostOs>) -> bool {
        host == Some(self.os)
    }
}

pub fn artifact_name(prefix: &str, app_name: &str, suffix: &str) -> String {
    format!("{}-{}{}", prefix, app_name, suffix)
}

pub fn find<'a>(platforms: &'a [Platform], prefix: &str) -> Result<&'a Platform> {
    platforms.iter().find(|p| p.prefix == prefix).ok_or_else(|| {
        Error::validation_invalid_argument(
            "platform",
            format!("Unknown platform '{}'", prefix),
            Some(prefix.to_string()),
            Some(platforms.iter().map(|p| p.prefix.clone()).collect()),
        )
    })
}

pub fn validate(platforms: &[Platform]) -> Result<()> {
    if platforms.is_empty() {
        return Err(Error::config_invalid_value(
            "platforms",
            None,
            "At least one platform must be configured",
        ));
    }

    let mut seen = HashSet::new();
    for platform in platforms {
        if platform.prefix.trim().is_empty() {
            return Err(Error::config_invalid_value(
                "platforms.prefix",
                None,
                "Platform prefix must not be empty",
            ));
        }
        if !seen.insert(platform.prefix.as_str()) {
            return Err(Error::config_invalid_value(
                "platforms.prefix",
                Some(platform.prefix.clone()),
                format!("Duplicate platform prefix '{}'", platform.prefix),
            ));
        }
    }

    Ok(())
}

pub fn default_platforms() -> Vec<Platform> {
    let build = "pyinstaller --onefile --name {{app_name}} smb3-foundry.py";
    vec![
        Platform {
            prefix: "linux".to_string(),
            suffix: String::new(),
            os: HostOs::Linux,
            runner: "ubuntu-latest".to_string(),
            build_command: build.to_string(),
            output: "dist/{{app_name}}".to_string(),
        },
        Platform {
            prefix: "win64".to_string(),
            suffix: ".exe".to_string(),
            os: HostOs::Windows,
            runner: "windows-latest".to_string(),
            build_command: build.to_string(),
            output: "dist/{{app_name}}.exe".to_string(),
        },
        Platform {
            prefix: "osx".to_string(),
            suffix: String::new(),
            os: HostOs::Macos,
            runner: "macos-latest".to_string(),
            build_command: build.to_string(),
            output: "dist/{{app_name}}".to_string(),
        },
    ]
}
