//! Per-platform packaging.
//!
//! Runs the platform's build command, locates the packager's output and
//! copies it into the artifact directory under its release name.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::ReleaseConfig;
use crate::error::{CommandFailedDetails, Error, Result};
use crate::matrix::{self, HostOs, Platform};
use crate::utils::artifact;
use crate::utils::command;
use crate::utils::io;
use crate::utils::template::{self, TemplateVars};

const OUTPUT_TAIL_LINES: usize = 15;

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Build even when the platform targets a different host OS.
    pub any_host: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildResult {
    pub platform: String,
    pub artifact_name: String,
    pub command: String,
    pub source: PathBuf,
    pub artifact: PathBuf,
    pub size: u64,
    pub sha256: String,
}

fn variables<'a>(config: &'a ReleaseConfig, platform: &'a Platform, name: &'a str) -> [(&'a str, &'a str); 4] {
    [
        (TemplateVars::APP_NAME, config.app_name.as_str()),
        (TemplateVars::PLATFORM, platform.prefix.as_str()),
        (TemplateVars::SUFFIX, platform.suffix.as_str()),
        (TemplateVars::ARTIFACT_NAME, name),
    ]
}

pub fn build(root: &Path, config: &ReleaseConfig, prefix: &str, options: &BuildOptions) -> Result<BuildResult> {
    let platform = matrix::find(&config.platforms, prefix)?;
    build_platform(root, config, platform, options)
}

pub fn build_platform(
    root: &Path,
    config: &ReleaseConfig,
    platform: &Platform,
    options: &BuildOptions,
) -> Result<BuildResult> {
    let host = HostOs::current();
    if !options.any_host && !platform.buildable_on(host) {
        return Err(Error::validation_invalid_argument(
            "platform",
            format!(
                "Platform '{}' builds on {} (this host: {})",
                platform.prefix,
                platform.os.as_str(),
                host.map(|h| h.as_str()).unwrap_or("unknown")
            ),
            Some(platform.prefix.clone()),
            None,
        )
        .with_hint("Pass --any-host to run the build command anyway"));
    }

    let name = platform.artifact_name(&config.app_name);
    let vars = variables(config, platform, &name);
    let cmd = template::render(&platform.build_command, &vars);
    let output_pattern = template::render(&platform.output, &vars);

    let artifact_dir = config.artifact_dir(root);
    let artifact_dir_str = artifact_dir.to_string_lossy().to_string();
    let env = [
        ("PLATFORM", platform.prefix.as_str()),
        ("APP_NAME", config.app_name.as_str()),
        ("ARTIFACT_NAME", name.as_str()),
        ("ARTIFACT_DIR", artifact_dir_str.as_str()),
    ];

    log_status!("build", "{}: {}", platform.prefix, cmd);
    let output = command::run_shell_in(root, &cmd, &env);
    if !output.success {
        let mut err = Error::build_failed(
            &platform.prefix,
            CommandFailedDetails {
                command: cmd.clone(),
                exit_code: output.exit_code,
                output_tail: output.tail(OUTPUT_TAIL_LINES),
            },
        );
        if let Some(hint) = command::exit_code_hint(output.exit_code) {
            err = err.with_hint(hint);
        }
        return Err(err);
    }

    let source = artifact::resolve_artifact_path(root, &output_pattern)?;
    let destination = artifact_dir.join(&name);
    let size = io::copy_file(
        &source,
        &destination,
        &format!("copy artifact to {}", destination.display()),
    )?;
    let sha256 = artifact::sha256_file(&destination)?;

    log_status!("build", "{} -> {} ({} bytes)", platform.prefix, destination.display(), size);

    Ok(BuildResult {
        platform: platform.prefix.clone(),
        artifact_name: name,
        command: cmd,
        source,
        artifact: destination,
        size,
        sha256,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fake_platform(command: &str) -> Platform {
        Platform {
            prefix: "linux".to_string(),
            suffix: String::new(),
            os: HostOs::Linux,
            runner: "ubuntu-latest".to_string(),
            build_command: command.to_string(),
            output: "dist/{{app_name}}".to_string(),
        }
    }

    #[test]
    fn copies_output_under_release_name() {
        let dir = TempDir::new().unwrap();
        let mut config = ReleaseConfig::default();
        config.platforms = vec![fake_platform(
            "mkdir -p dist && printf 'elf' > dist/{{app_name}}",
        )];

        let result = build(
            dir.path(),
            &config,
            "linux",
            &BuildOptions { any_host: true },
        )
        .unwrap();

        assert_eq!(result.artifact_name, "linux-smb3-foundry");
        assert!(dir.path().join("dist/release/linux-smb3-foundry").is_file());
        assert_eq!(result.size, 3);
        assert_eq!(result.sha256.len(), 64);
    }

    #[test]
    fn build_env_is_exported() {
        let dir = TempDir::new().unwrap();
        let mut config = ReleaseConfig::default();
        config.platforms = vec![fake_platform(
            "mkdir -p dist && printf \"$ARTIFACT_NAME\" > dist/$APP_NAME",
        )];

        let result = build(dir.path(), &config, "linux", &BuildOptions { any_host: true }).unwrap();
        let content = std::fs::read_to_string(result.artifact).unwrap();
        assert_eq!(content, "linux-smb3-foundry");
    }

    #[test]
    fn failed_command_is_build_failed() {
        let dir = TempDir::new().unwrap();
        let mut config = ReleaseConfig::default();
        config.platforms = vec![fake_platform("echo broken >&2; exit 3")];

        let err = build(dir.path(), &config, "linux", &BuildOptions { any_host: true }).unwrap_err();
        assert_eq!(err.code.as_str(), "build.failed");
        assert_eq!(err.details["exitCode"], 3);
    }

    #[test]
    fn missing_output_is_artifact_missing() {
        let dir = TempDir::new().unwrap();
        let mut config = ReleaseConfig::default();
        config.platforms = vec![fake_platform("true")];

        let err = build(dir.path(), &config, "linux", &BuildOptions { any_host: true }).unwrap_err();
        assert_eq!(err.code.as_str(), "build.artifact_missing");
    }

    #[test]
    fn unknown_platform() {
        let dir = TempDir::new().unwrap();
        let config = ReleaseConfig::default();
        let err = build(dir.path(), &config, "amiga", &BuildOptions::default()).unwrap_err();
        assert_eq!(err.code.as_str(), "validation.invalid_argument");
    }
}
