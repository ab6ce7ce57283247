use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::matrix::{self, Platform};
use crate::utils::io;

pub const CONFIG_FILE: &str = "foundry-release.json";

/// Root configuration structure for foundry-release.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseConfig {
    #[serde(default = "default_app_name")]
    pub app_name: String,

    #[serde(default = "default_version_file")]
    pub version_file: String,

    #[serde(default = "default_remote")]
    pub remote: String,

    #[serde(default = "default_branches")]
    pub branches: BranchConfig,

    #[serde(default = "default_gates")]
    pub gates: GateConfig,

    #[serde(default = "default_nightly")]
    pub nightly: NightlyConfig,

    #[serde(default = "matrix::default_platforms")]
    pub platforms: Vec<Platform>,

    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: String,

    #[serde(default = "default_publish")]
    pub publish: PublishConfig,

    #[serde(default = "default_workflow")]
    pub workflow: WorkflowConfig,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            version_file: default_version_file(),
            remote: default_remote(),
            branches: default_branches(),
            gates: default_gates(),
            nightly: default_nightly(),
            platforms: matrix::default_platforms(),
            artifact_dir: default_artifact_dir(),
            publish: default_publish(),
            workflow: default_workflow(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchConfig {
    /// Branch prefix that nightly rotation runs on.
    #[serde(default = "default_dev_branch")]
    pub dev: String,
    /// Branch that dev is merged into before tagging a release.
    #[serde(default = "default_release_branch")]
    pub release: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    #[serde(default = "default_style_gate")]
    pub style: String,
    #[serde(default = "default_analysis_gate")]
    pub analysis: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationStrategy {
    /// Delete the remote tag, then push the new one.
    DeleteThenCreate,
    /// Skip the remote delete and rely on the force-push replacing the ref.
    ForceReplace,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NightlyConfig {
    #[serde(default = "default_nightly_tag")]
    pub tag: String,
    #[serde(default = "default_strategy")]
    pub strategy: RotationStrategy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    /// `owner/repo` on the hosting service.
    #[serde(default = "default_repository")]
    pub repository: String,

    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_html_url")]
    pub html_url: String,

    #[serde(default = "default_token_env")]
    pub token_env: String,

    #[serde(default = "default_tag_pattern")]
    pub tag_pattern: String,

    /// External command run with `EXPECTED_TAG` set; non-zero blocks the release.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_check: Option<String>,

    #[serde(default = "default_true")]
    pub verify_version_file: bool,

    #[serde(default = "default_body_lines")]
    pub body_lines: usize,

    /// Per-asset upload timeout. Unset means uploads may take as long as they need.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    #[serde(default = "default_workflow_name")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub python_version: Option<String>,
    /// Commands run at the start of every job.
    #[serde(default)]
    pub setup: Vec<String>,
    /// Secret holding a token whose tag pushes start new workflow runs.
    /// Pushes made with the built-in `GITHUB_TOKEN` never do.
    #[serde(default = "default_push_token_secret")]
    pub push_token_secret: String,
    #[serde(default = "default_git_user_name")]
    pub git_user_name: String,
    #[serde(default = "default_git_user_email")]
    pub git_user_email: String,
}

// =============================================================================
// Default value functions
// =============================================================================

fn default_app_name() -> String {
    "smb3-foundry".to_string()
}

fn default_version_file() -> String {
    "VERSION".to_string()
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_branches() -> BranchConfig {
    BranchConfig {
        dev: default_dev_branch(),
        release: default_release_branch(),
    }
}

fn default_dev_branch() -> String {
    "dev".to_string()
}

fn default_release_branch() -> String {
    "master".to_string()
}

fn default_gates() -> GateConfig {
    GateConfig {
        style: default_style_gate(),
        analysis: default_analysis_gate(),
    }
}

fn default_style_gate() -> String {
    "black --check .".to_string()
}

fn default_analysis_gate() -> String {
    "flake8 .".to_string()
}

fn default_nightly() -> NightlyConfig {
    NightlyConfig {
        tag: default_nightly_tag(),
        strategy: default_strategy(),
    }
}

fn default_nightly_tag() -> String {
    "nightly".to_string()
}

fn default_strategy() -> RotationStrategy {
    RotationStrategy::DeleteThenCreate
}

fn default_artifact_dir() -> String {
    "dist/release".to_string()
}

fn default_publish() -> PublishConfig {
    PublishConfig {
        repository: default_repository(),
        api_url: default_api_url(),
        html_url: default_html_url(),
        token_env: default_token_env(),
        tag_pattern: default_tag_pattern(),
        tag_check: None,
        verify_version_file: true,
        body_lines: default_body_lines(),
        upload_timeout_secs: None,
    }
}

fn default_repository() -> String {
    "mchlnix/SMB3-Foundry".to_string()
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_html_url() -> String {
    "https://github.com".to_string()
}

fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}

fn default_tag_pattern() -> String {
    r"^(nightly|\d+\.\d+\.\d+([-+][0-9A-Za-z.-]+)?)$".to_string()
}

fn default_true() -> bool {
    true
}

fn default_body_lines() -> usize {
    3
}

fn default_workflow_name() -> String {
    "Release".to_string()
}

fn default_push_token_secret() -> String {
    "RELEASE_TOKEN".to_string()
}

fn default_git_user_name() -> String {
    "github-actions[bot]".to_string()
}

fn default_git_user_email() -> String {
    "41898282+github-actions[bot]@users.noreply.github.com".to_string()
}

fn default_workflow() -> WorkflowConfig {
    WorkflowConfig {
        name: default_workflow_name(),
        python_version: Some("3.11".to_string()),
        setup: vec![
            "pip install -r requirements.txt black flake8 pyinstaller".to_string(),
            "cargo install --locked foundry-release".to_string(),
        ],
        push_token_secret: default_push_token_secret(),
        git_user_name: default_git_user_name(),
        git_user_email: default_git_user_email(),
    }
}

// =============================================================================
// Loading functions
// =============================================================================

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Load foundry-release.json from the repository root.
/// A missing file yields built-in defaults; an unreadable or invalid file is an error.
pub fn load(root: &Path) -> Result<ReleaseConfig> {
    let path = config_path(root);
    if !path.exists() {
        return Ok(ReleaseConfig::default());
    }

    let content = io::read_file(&path, &format!("read {}", path.display()))?;
    let config: ReleaseConfig = serde_json::from_str(&content)
        .map_err(|e| Error::config_invalid_json(path.display().to_string(), e))?;
    config.validate()?;
    Ok(config)
}

/// Write the config to foundry-release.json, refusing to overwrite unless `force`.
pub fn save(root: &Path, config: &ReleaseConfig, force: bool) -> Result<PathBuf> {
    let path = config_path(root);
    if path.exists() && !force {
        return Err(Error::validation_invalid_argument(
            "config",
            format!("{} already exists", path.display()),
            None,
            None,
        )
        .with_hint("Pass --force to overwrite it"));
    }

    let content = serde_json::to_string_pretty(config).map_err(|e| {
        Error::internal_json(e.to_string(), Some(format!("serialize {}", CONFIG_FILE)))
    })?;
    io::write_file_atomic(&path, &format!("{}\n", content), &format!("write {}", CONFIG_FILE))?;
    Ok(path)
}

impl ReleaseConfig {
    pub fn validate(&self) -> Result<()> {
        if self.app_name.trim().is_empty() {
            return Err(Error::config_missing_key("app_name", Some(CONFIG_FILE.to_string())));
        }
        if self.nightly.tag.trim().is_empty() {
            return Err(Error::config_missing_key("nightly.tag", Some(CONFIG_FILE.to_string())));
        }
        if self.publish.body_lines == 0 {
            return Err(Error::config_invalid_value(
                "publish.body_lines",
                Some("0".to_string()),
                "Release body needs at least one line",
            ));
        }
        if let Err(e) = regex::Regex::new(&self.publish.tag_pattern) {
            return Err(Error::config_invalid_value(
                "publish.tag_pattern",
                Some(self.publish.tag_pattern.clone()),
                format!("Invalid regex: {}", e),
            ));
        }
        matrix::validate(&self.platforms)
    }

    pub fn version_path(&self, root: &Path) -> PathBuf {
        root.join(&self.version_file)
    }

    pub fn artifact_dir(&self, root: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(&self.artifact_dir).to_string();
        root.join(expanded)
    }

    pub fn dev_ref_prefix(&self) -> String {
        format!("refs/heads/{}", self.branches.dev)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load(dir.path()).unwrap();
        assert_eq!(config.app_name, "smb3-foundry");
        assert_eq!(config.nightly.tag, "nightly");
        assert_eq!(config.platforms.len(), 3);
        assert_eq!(config.publish.body_lines, 3);
    }

    #[test]
    fn partial_file_merges_with_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            config_path(dir.path()),
            r#"{ "app_name": "scribe", "remote": "upstream" }"#,
        )
        .unwrap();

        let config = load(dir.path()).unwrap();
        assert_eq!(config.app_name, "scribe");
        assert_eq!(config.remote, "upstream");
        assert_eq!(config.version_file, "VERSION");
        assert_eq!(config.nightly.strategy, RotationStrategy::DeleteThenCreate);
    }

    #[test]
    fn partial_publish_section_keeps_repository_default() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            config_path(dir.path()),
            r#"{ "publish": { "tag_check": "./check-tag.sh" } }"#,
        )
        .unwrap();

        let config = load(dir.path()).unwrap();
        assert_eq!(config.publish.repository, "mchlnix/SMB3-Foundry");
        assert_eq!(config.publish.tag_check.as_deref(), Some("./check-tag.sh"));
        assert_eq!(config.publish.token_env, "GITHUB_TOKEN");
        assert_eq!(config.workflow.push_token_secret, "RELEASE_TOKEN");
    }

    #[test]
    fn invalid_json_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(config_path(dir.path()), "{ not json").unwrap();

        let err = load(dir.path()).unwrap_err();
        assert_eq!(err.code.as_str(), "config.invalid_json");
    }

    #[test]
    fn bad_tag_pattern_is_rejected() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            config_path(dir.path()),
            r#"{ "publish": { "repository": "a/b", "tag_pattern": "([" } }"#,
        )
        .unwrap();

        let err = load(dir.path()).unwrap_err();
        assert_eq!(err.code.as_str(), "config.invalid_value");
    }

    #[test]
    fn save_refuses_overwrite_without_force() {
        let dir = TempDir::new().unwrap();
        let config = ReleaseConfig::default();
        save(dir.path(), &config, false).unwrap();
        assert!(save(dir.path(), &config, false).is_err());
        assert!(save(dir.path(), &config, true).is_ok());

        let reloaded = load(dir.path()).unwrap();
        assert_eq!(reloaded.platforms, config.platforms);
    }

    #[test]
    fn default_tag_pattern_accepts_versions_and_nightly() {
        let re = regex::Regex::new(&default_tag_pattern()).unwrap();
        assert!(re.is_match("nightly"));
        assert!(re.is_match("1.3.0"));
        assert!(re.is_match("4.0.0-beta.1"));
        assert!(!re.is_match("v1.3"));
        assert!(!re.is_match("latest"));
    }
}
