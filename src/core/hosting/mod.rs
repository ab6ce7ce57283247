//! Hosted release service (GitHub Releases).

mod github;

pub use github::GitHubClient;

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostedAsset {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub browser_download_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostedRelease {
    pub id: u64,
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub html_url: String,
    #[serde(default, skip_serializing)]
    pub upload_url: String,
    #[serde(default)]
    pub assets: Vec<HostedAsset>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NewRelease {
    pub tag_name: String,
    pub name: String,
    pub body: String,
    pub prerelease: bool,
    pub draft: bool,
}

/// Operations publish and status need from a release host.
pub trait ReleaseHost: Send + Sync {
    /// Releases, newest first.
    fn list_releases(&self) -> Result<Vec<HostedRelease>>;
    fn find_release(&self, tag: &str) -> Result<Option<HostedRelease>>;
    fn delete_release(&self, release: &HostedRelease) -> Result<()>;
    fn create_release(&self, release: &NewRelease) -> Result<HostedRelease>;
    fn upload_asset(&self, release: &HostedRelease, name: &str, path: &Path) -> Result<HostedAsset>;
}
