//! Update check: compare the local version with the newest hosted release.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::ReleaseConfig;
use crate::error::Result;
use crate::hosting::ReleaseHost;
use crate::version;

#[derive(Debug, Clone, Serialize)]
pub struct UpdateStatus {
    pub local_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_published_at: Option<DateTime<Utc>>,
    pub update_available: bool,
    pub latest_url: String,
    pub nightly_url: String,
}

fn release_url(config: &ReleaseConfig, tag: &str) -> String {
    format!(
        "{}/{}/releases/tag/{}",
        config.publish.html_url.trim_end_matches('/'),
        config.publish.repository,
        tag
    )
}

pub fn check(root: &Path, config: &ReleaseConfig, host: &dyn ReleaseHost) -> Result<UpdateStatus> {
    let local = version::read_version(root, config)?;
    let releases = host.list_releases()?;
    // Newest first; the nightly release is recreated on every dev push, so skip it.
    let latest = releases
        .iter()
        .find(|r| !r.prerelease && r.tag_name != config.nightly.tag);

    let latest_tag = latest.map(|r| r.tag_name.clone());
    let update_available = latest_tag
        .as_deref()
        .is_some_and(|tag| tag != local.version);

    let latest_url = match latest_tag.as_deref() {
        Some(tag) => release_url(config, tag),
        None => format!(
            "{}/{}/releases",
            config.publish.html_url.trim_end_matches('/'),
            config.publish.repository
        ),
    };

    if update_available {
        log_status!(
            "status",
            "Update available: {} -> {}",
            local.version,
            latest_tag.as_deref().unwrap_or_default()
        );
    }

    Ok(UpdateStatus {
        local_version: local.version,
        latest_published_at: latest.and_then(|r| r.published_at),
        latest_tag,
        update_available,
        latest_url,
        nightly_url: release_url(config, &config.nightly.tag),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::hosting::{HostedAsset, HostedRelease, NewRelease};
    use tempfile::TempDir;

    struct ListOnly(Vec<&'static str>);

    impl ReleaseHost for ListOnly {
        fn list_releases(&self) -> Result<Vec<HostedRelease>> {
            Ok(self
                .0
                .iter()
                .enumerate()
                .map(|(i, tag)| HostedRelease {
                    id: i as u64,
                    tag_name: tag.to_string(),
                    name: None,
                    body: None,
                    prerelease: *tag == "nightly",
                    html_url: String::new(),
                    upload_url: String::new(),
                    assets: Vec::new(),
                    published_at: None,
                })
                .collect())
        }

        fn find_release(&self, _tag: &str) -> Result<Option<HostedRelease>> {
            Ok(None)
        }

        fn delete_release(&self, _release: &HostedRelease) -> Result<()> {
            Ok(())
        }

        fn create_release(&self, _release: &NewRelease) -> Result<HostedRelease> {
            Err(Error::internal_unexpected("read-only"))
        }

        fn upload_asset(&self, _release: &HostedRelease, _name: &str, _path: &Path) -> Result<HostedAsset> {
            Err(Error::internal_unexpected("read-only"))
        }
    }

    fn repo_at(version: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("VERSION"), format!("{}\n", version)).unwrap();
        dir
    }

    #[test]
    fn newer_release_is_an_update() {
        let dir = repo_at("1.2.3");
        let status = check(dir.path(), &ReleaseConfig::default(), &ListOnly(vec!["1.3.0", "1.2.3"])).unwrap();
        assert!(status.update_available);
        assert_eq!(
            status.latest_url,
            "https://github.com/mchlnix/SMB3-Foundry/releases/tag/1.3.0"
        );
        assert_eq!(
            status.nightly_url,
            "https://github.com/mchlnix/SMB3-Foundry/releases/tag/nightly"
        );
    }

    #[test]
    fn same_version_or_nightly_is_not_an_update() {
        let dir = repo_at("1.3.0");
        let config = ReleaseConfig::default();
        assert!(!check(dir.path(), &config, &ListOnly(vec!["1.3.0"])).unwrap().update_available);
        assert!(!check(dir.path(), &config, &ListOnly(vec!["nightly", "1.3.0"])).unwrap().update_available);
    }

    #[test]
    fn nightly_listed_first_does_not_hide_stable_release() {
        let dir = repo_at("1.2.3");
        let status = check(
            dir.path(),
            &ReleaseConfig::default(),
            &ListOnly(vec!["nightly", "1.3.0", "1.2.3"]),
        )
        .unwrap();
        assert_eq!(status.latest_tag.as_deref(), Some("1.3.0"));
        assert!(status.update_available);
    }

    #[test]
    fn only_nightly_is_no_release() {
        let dir = repo_at("1.2.3");
        let status = check(dir.path(), &ReleaseConfig::default(), &ListOnly(vec!["nightly"])).unwrap();
        assert!(status.latest_tag.is_none());
        assert!(!status.update_available);
    }

    #[test]
    fn no_releases() {
        let dir = repo_at("1.3.0");
        let status = check(dir.path(), &ReleaseConfig::default(), &ListOnly(Vec::new())).unwrap();
        assert!(!status.update_available);
        assert!(status.latest_tag.is_none());
    }
}
