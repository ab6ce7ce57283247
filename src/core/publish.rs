//! Publish a tag as a hosted release with every platform artifact attached.
//!
//! Publishing is split in two: [`prepare`] does every local check (tag shape,
//! annotation, version file, external tag check, artifact presence) and
//! touches nothing remote; [`publish`] then talks to the host.

use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Serialize;

use crate::config::ReleaseConfig;
use crate::error::{Error, Result};
use crate::git;
use crate::hosting::{HostedRelease, NewRelease, ReleaseHost};
use crate::notes::{self, ReleaseNotes};
use crate::trigger;
use crate::utils::artifact;
use crate::utils::command;
use crate::utils::template::{self, TemplateVars};
use crate::version;

const OUTPUT_TAIL_LINES: usize = 15;

#[derive(Debug, Clone, Serialize)]
pub struct PlannedAsset {
    pub platform: String,
    pub name: String,
    pub path: PathBuf,
}

/// A tag that passed every local check and is ready to be released.
#[derive(Debug, Clone, Serialize)]
pub struct PreparedRelease {
    pub tag: String,
    pub prerelease: bool,
    pub notes: ReleaseNotes,
    pub assets: Vec<PlannedAsset>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublishedAsset {
    pub name: String,
    pub size: u64,
    pub sha256: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublishResult {
    pub tag: String,
    pub title: String,
    pub prerelease: bool,
    pub release_id: u64,
    pub release_url: String,
    /// An earlier nightly release was removed first.
    pub replaced: bool,
    /// An incomplete release from an earlier run was finished instead of created.
    pub resumed: bool,
    pub assets: Vec<PublishedAsset>,
}

pub fn validate_tag_pattern(config: &ReleaseConfig, tag: &str) -> Result<()> {
    let pattern = Regex::new(&config.publish.tag_pattern).map_err(|e| {
        Error::config_invalid_value(
            "publish.tag_pattern",
            Some(config.publish.tag_pattern.clone()),
            format!("Invalid regex: {}", e),
        )
    })?;

    if !pattern.is_match(tag) {
        return Err(Error::tag_invalid(
            tag,
            format!(
                "Tag '{}' does not match pattern '{}'",
                tag, config.publish.tag_pattern
            ),
        ));
    }
    Ok(())
}

fn verify_version_file(root: &Path, config: &ReleaseConfig, tag: &str) -> Result<()> {
    if !config.publish.verify_version_file || tag == config.nightly.tag {
        return Ok(());
    }

    let info = version::read_version(root, config)?;
    if info.version != tag {
        return Err(Error::tag_invalid(
            tag,
            format!(
                "Tag '{}' does not match {} ('{}')",
                tag, config.version_file, info.version
            ),
        )
        .with_hint("Tag the commit that bumped the version file"));
    }
    Ok(())
}

fn run_tag_check(root: &Path, config: &ReleaseConfig, tag: &str) -> Result<()> {
    let Some(check) = config.publish.tag_check.as_deref() else {
        return Ok(());
    };

    let cmd = template::render(check, &[(TemplateVars::TAG, tag)]);
    log_status!("publish", "Tag check: {}", cmd);

    let output = command::run_shell_in(root, &cmd, &[("EXPECTED_TAG", tag)]);
    if !output.success {
        let mut err = Error::tag_invalid(
            tag,
            format!("Tag check failed with exit code {}", output.exit_code),
        );
        if let Some(obj) = err.details.as_object_mut() {
            obj.insert("command".to_string(), cmd.clone().into());
            obj.insert("outputTail".to_string(), output.tail(OUTPUT_TAIL_LINES).into());
        }
        if let Some(hint) = command::exit_code_hint(output.exit_code) {
            err = err.with_hint(hint);
        }
        return Err(err);
    }
    Ok(())
}

/// Every matrix artifact must already be in the artifact directory.
pub fn planned_assets(root: &Path, config: &ReleaseConfig) -> Result<Vec<PlannedAsset>> {
    let dir = config.artifact_dir(root);
    let mut assets = Vec::with_capacity(config.platforms.len());

    for platform in &config.platforms {
        let name = platform.artifact_name(&config.app_name);
        let path = dir.join(&name);
        if !path.is_file() {
            return Err(Error::artifact_missing(path.to_string_lossy().to_string())
                .with_hint(format!("Run the build for '{}' first", platform.prefix)));
        }
        assets.push(PlannedAsset {
            platform: platform.prefix.clone(),
            name,
            path,
        });
    }

    Ok(assets)
}

pub fn prepare(root: &Path, config: &ReleaseConfig, git_ref: &str) -> Result<PreparedRelease> {
    let tag = trigger::tag_from_ref(git_ref)?;
    git::require_git_repo(root)?;

    if !git::tag_exists_locally(root, &tag) {
        return Err(Error::tag_invalid(&tag, format!("Tag '{}' does not exist", tag))
            .with_hint("Fetch tags first: git fetch --tags"));
    }
    if !git::is_annotated_tag(root, &tag) {
        return Err(Error::tag_invalid(
            &tag,
            format!("Tag '{}' is lightweight; releases need an annotated tag", tag),
        ));
    }

    let annotation = git::tag_annotation(root, &tag)?;
    let notes = notes::from_annotation(&annotation, config.publish.body_lines);

    validate_tag_pattern(config, &tag)?;
    verify_version_file(root, config, &tag)?;
    run_tag_check(root, config, &tag)?;

    let assets = planned_assets(root, config)?;
    let prerelease = tag == config.nightly.tag;

    Ok(PreparedRelease {
        tag,
        prerelease,
        notes,
        assets,
    })
}

pub fn publish(prepared: &PreparedRelease, host: &dyn ReleaseHost) -> Result<PublishResult> {
    let tag = prepared.tag.as_str();
    let mut replaced = false;
    let mut existing_release = None;

    if let Some(existing) = host.find_release(tag)? {
        if prepared.prerelease {
            log_status!("publish", "Removing previous '{}' release ({})", tag, existing.id);
            host.delete_release(&existing)?;
            replaced = true;
        } else if missing_assets(prepared, &existing).is_empty() {
            return Err(Error::tag_invalid(
                tag,
                format!("A release for '{}' already exists", tag),
            )
            .with_hint(format!("Existing release: {}", existing.html_url)));
        } else {
            log_status!(
                "publish",
                "Resuming '{}' release ({}): {} of {} assets present",
                tag,
                existing.id,
                existing.assets.len(),
                prepared.assets.len()
            );
            existing_release = Some(existing);
        }
    }

    let resumed = existing_release.is_some();
    let release = match existing_release {
        Some(release) => release,
        None => {
            let release = host.create_release(&NewRelease {
                tag_name: tag.to_string(),
                name: prepared.notes.title.clone(),
                body: prepared.notes.body.clone(),
                prerelease: prepared.prerelease,
                draft: false,
            })?;
            log_status!("publish", "Created release '{}' ({})", tag, release.html_url);
            release
        }
    };

    let mut assets = Vec::with_capacity(prepared.assets.len());
    for planned in &prepared.assets {
        let sha256 = artifact::sha256_file(&planned.path)?;
        if let Some(present) = release.assets.iter().find(|a| a.name == planned.name) {
            assets.push(PublishedAsset {
                name: present.name.clone(),
                size: present.size,
                sha256,
                url: present.browser_download_url.clone(),
            });
            continue;
        }

        let uploaded = host.upload_asset(&release, &planned.name, &planned.path)?;
        log_status!("publish", "Uploaded {} ({} bytes)", uploaded.name, uploaded.size);
        assets.push(PublishedAsset {
            name: uploaded.name,
            size: uploaded.size,
            sha256,
            url: uploaded.browser_download_url,
        });
    }

    Ok(PublishResult {
        tag: tag.to_string(),
        title: prepared.notes.title.clone(),
        prerelease: prepared.prerelease,
        release_id: release.id,
        release_url: release.html_url,
        replaced,
        resumed,
        assets,
    })
}

/// Matrix assets the hosted release does not have yet.
fn missing_assets<'a>(prepared: &'a PreparedRelease, release: &HostedRelease) -> Vec<&'a str> {
    prepared
        .assets
        .iter()
        .filter(|planned| !release.assets.iter().any(|a| a.name == planned.name))
        .map(|planned| planned.name.as_str())
        .collect()
}
