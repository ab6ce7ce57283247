#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use foundry_release::error::{Error, ErrorCode, Result};
use foundry_release::hosting::{HostedAsset, HostedRelease, NewRelease, ReleaseHost};
use tempfile::TempDir;

fn git_in(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// A working repository on branch `dev` with a bare `origin`.
pub struct TestRepo {
    work: TempDir,
    remote: TempDir,
}

impl TestRepo {
    pub fn new(version: &str) -> Self {
        let work = TempDir::new().expect("work dir");
        let remote = TempDir::new().expect("remote dir");

        git_in(remote.path(), &["init", "--bare", "-q"]);

        let repo = Self { work, remote };
        repo.git(&["init", "-q"]);
        repo.git(&["symbolic-ref", "HEAD", "refs/heads/dev"]);
        repo.git(&["config", "user.name", "Test Runner"]);
        repo.git(&["config", "user.email", "runner@example.com"]);
        repo.git(&["config", "commit.gpgsign", "false"]);
        repo.git(&["config", "tag.gpgsign", "false"]);

        repo.write("VERSION", &format!("{}\n", version));
        repo.git(&["add", "VERSION"]);
        repo.git(&["commit", "-q", "-m", "initial"]);

        let remote_path = repo.remote_path().to_string_lossy().to_string();
        repo.git(&["remote", "add", "origin", &remote_path]);
        repo.git(&["push", "-q", "-u", "origin", "dev"]);
        repo
    }

    pub fn path(&self) -> &Path {
        self.work.path()
    }

    pub fn remote_path(&self) -> &Path {
        self.remote.path()
    }

    pub fn git(&self, args: &[&str]) -> String {
        git_in(self.path(), args)
    }

    pub fn remote_git(&self, args: &[&str]) -> String {
        git_in(self.remote_path(), args)
    }

    pub fn write(&self, name: &str, content: &str) {
        let path = self.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(path, content).expect("write file");
    }

    pub fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.path().join(name)).expect("read file")
    }

    pub fn commit(&self, name: &str, content: &str, message: &str) {
        self.write(name, content);
        self.git(&["add", name]);
        self.git(&["commit", "-q", "-m", message]);
    }

    pub fn annotated_tag(&self, name: &str, message: &str) {
        self.git(&["tag", "-a", name, "-m", message]);
    }

    pub fn head(&self) -> String {
        self.git(&["rev-parse", "HEAD"])
    }

    pub fn commit_count(&self) -> usize {
        self.git(&["rev-list", "--count", "HEAD"]).parse().expect("count")
    }

    /// Put one file per matrix artifact into the artifact directory.
    pub fn stage_artifacts(&self, names: &[&str]) -> PathBuf {
        let dir = self.path().join("dist/release");
        std::fs::create_dir_all(&dir).expect("artifact dir");
        for name in names {
            std::fs::write(dir.join(name), format!("binary for {}", name)).expect("artifact");
        }
        dir
    }
}

pub const DEFAULT_ARTIFACTS: [&str; 3] = [
    "linux-smb3-foundry",
    "win64-smb3-foundry.exe",
    "osx-smb3-foundry",
];

/// In-memory release host.
#[derive(Default)]
pub struct FakeHost {
    next_id: AtomicU64,
    uploads: AtomicU64,
    /// 1-based upload call that fails with a retryable HTTP error; 0 never fails.
    pub fail_upload_at: AtomicU64,
    pub releases: Mutex<Vec<HostedRelease>>,
    pub deleted: Mutex<Vec<u64>>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn releases_for(&self, tag: &str) -> Vec<HostedRelease> {
        self.releases
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.tag_name == tag)
            .cloned()
            .collect()
    }
}

impl ReleaseHost for FakeHost {
    fn list_releases(&self) -> Result<Vec<HostedRelease>> {
        let mut releases = self.releases.lock().unwrap().clone();
        releases.reverse();
        Ok(releases)
    }

    fn find_release(&self, tag: &str) -> Result<Option<HostedRelease>> {
        Ok(self
            .releases
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.tag_name == tag)
            .cloned())
    }

    fn delete_release(&self, release: &HostedRelease) -> Result<()> {
        self.releases.lock().unwrap().retain(|r| r.id != release.id);
        self.deleted.lock().unwrap().push(release.id);
        Ok(())
    }

    fn create_release(&self, release: &NewRelease) -> Result<HostedRelease> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let hosted = HostedRelease {
            id,
            tag_name: release.tag_name.clone(),
            name: Some(release.name.clone()),
            body: Some(release.body.clone()),
            prerelease: release.prerelease,
            html_url: format!("https://example.test/releases/tag/{}", release.tag_name),
            upload_url: format!("https://uploads.example.test/releases/{}/assets{{?name,label}}", id),
            assets: Vec::new(),
            published_at: None,
        };
        self.releases.lock().unwrap().push(hosted.clone());
        Ok(hosted)
    }

    fn upload_asset(&self, release: &HostedRelease, name: &str, path: &Path) -> Result<HostedAsset> {
        let call = self.uploads.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.fail_upload_at.load(Ordering::SeqCst) {
            return Err(Error::new(
                ErrorCode::PublishHttpFailed,
                "HTTP request failed: connection reset",
                serde_json::Value::Null,
            )
            .retryable(true));
        }

        let size = std::fs::metadata(path)
            .map_err(|e| Error::internal_io(e.to_string(), None))?
            .len();
        let mut releases = self.releases.lock().unwrap();
        let target = releases
            .iter_mut()
            .find(|r| r.id == release.id)
            .ok_or_else(|| Error::internal_unexpected("upload to unknown release"))?;

        let asset = HostedAsset {
            id: target.assets.len() as u64 + 1,
            name: name.to_string(),
            size,
            browser_download_url: format!("https://example.test/download/{}/{}", release.tag_name, name),
        };
        target.assets.push(asset.clone());
        Ok(asset)
    }
}
