//! GitHub REST client for releases.

use std::path::Path;
use std::time::Duration;

use reqwest::blocking::{Client, Request, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::config::PublishConfig;
use crate::error::{Error, ErrorCode, Result};

use super::{HostedAsset, HostedRelease, NewRelease, ReleaseHost};

const USER_AGENT: &str = concat!("foundry-release/", env!("CARGO_PKG_VERSION"));
const API_VERSION: &str = "2022-11-28";
/// Applies to every API call except asset uploads.
const API_TIMEOUT: Duration = Duration::from_secs(30);

fn http_error(e: reqwest::Error) -> Error {
    Error::new(
        ErrorCode::PublishHttpFailed,
        format!("HTTP request failed: {}", e),
        json!({ "error": e.to_string() }),
    )
    .retryable(true)
}

fn api_error(status: u16, body: &str) -> Error {
    Error::new(
        ErrorCode::PublishHttpFailed,
        format!("API error: HTTP {}", status),
        json!({ "status": status, "body": body }),
    )
    .retryable(status >= 500)
}

fn parse_error(msg: impl Into<String>) -> Error {
    Error::new(ErrorCode::InternalJsonError, msg, Value::Null)
}

pub struct GitHubClient {
    client: Client,
    api_url: String,
    repository: String,
    token: Option<String>,
    upload_timeout: Option<Duration>,
}

impl GitHubClient {
    pub fn new(config: &PublishConfig, token: Option<String>) -> Result<Self> {
        let valid = config
            .repository
            .split_once('/')
            .is_some_and(|(owner, repo)| !owner.is_empty() && !repo.is_empty() && !repo.contains('/'));
        if !valid {
            return Err(Error::config_invalid_value(
                "publish.repository",
                Some(config.repository.clone()),
                "Repository must be in 'owner/repo' form",
            ));
        }

        // Timeouts are per request; uploads only get one when configured.
        let client = Client::builder()
            .timeout(None)
            .build()
            .map_err(|e| Error::internal_unexpected(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            repository: config.repository.clone(),
            token,
            upload_timeout: config.upload_timeout_secs.map(Duration::from_secs),
        })
    }

    /// Client authenticated with the token from `publish.token_env`.
    pub fn from_env(config: &PublishConfig) -> Result<Self> {
        let token = std::env::var(&config.token_env)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                Error::config_missing_key(config.token_env.clone(), None)
                    .with_hint(format!("Export {} with a token allowed to create releases", config.token_env))
            })?;
        Self::new(config, Some(token))
    }

    fn releases_url(&self) -> String {
        format!("{}/repos/{}/releases", self.api_url, self.repository)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn api(&self, request: RequestBuilder) -> RequestBuilder {
        self.authorize(request).timeout(API_TIMEOUT)
    }

    fn upload_request(&self, release: &HostedRelease, name: &str, bytes: Vec<u8>) -> Result<Request> {
        let request = self
            .authorize(self.client.post(upload_endpoint(&release.upload_url)))
            .query(&[("name", name)])
            .header("Content-Type", "application/octet-stream")
            .body(bytes);
        let request = match self.upload_timeout {
            Some(timeout) => request.timeout(timeout),
            None => request,
        };
        request.build().map_err(http_error)
    }
}

fn parse_json_response<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let body = response.text().map_err(http_error)?;

    if !status.is_success() {
        return Err(api_error(status.as_u16(), &body));
    }

    serde_json::from_str(&body).map_err(|e| parse_error(format!("Invalid JSON response: {}", e)))
}

/// `upload_url` arrives as an RFC 6570 template such as `.../assets{?name,label}`.
fn upload_endpoint(upload_url: &str) -> &str {
    match upload_url.find('{') {
        Some(idx) => &upload_url[..idx],
        None => upload_url,
    }
}

impl ReleaseHost for GitHubClient {
    fn list_releases(&self) -> Result<Vec<HostedRelease>> {
        let response = self
            .api(self.client.get(self.releases_url()))
            .send()
            .map_err(http_error)?;
        parse_json_response(response)
    }

    fn find_release(&self, tag: &str) -> Result<Option<HostedRelease>> {
        let url = format!("{}/tags/{}", self.releases_url(), tag);
        let response = self.api(self.client.get(url)).send().map_err(http_error)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        parse_json_response(response).map(Some)
    }

    fn delete_release(&self, release: &HostedRelease) -> Result<()> {
        let url = format!("{}/{}", self.releases_url(), release.id);
        let response = self
            .api(self.client.delete(url))
            .send()
            .map_err(http_error)?;
        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(());
        }
        let body = response.text().unwrap_or_default();
        Err(api_error(status.as_u16(), &body))
    }

    fn create_release(&self, release: &NewRelease) -> Result<HostedRelease> {
        let response = self
            .api(self.client.post(self.releases_url()))
            .json(release)
            .send()
            .map_err(http_error)?;
        parse_json_response(response)
    }

    fn upload_asset(&self, release: &HostedRelease, name: &str, path: &Path) -> Result<HostedAsset> {
        if release.upload_url.is_empty() {
            return Err(Error::internal_unexpected(format!(
                "Release '{}' has no upload URL",
                release.tag_name
            )));
        }

        let bytes = std::fs::read(path).map_err(|e| {
            Error::internal_io(e.to_string(), Some(format!("read {}", path.display())))
        })?;

        let request = self.upload_request(release, name, bytes)?;
        let response = self.client.execute(request).map_err(http_error)?;
        parse_json_response(response)
    }
}
