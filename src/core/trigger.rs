//! CI trigger: the event plus the git ref it fired for.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::git;

pub const TAG_REF_PREFIX: &str = "refs/tags/";
pub const BRANCH_REF_PREFIX: &str = "refs/heads/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerEvent {
    Push,
    PullRequest,
    Manual,
}

impl TriggerEvent {
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "push" => Ok(TriggerEvent::Push),
            "pull_request" | "pull_request_target" => Ok(TriggerEvent::PullRequest),
            "manual" | "workflow_dispatch" => Ok(TriggerEvent::Manual),
            other => Err(Error::validation_invalid_argument(
                "event",
                format!("Unsupported trigger event '{}'", other),
                Some(other.to_string()),
                Some(vec![
                    "push".to_string(),
                    "pull_request".to_string(),
                    "manual".to_string(),
                ]),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    pub event: TriggerEvent,
    #[serde(rename = "ref")]
    pub git_ref: String,
}

impl Trigger {
    pub fn new(event: TriggerEvent, git_ref: impl Into<String>) -> Self {
        Self {
            event,
            git_ref: git_ref.into(),
        }
    }

    /// Resolve from explicit values, then `GITHUB_EVENT_NAME`/`GITHUB_REF`,
    /// then the local checkout (manual event on the current branch).
    pub fn resolve(root: &Path, event: Option<&str>, git_ref: Option<&str>) -> Result<Self> {
        let env_event = std::env::var("GITHUB_EVENT_NAME").ok();
        let env_ref = std::env::var("GITHUB_REF").ok();

        let event = match event.or(env_event.as_deref()) {
            Some(value) => TriggerEvent::parse(value)?,
            None => TriggerEvent::Manual,
        };

        let git_ref = match git_ref.or(env_ref.as_deref()) {
            Some(value) => value.to_string(),
            None => format!("{}{}", BRANCH_REF_PREFIX, git::current_branch(root)?),
        };

        Ok(Self { event, git_ref })
    }

    pub fn tag(&self) -> Option<&str> {
        self.git_ref.strip_prefix(TAG_REF_PREFIX)
    }

    pub fn branch(&self) -> Option<&str> {
        self.git_ref.strip_prefix(BRANCH_REF_PREFIX)
    }

    /// Pushes and manual runs can mutate; pull requests only run the gates.
    pub fn can_release(&self) -> bool {
        !matches!(self.event, TriggerEvent::PullRequest)
    }

    pub fn is_tag_push(&self) -> bool {
        self.can_release() && self.tag().is_some()
    }

    pub fn is_branch_push_with_prefix(&self, prefix: &str) -> bool {
        self.can_release() && self.branch().is_some_and(|b| b.starts_with(prefix))
    }
}

/// Tag name from a `refs/tags/...` ref; anything else is rejected.
pub fn tag_from_ref(git_ref: &str) -> Result<String> {
    match git_ref.strip_prefix(TAG_REF_PREFIX) {
        Some(tag) if !tag.is_empty() => Ok(tag.to_string()),
        _ => Err(Error::validation_invalid_argument(
            "ref",
            format!("'{}' is not a tag ref", git_ref),
            Some(git_ref.to_string()),
            None,
        )
        .with_hint("Publishing runs for refs of the form refs/tags/<tag>")),
    }
}
