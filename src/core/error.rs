use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigMissingKey,
    ConfigInvalidJson,
    ConfigInvalidValue,

    ValidationMissingArgument,
    ValidationInvalidArgument,

    BumpVersionUnchanged,
    BumpAborted,

    GitCommandFailed,

    GateFailed,
    BuildFailed,
    BuildArtifactMissing,

    PublishTagInvalid,
    PublishHttpFailed,

    InternalIoError,
    InternalJsonError,
    InternalUnexpected,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigMissingKey => "config.missing_key",
            ErrorCode::ConfigInvalidJson => "config.invalid_json",
            ErrorCode::ConfigInvalidValue => "config.invalid_value",

            ErrorCode::ValidationMissingArgument => "validation.missing_argument",
            ErrorCode::ValidationInvalidArgument => "validation.invalid_argument",

            ErrorCode::BumpVersionUnchanged => "bump.version_unchanged",
            ErrorCode::BumpAborted => "bump.aborted",

            ErrorCode::GitCommandFailed => "git.command_failed",

            ErrorCode::GateFailed => "gate.failed",
            ErrorCode::BuildFailed => "build.failed",
            ErrorCode::BuildArtifactMissing => "build.artifact_missing",

            ErrorCode::PublishTagInvalid => "publish.tag_invalid",
            ErrorCode::PublishHttpFailed => "publish.http_failed",

            ErrorCode::InternalIoError => "internal.io_error",
            ErrorCode::InternalJsonError => "internal.json_error",
            ErrorCode::InternalUnexpected => "internal.unexpected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub hints: Vec<Hint>,
    pub retryable: Option<bool>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMissingKeyDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidJsonDetails {
    pub path: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidValueDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub problem: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingArgumentDetails {
    pub args: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidArgumentDetails {
    pub field: String,
    pub problem: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tried: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandFailedDetails {
    pub command: String,
    pub exit_code: i32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub output_tail: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalIoErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalJsonErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

fn to_details<T: Serialize>(details: T) -> Value {
    serde_json::to_value(details).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            hints: Vec::new(),
            retryable: None,
        }
    }

    pub fn validation_missing_argument(args: Vec<String>) -> Self {
        Self::new(
            ErrorCode::ValidationMissingArgument,
            "Missing required argument",
            to_details(MissingArgumentDetails { args }),
        )
    }

    pub fn validation_invalid_argument(
        field: impl Into<String>,
        problem: impl Into<String>,
        id: Option<String>,
        tried: Option<Vec<String>>,
    ) -> Self {
        let problem = problem.into();
        let details = to_details(InvalidArgumentDetails {
            field: field.into(),
            problem: problem.clone(),
            id,
            tried,
        });

        Self::new(ErrorCode::ValidationInvalidArgument, problem, details)
    }

    pub fn config_missing_key(key: impl Into<String>, path: Option<String>) -> Self {
        let key = key.into();
        Self::new(
            ErrorCode::ConfigMissingKey,
            format!("Missing required configuration key '{}'", key),
            to_details(ConfigMissingKeyDetails { key, path }),
        )
    }

    pub fn config_invalid_json(path: impl Into<String>, err: serde_json::Error) -> Self {
        Self::new(
            ErrorCode::ConfigInvalidJson,
            "Invalid JSON in configuration",
            to_details(ConfigInvalidJsonDetails {
                path: path.into(),
                error: err.to_string(),
            }),
        )
    }

    pub fn config_invalid_value(
        key: impl Into<String>,
        value: Option<String>,
        problem: impl Into<String>,
    ) -> Self {
        let problem = problem.into();
        let details = to_details(ConfigInvalidValueDetails {
            key: key.into(),
            value,
            problem: problem.clone(),
        });

        Self::new(ErrorCode::ConfigInvalidValue, problem, details)
    }

    pub fn version_unchanged(version: impl Into<String>) -> Self {
        let version = version.into();
        Self::new(
            ErrorCode::BumpVersionUnchanged,
            format!("Versions are the same: '{}'", version),
            serde_json::json!({ "version": version }),
        )
        .with_hint("Choose a version that differs from the current one")
    }

    pub fn bump_aborted(step: impl Into<String>) -> Self {
        let step = step.into();
        Self::new(
            ErrorCode::BumpAborted,
            format!("Aborted before '{}'", step),
            serde_json::json!({ "step": step }),
        )
    }

    pub fn git_command_failed(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::GitCommandFailed,
            message,
            Value::Object(serde_json::Map::new()),
        )
    }

    pub fn gate_failed(gate: &str, details: CommandFailedDetails) -> Self {
        Self::new(
            ErrorCode::GateFailed,
            format!("Gate '{}' failed with exit code {}", gate, details.exit_code),
            to_details(details),
        )
    }

    pub fn build_failed(platform: &str, details: CommandFailedDetails) -> Self {
        Self::new(
            ErrorCode::BuildFailed,
            format!(
                "Build for '{}' failed with exit code {}",
                platform, details.exit_code
            ),
            to_details(details),
        )
    }

    pub fn artifact_missing(path: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(
            ErrorCode::BuildArtifactMissing,
            format!("Artifact not found: {}", path),
            serde_json::json!({ "path": path }),
        )
    }

    pub fn tag_invalid(tag: impl Into<String>, problem: impl Into<String>) -> Self {
        let problem = problem.into();
        Self::new(
            ErrorCode::PublishTagInvalid,
            problem.clone(),
            serde_json::json!({ "tag": tag.into(), "problem": problem }),
        )
    }

    pub fn internal_io(error: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalIoError,
            "IO error",
            to_details(InternalIoErrorDetails {
                error: error.into(),
                context,
            }),
        )
    }

    pub fn internal_json(error: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalJsonError,
            "JSON error",
            to_details(InternalJsonErrorDetails {
                error: error.into(),
                context,
            }),
        )
    }

    pub fn internal_unexpected(error: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InternalUnexpected,
            "Unexpected error",
            serde_json::json!({ "error": error.into() }),
        )
    }

    pub fn with_hint(mut self, message: impl Into<String>) -> Self {
        self.hints.push(Hint {
            message: message.into(),
        });
        self
    }

    pub fn retryable(mut self, retryable: bool) -> Self {
        self.retryable = Some(retryable);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_dotted() {
        assert_eq!(ErrorCode::BumpVersionUnchanged.as_str(), "bump.version_unchanged");
        assert_eq!(ErrorCode::GitCommandFailed.as_str(), "git.command_failed");
        assert_eq!(ErrorCode::PublishTagInvalid.as_str(), "publish.tag_invalid");
    }

    #[test]
    fn version_unchanged_carries_version_and_hint() {
        let err = Error::version_unchanged("1.2.3");
        assert_eq!(err.code, ErrorCode::BumpVersionUnchanged);
        assert_eq!(err.details["version"], "1.2.3");
        assert_eq!(err.hints.len(), 1);
    }

    #[test]
    fn invalid_argument_message_is_the_problem() {
        let err = Error::validation_invalid_argument("ref", "Not a tag ref", None, None);
        assert_eq!(err.message, "Not a tag ref");
        assert_eq!(err.details["field"], "ref");
    }

    #[test]
    fn retryable_sets_flag() {
        let err = Error::internal_unexpected("boom").retryable(true);
        assert_eq!(err.retryable, Some(true));
    }
}
