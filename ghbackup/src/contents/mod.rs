//! Storage seam for backups.
//!
//! A backup is written with at most two calls against a repository file API: a read to learn
//! the current version identifier (SHA) of the target path, then a create-or-update write that
//! carries the SHA when one was found. [`ContentStore`] abstracts those two calls;
//! [`github::GitHubContents`] is the implementation used in production.

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::StatusCode;
use serde::Serialize;

pub mod github;

pub use github::GitHubContents;

/// A create-or-update request for a single file.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PutFile {
    /// Commit message
    pub message: String,
    /// Base64 encoded file content
    pub content: String,
    /// SHA of the file being replaced. Omitted for creates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
    /// Branch to commit to. Omitted to use the repository default branch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The API answered the write with a non-success status
    #[error("GitHub API error {status}: {body}")]
    Upstream { status: StatusCode, body: String },

    /// The request could not be sent or its response could not be read
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    Encode(#[from] serde_json::Error),
}

/// Read/write access to files in a repository.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Current version identifier of the file at `path`.
    ///
    /// Returns `None` both when the file does not exist and when the lookup fails for any
    /// other reason; callers treat either as "create a new file".
    async fn current_sha(&self, path: &str) -> Option<String>;

    /// Create or update the file at `path`.
    async fn put_file(&self, path: &str, file: PutFile) -> Result<(), StoreError>;
}

/// Pretty-print `payload` with two-space indentation and base64 encode it.
pub fn encode_content(payload: &serde_json::Value) -> Result<String, StoreError> {
    let pretty = serde_json::to_string_pretty(payload)?;
    Ok(STANDARD.encode(pretty))
}

/// Commit message for a backup write.
pub fn commit_message(action: &str, session_id: &str) -> String {
    format!("Add data: {action} for session {session_id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_content_is_pretty_printed() {
        let encoded = encode_content(&json!({"a": 1, "b": [true]})).unwrap();
        let decoded = String::from_utf8(STANDARD.decode(encoded).unwrap()).unwrap();

        assert_eq!(decoded, "{\n  \"a\": 1,\n  \"b\": [\n    true\n  ]\n}");
    }

    #[test]
    fn test_encode_content_keeps_key_order() {
        let data: serde_json::Value = serde_json::from_str(r#"{"zeta": 1, "alpha": {"y": 2, "x": 3}}"#).unwrap();
        let decoded = String::from_utf8(STANDARD.decode(encode_content(&data).unwrap()).unwrap()).unwrap();

        assert_eq!(decoded, "{\n  \"zeta\": 1,\n  \"alpha\": {\n    \"y\": 2,\n    \"x\": 3\n  }\n}");
    }

    #[test]
    fn test_encode_scalar_payload() {
        assert_eq!(encode_content(&json!("hi")).unwrap(), STANDARD.encode("\"hi\""));
        assert_eq!(encode_content(&json!(null)).unwrap(), "bnVsbA==");
    }

    #[test]
    fn test_commit_message_format() {
        assert_eq!(
            commit_message("trial_complete", "abc123"),
            "Add data: trial_complete for session abc123"
        );
    }

    #[test]
    fn test_put_file_omits_absent_sha_and_branch() {
        let body = serde_json::to_value(PutFile {
            message: "m".to_string(),
            content: "Yw==".to_string(),
            sha: None,
            branch: None,
        })
        .unwrap();

        assert_eq!(body, json!({"message": "m", "content": "Yw=="}));
    }
}
