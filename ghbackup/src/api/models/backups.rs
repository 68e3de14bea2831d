//! API request and response models for backup submission.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// A backup submitted by a client.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BackupRequest {
    /// Label describing what triggered the backup, used in the commit message
    pub action: String,
    /// Arbitrary JSON payload stored as the file content. `None` only when the key is absent;
    /// an explicit `null` is `Some(Value::Null)`.
    #[schema(value_type = Object)]
    #[serde(default, deserialize_with = "present")]
    pub data: Option<Value>,
    /// Client session identifier, used in the commit message
    pub session_id: String,
    /// Suggested destination path inside the repository
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_hint: Option<String>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Successful backup.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BackupResponse {
    /// Always `true`
    pub success: bool,
    /// Path the payload was written to
    pub path: String,
}

/// Error body for any failed backup.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    /// Upstream response body, present when GitHub rejected the write
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_uses_camel_case_fields() {
        let req: BackupRequest = serde_json::from_value(json!({
            "action": "trial_complete",
            "data": {"score": 3},
            "sessionId": "s-42",
            "fileHint": "data/sessions/s-42.json"
        }))
        .unwrap();

        assert_eq!(req.action, "trial_complete");
        assert_eq!(req.session_id, "s-42");
        assert_eq!(req.file_hint.as_deref(), Some("data/sessions/s-42.json"));
        assert_eq!(req.data, Some(json!({"score": 3})));
    }

    #[test]
    fn test_request_hint_is_optional() {
        let req: BackupRequest = serde_json::from_value(json!({
            "action": "a",
            "data": [],
            "sessionId": "s"
        }))
        .unwrap();

        assert!(req.file_hint.is_none());
    }

    #[test]
    fn test_request_null_data_differs_from_absent() {
        let explicit: BackupRequest =
            serde_json::from_value(json!({"action": "a", "data": null, "sessionId": "s"})).unwrap();
        let absent: BackupRequest = serde_json::from_value(json!({"action": "a", "sessionId": "s"})).unwrap();

        assert_eq!(explicit.data, Some(Value::Null));
        assert_eq!(absent.data, None);
    }

    #[test]
    fn test_request_requires_session_id() {
        let err = serde_json::from_value::<BackupRequest>(json!({"action": "a", "data": {}})).unwrap_err();
        assert!(err.to_string().contains("sessionId"));
    }
}
