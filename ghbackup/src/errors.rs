use crate::api::models::backups::ErrorResponse;
use crate::contents::StoreError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// The request body could not be read as a backup request
    #[error("{message}")]
    InvalidBody { message: String },

    /// The content store refused the write
    #[error("Failed to save to GitHub")]
    Upstream { status: u16, body: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        // All failures map to 500, malformed request bodies included.
        StatusCode::INTERNAL_SERVER_ERROR
    }

    /// Body returned to the client.
    pub fn to_response_body(&self) -> ErrorResponse {
        match self {
            Error::Upstream { body, .. } => ErrorResponse {
                error: self.to_string(),
                details: Some(body.clone()),
            },
            Error::Other(e) => ErrorResponse {
                error: format!("{e:#}"),
                details: None,
            },
            Error::InvalidBody { .. } | Error::Internal { .. } => ErrorResponse {
                error: self.to_string(),
                details: None,
            },
        }
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Upstream { status, body } => Error::Upstream {
                status: status.as_u16(),
                body,
            },
            StoreError::Transport(e) => Error::Other(anyhow::Error::new(e).context("request to GitHub failed")),
            StoreError::Encode(e) => Error::Other(anyhow::Error::new(e).context("failed to encode payload")),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self {
            Error::Upstream { status, body } => {
                tracing::error!(upstream_status = status, "GitHub API error: {}", body);
            }
            Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::InvalidBody { .. } => {
                tracing::warn!("Rejected backup request: {}", self);
            }
        }

        (self.status_code(), Json(self.to_response_body())).into_response()
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(error: Error) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_upstream_error_passes_body_through() {
        let (status, json) = body_json(Error::Upstream {
            status: 409,
            body: r#"{"message":"is at 3a0f but expected 9b1c"}"#.to_string(),
        })
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "Failed to save to GitHub");
        assert_eq!(json["details"], r#"{"message":"is at 3a0f but expected 9b1c"}"#);
    }

    #[tokio::test]
    async fn test_invalid_body_has_no_details() {
        let (status, json) = body_json(Error::InvalidBody {
            message: "missing field `sessionId`".to_string(),
        })
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "missing field `sessionId`");
        assert!(json.get("details").is_none());
    }

    #[tokio::test]
    async fn test_other_error_includes_context_chain() {
        let err = anyhow::anyhow!("connection reset").context("request to GitHub failed");
        let (_, json) = body_json(Error::Other(err)).await;

        assert_eq!(json["error"], "request to GitHub failed: connection reset");
    }
}
