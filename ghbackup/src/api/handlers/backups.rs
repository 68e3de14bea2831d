//! HTTP handlers for backup submission.

use axum::{Json, body::Bytes, extract::State, http::StatusCode};
use chrono::Utc;
use tracing::{info, instrument};

use crate::{
    AppState,
    api::models::backups::{BackupRequest, BackupResponse},
    contents::{PutFile, commit_message, encode_content},
    errors::{Error, Result},
    paths,
};

/// Store a JSON payload as a file in the configured repository.
///
/// Looks up the current SHA of the target path first so that an existing file is updated
/// rather than rejected; a missing file (or a failed lookup) results in a create.
#[utoipa::path(
    post,
    path = "/api/backup",
    tag = "backups",
    summary = "Store a backup",
    request_body = BackupRequest,
    responses(
        (status = 200, description = "Backup stored", body = BackupResponse),
        (status = 405, description = "Method other than POST or OPTIONS"),
        (status = 500, description = "Malformed request or GitHub rejected the write", body = crate::api::models::backups::ErrorResponse),
    )
)]
#[instrument(skip_all, fields(path))]
pub async fn create_backup(State(state): State<AppState>, body: Bytes) -> Result<Json<BackupResponse>> {
    let request: BackupRequest = serde_json::from_slice(&body).map_err(|e| Error::InvalidBody { message: e.to_string() })?;
    let data = request.data.ok_or_else(|| Error::InvalidBody {
        message: "missing field `data`".to_string(),
    })?;

    let path = paths::target_path(request.file_hint.as_deref(), &state.config.backups.default_dir, Utc::now());
    tracing::Span::current().record("path", path.as_str());

    let content = encode_content(&data)?;
    let sha = state.store.current_sha(&path).await;

    state
        .store
        .put_file(
            &path,
            PutFile {
                message: commit_message(&request.action, &request.session_id),
                content,
                sha,
                branch: None,
            },
        )
        .await?;

    info!(session_id = %request.session_id, "Successfully saved to GitHub: {}", path);
    Ok(Json(BackupResponse { success: true, path }))
}

/// CORS pre-flight. Always succeeds with an empty body; the CORS layer adds the headers.
#[utoipa::path(
    options,
    path = "/api/backup",
    tag = "backups",
    summary = "CORS pre-flight",
    responses((status = 200, description = "Empty response with CORS headers"))
)]
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}
