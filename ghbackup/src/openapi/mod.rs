//! OpenAPI documentation for the backup endpoint.

use utoipa::OpenApi;

use crate::api::{
    handlers::backups,
    models::backups::{BackupRequest, BackupResponse, ErrorResponse},
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "ghbackup",
        description = "Stores client-submitted JSON payloads as files in a GitHub repository."
    ),
    paths(backups::create_backup, backups::preflight),
    components(schemas(BackupRequest, BackupResponse, ErrorResponse)),
    tags((name = "backups", description = "Backup submission"))
)]
pub struct ApiDoc;
