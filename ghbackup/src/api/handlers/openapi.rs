//! Serves the generated OpenAPI document.

use axum::Json;
use utoipa::OpenApi;

use crate::openapi::ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, routing::get};
    use axum_test::TestServer;
    use serde_json::Value;

    #[tokio::test]
    async fn test_openapi_document_lists_backup_endpoint() {
        let app = Router::new().route("/api-docs/openapi.json", get(openapi_json));
        let server = TestServer::new(app).unwrap();

        let response = server.get("/api-docs/openapi.json").await;

        response.assert_status_ok();
        let doc: Value = response.json();
        assert!(doc["paths"]["/api/backup"]["post"].is_object());
        assert!(doc["paths"]["/api/backup"]["options"].is_object());
        assert!(doc["components"]["schemas"]["BackupRequest"].is_object());
    }
}
