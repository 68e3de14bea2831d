//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Request/response data structures
//!
//! The service exposes one functional endpoint, `POST /api/backup`, plus its CORS pre-flight
//! (`OPTIONS /api/backup`). It is documented with `utoipa` and the generated document is served
//! at `/api-docs/openapi.json`.

pub mod handlers;
pub mod models;
