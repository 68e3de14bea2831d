//! HTTP request handlers.
//!
//! - [`backups`]: backup submission and its CORS pre-flight
//! - [`openapi`]: serves the generated OpenAPI document

pub mod backups;
pub mod openapi;
