//! API request and response data models.
//!
//! Field names on the wire follow the browser client (`sessionId`, `fileHint`); the Rust side
//! uses snake case and serde renames.

pub mod backups;
