//! Target path derivation for stored backups.
//!
//! Clients may suggest where their backup should land via `fileHint`. The hint is cleaned with a
//! best-effort filter: every `..` sequence is removed and runs of `/` collapse into one. This
//! keeps casual traversal attempts out of the path but is not a hard guarantee, the repository
//! itself is the only boundary.

use chrono::{DateTime, Utc};

/// Pick the destination path for a backup: the client hint when present, otherwise a
/// timestamped name under `default_dir`. The result is always sanitized.
pub fn target_path(hint: Option<&str>, default_dir: &str, now: DateTime<Utc>) -> String {
    match hint.filter(|h| !h.is_empty()) {
        Some(hint) => sanitize(hint),
        None => sanitize(&format!(
            "{}/backup_{}.json",
            default_dir.trim_end_matches('/'),
            now.timestamp_millis()
        )),
    }
}

/// Strip `..` and collapse repeated separators.
pub fn sanitize(path: &str) -> String {
    let stripped = path.replace("..", "");

    let mut out = String::with_capacity(stripped.len());
    for c in stripped.chars() {
        if c == '/' && out.ends_with('/') {
            continue;
        }
        out.push(c);
    }
    out
}
