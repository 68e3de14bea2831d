//! Shared helpers for unit tests.

use std::sync::Arc;

use axum_test::TestServer;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::config::{Config, GitHubConfig};
use crate::contents::GitHubContents;
use crate::{AppState, build_router};

/// reqwest is built without a bundled crypto provider; install the same one `main` does.
pub fn install_crypto_provider() {
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
}

pub fn github_config(api_url: &str) -> GitHubConfig {
    GitHubConfig {
        api_url: api_url.parse().expect("mock server URI is a valid URL"),
        owner: "octocat".to_string(),
        repo: "study-data".to_string(),
        token: Some("test-token".to_string()),
        ..Default::default()
    }
}

pub fn create_test_config(api_url: &str) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        github: github_config(api_url),
        ..Default::default()
    }
}

/// Router wired to a GitHub API at `api_url` (usually a wiremock server).
pub fn create_test_app(api_url: &str) -> TestServer {
    install_crypto_provider();
    let config = create_test_config(api_url);
    let store = GitHubContents::new(&config.github).expect("Failed to create content store");

    let state = AppState::builder().config(config).store(Arc::new(store)).build();
    let router = build_router(&state).expect("Failed to build router");
    TestServer::new(router).expect("Failed to create test server")
}

/// Every contents lookup answers 404.
pub async fn mount_missing_file(server: &MockServer) {
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "Not Found",
            "documentation_url": "https://docs.github.com/rest/repos/contents#get-repository-content"
        })))
        .mount(server)
        .await;
}

/// A lookup of `file_path` in the test repository answers with `sha`.
pub async fn mount_existing_file(server: &MockServer, file_path: &str, sha: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/octocat/study-data/contents/{file_path}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "file",
            "path": file_path,
            "sha": sha,
            "encoding": "base64",
            "content": ""
        })))
        .mount(server)
        .await;
}
