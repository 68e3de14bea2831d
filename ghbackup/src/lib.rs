//! # ghbackup: JSON backups into a GitHub repository
//!
//! `ghbackup` is a small HTTP relay for browser-based clients (typically online studies or
//! experiments) that need to persist JSON results without holding repository credentials
//! themselves. A client posts `{ action, data, sessionId, fileHint? }` to `/api/backup`; the
//! relay pretty-prints `data`, base64-encodes it and commits it to a configured repository
//! through the GitHub Contents API.
//!
//! ## Request Flow
//!
//! 1. CORS pre-flights are answered with an empty `200` and permissive headers.
//! 2. The target path is the client's `fileHint` (sanitized by [`paths::sanitize`]) or a
//!    timestamped name under the configured backup directory.
//! 3. The current SHA of that path is looked up. A missing file or a failed lookup both mean
//!    "create".
//! 4. The file is written with a `PUT`, carrying the SHA when one was found.
//!
//! There are no retries and no coordination between concurrent writers to the same path: the
//! last write wins, and a write racing on a stale SHA is reported back as a server error with
//! GitHub's response attached.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use ghbackup::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = ghbackup::config::Args::parse();
//!     let config = Config::load(&args)?;
//!     config.validate()?;
//!
//!     ghbackup::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     Application::new(config)?
//!         .serve(async {
//!             tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!         })
//!         .await
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod config;
pub mod contents;
pub mod errors;
mod openapi;
pub mod paths;
pub mod telemetry;

#[cfg(test)]
mod test_utils;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    routing::get,
};
use axum_prometheus::PrometheusMetricLayer;
use bon::Builder;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};

pub use config::Config;
use config::CorsOrigin;
use contents::{ContentStore, GitHubContents};

/// Application state shared across all request handlers.
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .config(config)
///     .store(Arc::new(GitHubContents::new(&config.github)?))
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn ContentStore>,
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let origins = &config.cors.allowed_origins;

    let allow_origin = if origins.contains(&CorsOrigin::Wildcard) {
        AllowOrigin::any()
    } else {
        let mut list = Vec::with_capacity(origins.len());
        for origin in origins {
            if let CorsOrigin::Url(url) = origin {
                list.push(url.origin().ascii_serialization().parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(list)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    if let Some(max_age) = config.cors.max_age {
        cors = cors.max_age(Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router.
///
/// - `POST`/`OPTIONS /api/backup`: backup submission and pre-flight
/// - `GET /healthz`: liveness
/// - `GET /api-docs/openapi.json`: OpenAPI document
/// - `GET /internal/metrics`: Prometheus metrics, when `enable_metrics` is set
///
/// All routes are wrapped in the CORS and tracing layers.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    let backup_routes = Router::new()
        .route(
            "/api/backup",
            axum::routing::post(api::handlers::backups::create_backup).options(api::handlers::backups::preflight),
        )
        .layer(DefaultBodyLimit::max(state.config.backups.max_body_size))
        .with_state(state.clone());

    let mut router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/api-docs/openapi.json", get(api::handlers::openapi::openapi_json))
        .merge(backup_routes);

    if state.config.enable_metrics {
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
        router = router
            .route("/internal/metrics", get(move || async move { metric_handle.render() }))
            .layer(prometheus_layer);
    }

    let router = router.layer(
        ServiceBuilder::new()
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                    .on_request(DefaultOnRequest::new().level(Level::INFO))
                    .on_response(DefaultOnResponse::new().level(Level::INFO)),
            )
            .layer(create_cors_layer(&state.config)?),
    );

    Ok(router)
}

pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Create a new application instance backed by the GitHub Contents API
    pub fn new(config: Config) -> anyhow::Result<Self> {
        debug!(
            api_url = %config.github.api_url,
            branch = ?config.github.branch,
            default_dir = %config.backups.default_dir,
            "Starting backup relay"
        );

        let store = GitHubContents::new(&config.github)?;
        let state = AppState::builder().config(config.clone()).store(Arc::new(store)).build();
        let router = build_router(&state)?;

        Ok(Self { router, config })
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Backup relay listening on http://{}, writing to {}/{}",
            bind_addr, self.config.github.owner, self.config.github.repo
        );

        axum::serve(listener, self.router).with_graceful_shutdown(shutdown).await?;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_app, create_test_config, install_crypto_provider};
    use axum_test::TestServer;
    use url::Url;

    #[tokio::test]
    async fn test_healthz() {
        let server = create_test_app("http://127.0.0.1:1");

        let response = server.get("/healthz").await;

        response.assert_status_ok();
        response.assert_text("OK");
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let server = create_test_app("http://127.0.0.1:1");

        server.get("/api/nope").await.assert_status_not_found();
    }

    #[tokio::test]
    async fn test_cors_header_on_regular_response() {
        let server = create_test_app("http://127.0.0.1:1");

        let response = server.get("/healthz").add_header("origin", "https://anywhere.example").await;

        assert_eq!(response.headers().get("access-control-allow-origin").unwrap(), "*");
    }

    #[tokio::test]
    async fn test_cors_explicit_origin_list() {
        install_crypto_provider();
        let mut config = create_test_config("http://127.0.0.1:1");
        config.cors.allowed_origins = vec![CorsOrigin::Url(Url::parse("https://study.example.com").unwrap())];
        let store = GitHubContents::new(&config.github).unwrap();
        let state = AppState::builder().config(config).store(Arc::new(store)).build();
        let server = TestServer::new(build_router(&state).unwrap()).unwrap();

        let allowed = server.get("/healthz").add_header("origin", "https://study.example.com").await;
        assert_eq!(
            allowed.headers().get("access-control-allow-origin").unwrap(),
            "https://study.example.com"
        );

        let denied = server.get("/healthz").add_header("origin", "https://evil.example").await;
        assert!(denied.headers().get("access-control-allow-origin").is_none());
    }

    #[test]
    fn test_application_new_rejects_unusable_api_url() {
        install_crypto_provider();
        let mut config = create_test_config("http://127.0.0.1:1");
        config.github.api_url = Url::parse("mailto:octocat@example.com").unwrap();

        assert!(Application::new(config).is_err());
    }
}
