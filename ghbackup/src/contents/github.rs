//! GitHub Contents API client.

use anyhow::{Context, bail};
use async_trait::async_trait;
use reqwest::{
    Client,
    header::{ACCEPT, HeaderMap, HeaderValue},
};
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use super::{ContentStore, PutFile, StoreError};
use crate::config::GitHubConfig;

const GITHUB_JSON: &str = "application/vnd.github+json";
const API_VERSION: &str = "2022-11-28";

/// The part of a contents response we care about.
#[derive(Debug, Deserialize)]
struct FileMetadata {
    sha: String,
}

/// [`ContentStore`] backed by `GET`/`PUT /repos/{owner}/{repo}/contents/{path}`.
pub struct GitHubContents {
    client: Client,
    api_url: Url,
    owner: String,
    repo: String,
    branch: Option<String>,
    token: Option<String>,
}

impl GitHubContents {
    pub fn new(config: &GitHubConfig) -> anyhow::Result<Self> {
        if config.api_url.cannot_be_a_base() {
            bail!("GitHub API URL {} cannot be used as a base URL", config.api_url);
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_JSON));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));

        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            owner: config.owner.clone(),
            repo: config.repo.clone(),
            branch: config.branch.clone(),
            token: config.token.clone(),
        })
    }

    /// `{api_url}/repos/{owner}/{repo}/contents/{path}`, one URL segment per path component.
    fn contents_url(&self, path: &str) -> Url {
        let mut url = self.api_url.clone();
        // `new` rejects cannot-be-a-base URLs, so this always succeeds.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["repos", self.owner.as_str(), self.repo.as_str(), "contents"])
                .extend(path.split('/').filter(|s| !s.is_empty()));
        }
        url
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn fetch_sha(&self, path: &str) -> anyhow::Result<Option<String>> {
        let mut url = self.contents_url(path);
        if let Some(branch) = &self.branch {
            url.query_pairs_mut().append_pair("ref", branch);
        }

        let response = self.authorize(self.client.get(url)).send().await?;
        if !response.status().is_success() {
            debug!("No existing file at {} (status {})", path, response.status());
            return Ok(None);
        }

        let metadata: FileMetadata = response.json().await.context("unexpected contents response")?;
        Ok(Some(metadata.sha))
    }
}

#[async_trait]
impl ContentStore for GitHubContents {
    #[instrument(skip(self))]
    async fn current_sha(&self, path: &str) -> Option<String> {
        match self.fetch_sha(path).await {
            Ok(sha) => sha,
            Err(e) => {
                debug!("Treating {} as a new file, lookup failed: {:#}", path, e);
                None
            }
        }
    }

    #[instrument(skip(self, file), fields(update = file.sha.is_some()))]
    async fn put_file(&self, path: &str, mut file: PutFile) -> Result<(), StoreError> {
        if file.branch.is_none() {
            file.branch = self.branch.clone();
        }

        let request = self.client.put(self.contents_url(path)).json(&file);
        let response = self.authorize(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(StoreError::Upstream { status, body });
        }

        debug!("GitHub accepted write to {} with status {}", path, status);
        Ok(())
    }
}
