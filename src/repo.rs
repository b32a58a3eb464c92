// ABOUTME: Source repository content interface and its GitHub HTTP implementation.
// ABOUTME: Fetches single files at a revision and resolves source archive URLs.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header;
use thiserror::Error;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Coordinate of a deployable source tree: repository plus revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub owner: String,
    pub repo: String,
    pub reference: String,
}

impl Source {
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        reference: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            reference: reference.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("{path} not found in {owner}/{repo}@{reference}")]
    NotFound {
        owner: String,
        repo: String,
        reference: String,
        path: String,
    },

    #[error("repository request failed with status {0}")]
    Status(StatusCode),

    #[error("repository request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Read-only view of a source repository's content service.
#[async_trait]
pub trait RepoContent: Send + Sync {
    /// Fetch one file's raw bytes at the source's revision.
    async fn fetch_file(&self, source: &Source, path: &str) -> Result<Bytes, RepoError>;

    /// Resolve the download URL for the source tree's gzipped tar archive.
    async fn archive_url(&self, source: &Source) -> Result<String, RepoError>;
}

/// GitHub content API client. Unauthenticated: deployable repositories
/// are expected to be public.
pub struct GithubContent {
    http: reqwest::Client,
    api_base: String,
}

impl GithubContent {
    pub fn new() -> Self {
        Self::with_api_base(DEFAULT_API_BASE)
    }

    pub fn with_api_base(api_base: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.into(),
        }
    }
}

impl Default for GithubContent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RepoContent for GithubContent {
    async fn fetch_file(&self, source: &Source, path: &str) -> Result<Bytes, RepoError> {
        let url = format!(
            "{}/repos/{}/{}/contents/{}?ref={}",
            self.api_base,
            source.owner,
            source.repo,
            path,
            urlencoding::encode(&source.reference)
        );

        let response = self
            .http
            .get(&url)
            .header(header::ACCEPT, "application/vnd.github.raw")
            .header(header::USER_AGENT, "stratus")
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(RepoError::NotFound {
                owner: source.owner.clone(),
                repo: source.repo.clone(),
                reference: source.reference.clone(),
                path: path.to_string(),
            }),
            status if !status.is_success() => Err(RepoError::Status(status)),
            _ => Ok(response.bytes().await?),
        }
    }

    async fn archive_url(&self, source: &Source) -> Result<String, RepoError> {
        // The tarball endpoint answers with a redirect to the actual archive;
        // the downloader follows it, so the endpoint URL itself is enough.
        Ok(format!(
            "{}/repos/{}/{}/tarball/{}",
            self.api_base,
            source.owner,
            source.repo,
            urlencoding::encode(&source.reference)
        ))
    }
}
