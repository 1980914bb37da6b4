//! Fetching file contents behind a permalink.

use std::future::Future;

use folio_core::config::GithubConfig;
use reqwest::header::{ACCEPT, HeaderValue};
use serde::Deserialize;

use crate::error::{EmbedError, Result};

/// File contents and metadata returned for a permalink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedBlob {
    /// Page title, e.g. `yu7400ki.me/app/lib/github.ts at main · yu7400ki/yu7400ki.me`.
    pub title: String,

    /// Every raw line of the file.
    pub lines: Vec<String>,

    /// Human-readable language label, e.g. `TypeScript`.
    pub language: String,
}

/// Source of permalink contents.
pub trait BlobSource: Send + Sync {
    /// Fetch the blob referenced by a permalink URL.
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchedBlob>> + Send;
}

#[derive(Debug, Deserialize)]
struct PermalinkResponse {
    title: String,
    payload: Payload,
}

#[derive(Debug, Deserialize)]
struct Payload {
    blob: Blob,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Blob {
    raw_lines: Vec<String>,
    language: String,
}

/// Validate and decode a permalink response body.
pub fn parse_response(url: &str, body: &str) -> Result<FetchedBlob> {
    let response: PermalinkResponse = serde_json::from_str(body)
        .map_err(|e| EmbedError::invalid_response(url, e.to_string()))?;

    Ok(FetchedBlob {
        title: response.title,
        lines: response.payload.blob.raw_lines,
        language: response.payload.blob.language,
    })
}

/// HTTP client for github.com permalinks.
///
/// Requests ask for the JSON representation of the blob page. There is no
/// retry and no explicit timeout.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
}

impl GitHubClient {
    /// Create a client sending the given user agent.
    pub fn new(user_agent: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(EmbedError::Client)?;
        Ok(Self { http })
    }

    /// Create a client from the `[github]` configuration section.
    pub fn from_config(config: &GithubConfig) -> Result<Self> {
        Self::new(&config.user_agent)
    }
}

impl BlobSource for GitHubClient {
    async fn fetch(&self, url: &str) -> Result<FetchedBlob> {
        tracing::debug!(url, "fetching permalink");

        let response = self
            .http
            .get(url)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .send()
            .await
            .map_err(|e| EmbedError::fetch(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EmbedError::fetch(url, format!("HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| EmbedError::fetch(url, e.to_string()))?;

        let blob = parse_response(url, &body)?;
        tracing::debug!(url, lines = blob.lines.len(), language = %blob.language, "fetched permalink");
        Ok(blob)
    }
}
