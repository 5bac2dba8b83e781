//! Google Books cover search client

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

const GOOGLE_BOOKS_VOLUMES_URL: &str = "https://www.googleapis.com/books/v1/volumes";
const USER_AGENT: &str = concat!("BookTrack/", env!("CARGO_PKG_VERSION"));

/// Cover adapter errors
#[derive(Debug, Error)]
pub enum CoverError {
    #[error("Google Books API key not configured")]
    NotConfigured,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Title/author → cover image URL adapter
#[async_trait]
pub trait CoverProvider: Send + Sync {
    async fn find_cover(&self, title: &str, author: &str) -> Result<Option<String>, CoverError>;
}

#[derive(Debug, Deserialize)]
struct VolumesResponse {
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Debug, Deserialize)]
struct Volume {
    #[serde(rename = "volumeInfo")]
    volume_info: Option<VolumeInfo>,
}

#[derive(Debug, Deserialize)]
struct VolumeInfo {
    #[serde(rename = "imageLinks")]
    image_links: Option<ImageLinks>,
}

#[derive(Debug, Deserialize)]
struct ImageLinks {
    thumbnail: Option<String>,
}

/// Google Books API client
pub struct GoogleBooksClient {
    http_client: reqwest::Client,
    api_key: Option<String>,
}

impl GoogleBooksClient {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self, CoverError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| CoverError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key,
        })
    }
}

/// Search query: title, then author when known
pub fn search_query(title: &str, author: &str) -> String {
    let author = author.trim();
    if author.is_empty() {
        title.trim().to_string()
    } else {
        format!("{} {}", title.trim(), author)
    }
}

/// Thumbnail of the first volume, upgraded to https
fn first_thumbnail(response: VolumesResponse) -> Option<String> {
    response
        .items
        .into_iter()
        .next()?
        .volume_info?
        .image_links?
        .thumbnail
        .map(|url| secure_url(&url))
}

/// Rewrite an `http://` URL to `https://`
pub fn secure_url(url: &str) -> String {
    match url.strip_prefix("http://") {
        Some(rest) => format!("https://{}", rest),
        None => url.to_string(),
    }
}

#[async_trait]
impl CoverProvider for GoogleBooksClient {
    async fn find_cover(&self, title: &str, author: &str) -> Result<Option<String>, CoverError> {
        let api_key = self.api_key.as_deref().ok_or(CoverError::NotConfigured)?;
        let query = search_query(title, author);

        tracing::debug!(query = %query, "Querying Google Books API");

        let response = self
            .http_client
            .get(GOOGLE_BOOKS_VOLUMES_URL)
            .query(&[("q", query.as_str()), ("key", api_key)])
            .send()
            .await
            .map_err(|e| CoverError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(CoverError::ApiError(status.as_u16(), error_text));
        }

        let parsed: VolumesResponse = response
            .json()
            .await
            .map_err(|e| CoverError::ParseError(e.to_string()))?;

        Ok(first_thumbnail(parsed))
    }
}
