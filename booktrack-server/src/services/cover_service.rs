//! Cached cover lookup
//!
//! Entries in `cover_cache` are served while younger than the freshness
//! window (24 hours). Older or missing entries are refreshed synchronously
//! from the cover adapter before the request is answered. Only found URLs
//! are cached; a "no cover" answer is looked up again next time.

use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{debug, warn};

use super::cover_client::CoverProvider;
use crate::db::cover_cache;
use crate::error::LibraryError;

/// Image served when no cover can be found
pub const PLACEHOLDER_COVER: &str = "/placeholder.svg";

/// Cache entries older than this are refreshed
pub const COVER_FRESHNESS_HOURS: i64 = 24;

/// Cache key for a title/author pair
pub fn cache_key(title: &str, author: &str) -> String {
    format!("cover:{}:{}", title, author)
}

#[derive(Clone)]
pub struct CoverService {
    db: SqlitePool,
    provider: Arc<dyn CoverProvider>,
    freshness: Duration,
}

impl CoverService {
    pub fn new(db: SqlitePool, provider: Arc<dyn CoverProvider>) -> Self {
        Self {
            db,
            provider,
            freshness: Duration::hours(COVER_FRESHNESS_HOURS),
        }
    }

    /// Cover URL for a book, `None` when the adapter has none
    ///
    /// Adapter failures surface as `CoverLookupFailed`; cache read/write
    /// failures as `Storage`.
    pub async fn find_cover(
        &self,
        title: &str,
        author: &str,
    ) -> Result<Option<String>, LibraryError> {
        let key = cache_key(title, author);

        if let Some(cached) = cover_cache::load(&self.db, &key).await? {
            if Utc::now().signed_duration_since(cached.updated_at) < self.freshness {
                debug!(cache_key = %key, "Cover cache hit");
                return Ok(Some(cached.cover_url));
            }
            debug!(cache_key = %key, "Cover cache entry stale");
        }

        let found = self
            .provider
            .find_cover(title, author)
            .await
            .map_err(|e| LibraryError::CoverLookupFailed(e.to_string()))?;

        if let Some(url) = &found {
            cover_cache::upsert(&self.db, &key, url, Utc::now()).await?;
        }

        Ok(found)
    }

    /// Cover URL or the placeholder; never fails
    pub async fn cover_or_placeholder(&self, title: &str, author: &str) -> String {
        match self.find_cover(title, author).await {
            Ok(Some(url)) => url,
            Ok(None) => PLACEHOLDER_COVER.to_string(),
            Err(e) => {
                warn!(title, author, error = %e, "Cover lookup failed, using placeholder");
                PLACEHOLDER_COVER.to_string()
            }
        }
    }
}
