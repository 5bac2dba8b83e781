//! Cover URL cache rows

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

/// Cached cover URL with the time it was stored
#[derive(Debug, Clone)]
pub struct CachedCover {
    pub cover_url: String,
    pub updated_at: DateTime<Utc>,
}

pub async fn load(pool: &SqlitePool, cache_key: &str) -> Result<Option<CachedCover>, sqlx::Error> {
    let row = sqlx::query("SELECT cover_url, updated_at FROM cover_cache WHERE cache_key = ?")
        .bind(cache_key)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|row| CachedCover {
        cover_url: row.get("cover_url"),
        updated_at: row.get("updated_at"),
    }))
}

pub async fn upsert(
    pool: &SqlitePool,
    cache_key: &str,
    cover_url: &str,
    updated_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO cover_cache (cache_key, cover_url, updated_at)
        VALUES (?, ?, ?)
        ON CONFLICT(cache_key) DO UPDATE SET
            cover_url = excluded.cover_url,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(cache_key)
    .bind(cover_url)
    .bind(updated_at)
    .execute(pool)
    .await?;

    Ok(())
}
