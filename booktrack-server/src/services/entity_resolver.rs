//! Get-or-insert resolution of author and genre names
//!
//! Lookup first; on a miss insert with `ON CONFLICT(name) DO NOTHING` and
//! look up again. The UNIQUE constraint on `name` makes the second lookup
//! authoritative, so two concurrent resolutions of a new name agree on one
//! row instead of each inserting their own.

use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::dimensions::{self, Dimension};
use crate::error::LibraryError;

/// Resolve `name` to the id of its row, creating the row on first use
pub async fn resolve_or_create(
    pool: &SqlitePool,
    dimension: Dimension,
    name: &str,
) -> Result<Uuid, LibraryError> {
    if name.is_empty() {
        return Err(LibraryError::InvalidInput(format!(
            "{} name must not be empty",
            dimension
        )));
    }

    if let Some(id) = dimensions::find_by_name(pool, dimension, name).await? {
        debug!(%dimension, name, %id, "Found existing row");
        return Ok(id);
    }

    if dimensions::insert_if_absent(pool, dimension, name).await? {
        info!(%dimension, name, "Created new row");
    }

    dimensions::find_by_name(pool, dimension, name)
        .await?
        .ok_or(LibraryError::Storage(sqlx::Error::RowNotFound))
}
