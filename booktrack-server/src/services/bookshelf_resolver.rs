//! Target bookshelf resolution for persisted books

use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::db::bookshelves;
use crate::error::LibraryError;

/// Name of the lazily created per-user shelf
pub const DEFAULT_SHELF_NAME: &str = "Default";
pub const DEFAULT_SHELF_DESCRIPTION: &str = "Default bookshelf";

/// Shelf a book should be added to
///
/// With an explicit shelf the id must belong to `user_id`, otherwise
/// `InvalidSelection` (wrong owner and missing shelf are indistinguishable
/// to the caller). Without one, the user's "Default" shelf is returned,
/// created on first use.
pub async fn resolve_target_shelf(
    pool: &SqlitePool,
    user_id: &str,
    requested_shelf_id: Option<Uuid>,
) -> Result<Uuid, LibraryError> {
    if let Some(shelf_id) = requested_shelf_id {
        return bookshelves::find_owned(pool, user_id, shelf_id)
            .await?
            .ok_or(LibraryError::InvalidSelection);
    }

    if let Some(id) = bookshelves::find_by_name(pool, user_id, DEFAULT_SHELF_NAME).await? {
        return Ok(id);
    }

    let shelf = bookshelves::create(
        pool,
        user_id,
        DEFAULT_SHELF_NAME,
        DEFAULT_SHELF_DESCRIPTION,
    )
    .await?;
    info!(user_id, shelf_id = %shelf.id, "Created default bookshelf");

    Ok(shelf.id)
}
