//! Bookshelf rows

use booktrack_common::db::Bookshelf;
use booktrack_common::uuid_utils;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Shelf id if `shelf_id` exists and belongs to `user_id`
pub async fn find_owned(
    pool: &SqlitePool,
    user_id: &str,
    shelf_id: Uuid,
) -> Result<Option<Uuid>, sqlx::Error> {
    let row = sqlx::query("SELECT guid FROM bookshelves WHERE guid = ? AND user_id = ?")
        .bind(shelf_id.to_string())
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => Ok(Some(uuid_utils::parse_column(row.get("guid"))?)),
        None => Ok(None),
    }
}

/// First shelf owned by `user_id` with exactly this name
pub async fn find_by_name(
    pool: &SqlitePool,
    user_id: &str,
    name: &str,
) -> Result<Option<Uuid>, sqlx::Error> {
    let row = sqlx::query(
        "SELECT guid FROM bookshelves WHERE user_id = ? AND name = ? ORDER BY created_at, rowid LIMIT 1",
    )
    .bind(user_id)
    .bind(name)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(Some(uuid_utils::parse_column(row.get("guid"))?)),
        None => Ok(None),
    }
}

pub async fn create(
    pool: &SqlitePool,
    user_id: &str,
    name: &str,
    description: &str,
) -> Result<Bookshelf, sqlx::Error> {
    let id = uuid_utils::generate();

    sqlx::query(
        r#"
        INSERT INTO bookshelves (guid, user_id, name, description, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(user_id)
    .bind(name)
    .bind(description)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(Bookshelf {
        id,
        name: name.to_string(),
        description: description.to_string(),
    })
}

/// Shelves owned by `user_id`, ordered by name
pub async fn list(pool: &SqlitePool, user_id: &str) -> Result<Vec<Bookshelf>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT guid, name, description FROM bookshelves WHERE user_id = ? ORDER BY name, rowid",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| {
            Ok(Bookshelf {
                id: uuid_utils::parse_column(row.get("guid"))?,
                name: row.get("name"),
                description: row.get("description"),
            })
        })
        .collect()
}

/// Ids of every shelf owned by `user_id`
pub async fn ids_for_user(pool: &SqlitePool, user_id: &str) -> Result<Vec<Uuid>, sqlx::Error> {
    let guids: Vec<String> =
        sqlx::query_scalar("SELECT guid FROM bookshelves WHERE user_id = ? ORDER BY rowid")
            .bind(user_id)
            .fetch_all(pool)
            .await?;

    guids.iter().map(|g| uuid_utils::parse_column(g)).collect()
}
