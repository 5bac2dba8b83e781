//! Author and genre tables
//!
//! Both are `{guid, name}` tables with a UNIQUE name, so one set of
//! queries serves both, keyed by [`Dimension`].

use booktrack_common::uuid_utils;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Name-keyed dimension of a book
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Author,
    Genre,
}

impl Dimension {
    pub fn table(self) -> &'static str {
        match self {
            Dimension::Author => "authors",
            Dimension::Genre => "genres",
        }
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dimension::Author => write!(f, "author"),
            Dimension::Genre => write!(f, "genre"),
        }
    }
}

/// Exact-match lookup by name
pub async fn find_by_name(
    pool: &SqlitePool,
    dimension: Dimension,
    name: &str,
) -> Result<Option<Uuid>, sqlx::Error> {
    let sql = format!("SELECT guid FROM {} WHERE name = ?", dimension.table());
    let row = sqlx::query(&sql).bind(name).fetch_optional(pool).await?;

    match row {
        Some(row) => {
            let guid: String = row.get("guid");
            Ok(Some(uuid_utils::parse_column(&guid)?))
        }
        None => Ok(None),
    }
}

/// Insert a row unless the name already exists
///
/// Returns `true` when this call created the row. A concurrent insert of
/// the same name loses quietly on the UNIQUE constraint.
pub async fn insert_if_absent(
    pool: &SqlitePool,
    dimension: Dimension,
    name: &str,
) -> Result<bool, sqlx::Error> {
    let sql = format!(
        "INSERT INTO {} (guid, name, created_at) VALUES (?, ?, ?) ON CONFLICT(name) DO NOTHING",
        dimension.table()
    );
    let result = sqlx::query(&sql)
        .bind(uuid_utils::generate().to_string())
        .bind(name)
        .bind(Utc::now())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() == 1)
}

/// Number of rows in the dimension table
pub async fn count(pool: &SqlitePool, dimension: Dimension) -> Result<i64, sqlx::Error> {
    let sql = format!("SELECT COUNT(*) FROM {}", dimension.table());
    sqlx::query_scalar(&sql).fetch_one(pool).await
}
