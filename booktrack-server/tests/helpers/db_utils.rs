//! Throw-away databases and seed rows

use booktrack_common::db::User;
use booktrack_server::db::{bookshelves, users};
use chrono::Utc;
use sqlx::SqlitePool;
use tempfile::TempDir;
use uuid::Uuid;

/// Fresh database with the full schema
///
/// Keep the `TempDir` alive for the duration of the test.
pub async fn create_test_db() -> (TempDir, SqlitePool) {
    let temp_dir = TempDir::new().expect("Should create temp dir");
    let db_path = temp_dir.path().join("booktrack.db");
    let pool = booktrack_common::db::init_database(&db_path)
        .await
        .expect("Should initialize database");
    (temp_dir, pool)
}

pub async fn seed_user(pool: &SqlitePool, id: &str) -> User {
    let user = User {
        id: id.to_string(),
        email: format!("{}@example.com", id),
        full_name: Some(format!("Reader {}", id)),
        avatar_url: None,
    };
    users::upsert_user(pool, &user, Utc::now())
        .await
        .expect("Should insert user");
    user
}

pub async fn seed_shelf(pool: &SqlitePool, user_id: &str, name: &str) -> Uuid {
    bookshelves::create(pool, user_id, name, "")
        .await
        .expect("Should create bookshelf")
        .id
}
