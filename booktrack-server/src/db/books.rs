//! Book rows and shelf membership

use booktrack_common::uuid_utils;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use uuid::Uuid;

/// Insert a book and return its generated id
pub async fn insert_book(
    pool: &SqlitePool,
    title: &str,
    author_id: Uuid,
    genre_id: Uuid,
) -> Result<Uuid, sqlx::Error> {
    let id = uuid_utils::generate();

    sqlx::query(
        r#"
        INSERT INTO books (guid, title, author_id, genre_id, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(title)
    .bind(author_id.to_string())
    .bind(genre_id.to_string())
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(id)
}

/// Delete a book; its shelf links cascade. Returns rows removed.
pub async fn delete_book(pool: &SqlitePool, book_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM books WHERE guid = ?")
        .bind(book_id.to_string())
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn link_book_to_shelf(
    pool: &SqlitePool,
    book_id: Uuid,
    bookshelf_id: Uuid,
    added_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO bookshelf_books (book_id, bookshelf_id, added_at)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(book_id.to_string())
    .bind(bookshelf_id.to_string())
    .bind(added_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Whether the book sits on at least one shelf owned by `user_id`
pub async fn is_owned_by(
    pool: &SqlitePool,
    book_id: Uuid,
    user_id: &str,
) -> Result<bool, sqlx::Error> {
    let found: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT 1
        FROM bookshelf_books bb
        JOIN bookshelves s ON s.guid = bb.bookshelf_id
        WHERE bb.book_id = ? AND s.user_id = ?
        LIMIT 1
        "#,
    )
    .bind(book_id.to_string())
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(found.is_some())
}

/// One shelf membership joined through to the book's dimensions
#[derive(Debug, Clone)]
pub struct ShelfBookRow {
    pub title: String,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub added_at: DateTime<Utc>,
}

/// Membership rows for the given shelves, in insertion order
///
/// Ordered by `(added_at, rowid)` so reports that rely on first-seen order
/// for ties are reproducible.
pub async fn rows_for_shelves(
    pool: &SqlitePool,
    shelf_ids: &[Uuid],
) -> Result<Vec<ShelfBookRow>, sqlx::Error> {
    if shelf_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
        r#"
        SELECT b.title AS title, a.name AS author, g.name AS genre, bb.added_at AS added_at
        FROM bookshelf_books bb
        JOIN books b ON b.guid = bb.book_id
        LEFT JOIN authors a ON a.guid = b.author_id
        LEFT JOIN genres g ON g.guid = b.genre_id
        WHERE bb.bookshelf_id IN (
        "#,
    );
    let mut separated = builder.separated(", ");
    for id in shelf_ids {
        separated.push_bind(id.to_string());
    }
    separated.push_unseparated(") ORDER BY bb.added_at, bb.rowid");

    let rows = builder.build().fetch_all(pool).await?;

    Ok(rows
        .into_iter()
        .map(|row| ShelfBookRow {
            title: row.get("title"),
            author: row.get("author"),
            genre: row.get("genre"),
            added_at: row.get("added_at"),
        })
        .collect())
}

/// Field a library search matches against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchFilter {
    #[default]
    Title,
    Author,
    Genre,
}

impl SearchFilter {
    fn field(self, book: &LibraryBook) -> Option<&str> {
        match self {
            SearchFilter::Title => Some(&book.title),
            SearchFilter::Author => book.author.as_deref(),
            SearchFilter::Genre => book.genre.as_deref(),
        }
    }
}

/// Search hit with the names of the user's shelves holding it
#[derive(Debug, Clone, Serialize)]
pub struct LibraryBook {
    pub id: Uuid,
    pub title: String,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub bookshelves: Vec<String>,
}

/// Unicode case-insensitive substring match
fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Books on `user_id`'s shelves whose `filter` field contains `term`
///
/// Matching folds case in Rust rather than with SQLite `LIKE`, which only
/// folds ASCII. An empty term matches every book (books without the
/// filtered dimension included).
pub async fn search(
    pool: &SqlitePool,
    user_id: &str,
    term: &str,
    filter: SearchFilter,
) -> Result<Vec<LibraryBook>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT b.guid AS guid, b.title AS title, a.name AS author, g.name AS genre, s.name AS shelf
        FROM books b
        JOIN bookshelf_books bb ON bb.book_id = b.guid
        JOIN bookshelves s ON s.guid = bb.bookshelf_id
        LEFT JOIN authors a ON a.guid = b.author_id
        LEFT JOIN genres g ON g.guid = b.genre_id
        WHERE s.user_id = ?
        ORDER BY b.title, b.guid, s.name
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let mut books: Vec<LibraryBook> = Vec::new();
    for row in rows {
        let id = uuid_utils::parse_column(row.get("guid"))?;
        let shelf: String = row.get("shelf");

        match books.last_mut() {
            Some(last) if last.id == id => last.bookshelves.push(shelf),
            _ => books.push(LibraryBook {
                id,
                title: row.get("title"),
                author: row.get("author"),
                genre: row.get("genre"),
                bookshelves: vec![shelf],
            }),
        }
    }

    let needle = term.trim().to_lowercase();
    if !needle.is_empty() {
        books.retain(|book| {
            filter
                .field(book)
                .is_some_and(|value| contains_folded(value, &needle))
        });
    }

    Ok(books)
}
