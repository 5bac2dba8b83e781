//! Library reports: books per genre, top authors, books added per month
//!
//! Each report loads the user's shelf ids first and returns an empty list
//! when there are none. Rows arrive in insertion order and the count sorts
//! are stable, so equal counts keep the order in which a name was first
//! seen.

use booktrack_common::time;
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::db::books::{self, ShelfBookRow};
use crate::db::bookshelves;
use crate::error::LibraryError;

/// Maximum entries in the author report
pub const TOP_AUTHORS: usize = 5;

/// Maximum months in the timeline report
pub const TIMELINE_MONTHS: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenreCount {
    pub name: String,
    pub value: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorCount {
    pub name: String,
    pub books: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineEntry {
    pub month: String,
    pub books: usize,
}

/// Count names in first-seen order, then sort by count descending
fn ranked_counts<'a>(names: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();

    for name in names {
        match index.get(name) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(name, counts.len());
                counts.push((name.to_string(), 1));
            }
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Books per genre, most common first. Rows without a genre are skipped.
pub fn genre_report(rows: &[ShelfBookRow]) -> Vec<GenreCount> {
    ranked_counts(rows.iter().filter_map(|r| r.genre.as_deref()))
        .into_iter()
        .map(|(name, value)| GenreCount { name, value })
        .collect()
}

/// Top authors by book count
pub fn author_report(rows: &[ShelfBookRow]) -> Vec<AuthorCount> {
    ranked_counts(rows.iter().filter_map(|r| r.author.as_deref()))
        .into_iter()
        .take(TOP_AUTHORS)
        .map(|(name, books)| AuthorCount { name, books })
        .collect()
}

/// Books added per calendar month (UTC), oldest first, last populated months only
pub fn timeline_report(rows: &[ShelfBookRow]) -> Vec<TimelineEntry> {
    let mut months: BTreeMap<(i32, u32), usize> = BTreeMap::new();
    for row in rows {
        *months.entry(time::month_key(&row.added_at)).or_default() += 1;
    }

    let skip = months.len().saturating_sub(TIMELINE_MONTHS);
    months
        .into_iter()
        .skip(skip)
        .map(|((year, month0), books)| TimelineEntry {
            month: time::month_label(year, month0),
            books,
        })
        .collect()
}

/// Membership rows across every shelf `user_id` owns
pub async fn user_rows(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<ShelfBookRow>, LibraryError> {
    let shelf_ids = bookshelves::ids_for_user(pool, user_id).await?;
    if shelf_ids.is_empty() {
        debug!(user_id, "User has no bookshelves");
        return Ok(Vec::new());
    }

    Ok(books::rows_for_shelves(pool, &shelf_ids).await?)
}

pub async fn genre_analytics(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<GenreCount>, LibraryError> {
    Ok(genre_report(&user_rows(pool, user_id).await?))
}

pub async fn author_analytics(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<AuthorCount>, LibraryError> {
    Ok(author_report(&user_rows(pool, user_id).await?))
}

pub async fn timeline_analytics(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<TimelineEntry>, LibraryError> {
    Ok(timeline_report(&user_rows(pool, user_id).await?))
}
