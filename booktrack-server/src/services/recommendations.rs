//! Completion-backed reading recommendations

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{debug, info};

use super::analytics;
use super::completion_client::{CompletionProvider, CompletionRequest};
use super::cover_service::CoverService;
use crate::db::books::ShelfBookRow;
use crate::error::LibraryError;

const RECOMMENDATION_COUNT: usize = 3;
const RECOMMENDATION_MAX_TOKENS: u32 = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub id: String,
    pub title: String,
    pub author: String,
    pub cover: String,
}

#[derive(Debug, Deserialize)]
struct RawRecommendations {
    recommendations: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawRecommendation {
    #[serde(default)]
    title: String,
    #[serde(default)]
    author: String,
}

/// Slug id: `"<title>-<author>"`, whitespace runs as `-`, lowercased
pub fn recommendation_id(title: &str, author: &str) -> String {
    let mut id = String::with_capacity(title.len() + author.len() + 1);
    let mut in_space = false;
    for c in format!("{}-{}", title, author).chars() {
        if c.is_whitespace() {
            if !in_space {
                id.push('-');
            }
            in_space = true;
        } else {
            id.extend(c.to_lowercase());
            in_space = false;
        }
    }
    id
}

/// Prompt listing the user's books; rows without title or author are left out
pub fn recommendation_prompt(rows: &[ShelfBookRow]) -> Option<String> {
    let listed: Vec<String> = rows
        .iter()
        .filter_map(|row| {
            let author = row.author.as_deref().filter(|a| !a.is_empty())?;
            if row.title.is_empty() {
                return None;
            }
            Some(format!(
                "- \"{}\" by {} ({})",
                row.title,
                author,
                row.genre.as_deref().unwrap_or_default()
            ))
        })
        .collect();

    if listed.is_empty() {
        return None;
    }

    Some(format!(
        "Based on the following books in the user's library:\n{}\n\n\
         Please recommend {} books they might enjoy. Consider the genres, themes, and writing \
         styles of their current books.\n\
         Return your response in this exact JSON format:\n\
         {{\n  \"recommendations\": [\n    {{\"title\": \"Book Title 1\", \"author\": \"Author Name 1\"}}\n  ]\n}}",
        listed.join("\n"),
        RECOMMENDATION_COUNT
    ))
}

/// Parse `{recommendations: [{title, author}]}`; untitled entries are dropped
pub fn parse_recommendations(content: &str) -> Result<Vec<(String, String)>, LibraryError> {
    let raw: RawRecommendations = serde_json::from_str(content)
        .map_err(|e| LibraryError::MalformedExtraction(format!("invalid JSON: {}", e)))?;

    let Some(serde_json::Value::Array(entries)) = raw.recommendations else {
        return Err(LibraryError::MalformedExtraction(
            "missing \"recommendations\" array".to_string(),
        ));
    };

    Ok(entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value::<RawRecommendation>(entry).ok())
        .filter(|r| !r.title.trim().is_empty())
        .map(|r| (r.title.trim().to_string(), r.author.trim().to_string()))
        .collect())
}

/// Three books the user might enjoy, with covers
///
/// Users without shelves or books get an empty list without a completion
/// call.
pub async fn recommend(
    pool: &SqlitePool,
    completion: &Arc<dyn CompletionProvider>,
    covers: &CoverService,
    user_id: &str,
) -> Result<Vec<Recommendation>, LibraryError> {
    let rows = analytics::user_rows(pool, user_id).await?;
    let Some(prompt) = recommendation_prompt(&rows) else {
        debug!(user_id, "No books to base recommendations on");
        return Ok(Vec::new());
    };

    let request = CompletionRequest::json(prompt).with_max_tokens(RECOMMENDATION_MAX_TOKENS);
    let content = completion.complete(&request).await?;
    let picks = parse_recommendations(&content)?;

    let futures = picks.into_iter().map(|(title, author)| async move {
        let cover = covers.cover_or_placeholder(&title, &author).await;
        Recommendation {
            id: recommendation_id(&title, &author),
            title,
            author,
            cover,
        }
    });
    let recommendations = join_all(futures).await;

    info!(user_id, count = recommendations.len(), "Recommendations ready");
    Ok(recommendations)
}
