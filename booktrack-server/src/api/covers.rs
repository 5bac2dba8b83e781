//! Cover lookup endpoint

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::services::PLACEHOLDER_COVER;
use crate::{ApiError, ApiResponse, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct CoverQuery {
    pub title: Option<String>,
    #[serde(default)]
    pub author: String,
}

#[derive(Debug, Serialize)]
pub struct CoverResponse {
    pub cover_url: String,
}

/// GET /api/covers?title=&author=
///
/// Adapter failures surface as errors here; only "no cover found" maps to
/// the placeholder.
pub async fn find_cover(
    _user: CurrentUser,
    State(state): State<AppState>,
    Query(query): Query<CoverQuery>,
) -> ApiResult<Json<ApiResponse<CoverResponse>>> {
    let title = query
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Title is required".to_string()))?;

    let cover_url = state
        .covers
        .find_cover(title, query.author.trim())
        .await?
        .unwrap_or_else(|| PLACEHOLDER_COVER.to_string());

    Ok(Json(ApiResponse::ok(CoverResponse { cover_url })))
}

pub fn cover_routes() -> Router<AppState> {
    Router::new().route("/api/covers", get(find_cover))
}
