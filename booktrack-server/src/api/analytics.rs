//! Library report endpoints

use axum::{extract::State, routing::get, Json, Router};

use crate::auth::CurrentUser;
use crate::services::analytics::{self, AuthorCount, GenreCount, TimelineEntry};
use crate::{ApiResponse, ApiResult, AppState};

/// GET /api/analytics/genres
pub async fn genres(
    user: CurrentUser,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<GenreCount>>>> {
    let report = analytics::genre_analytics(&state.db, &user.id).await?;
    Ok(Json(ApiResponse::ok(report)))
}

/// GET /api/analytics/authors
pub async fn authors(
    user: CurrentUser,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<AuthorCount>>>> {
    let report = analytics::author_analytics(&state.db, &user.id).await?;
    Ok(Json(ApiResponse::ok(report)))
}

/// GET /api/analytics/timeline
pub async fn timeline(
    user: CurrentUser,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<TimelineEntry>>>> {
    let report = analytics::timeline_analytics(&state.db, &user.id).await?;
    Ok(Json(ApiResponse::ok(report)))
}

pub fn analytics_routes() -> Router<AppState> {
    Router::new()
        .route("/api/analytics/genres", get(genres))
        .route("/api/analytics/authors", get(authors))
        .route("/api/analytics/timeline", get(timeline))
}
