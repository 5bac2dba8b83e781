//! Recommendation endpoint

use axum::{extract::State, routing::get, Json, Router};

use crate::auth::CurrentUser;
use crate::services::recommendations::{self, Recommendation};
use crate::{ApiResponse, ApiResult, AppState};

/// GET /api/recommendations
pub async fn recommend(
    user: CurrentUser,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<Recommendation>>>> {
    let picks =
        recommendations::recommend(&state.db, &state.completion, &state.covers, &user.id).await?;
    Ok(Json(ApiResponse::ok(picks)))
}

pub fn recommendation_routes() -> Router<AppState> {
    Router::new().route("/api/recommendations", get(recommend))
}
