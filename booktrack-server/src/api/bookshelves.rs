//! Bookshelf endpoints

use axum::{extract::State, routing::get, Json, Router};
use booktrack_common::db::Bookshelf;
use serde::Deserialize;
use tracing::info;

use crate::auth::CurrentUser;
use crate::db::bookshelves;
use crate::{ApiResponse, ApiResult, AppState, LibraryError};

#[derive(Debug, Deserialize)]
pub struct CreateBookshelfRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// GET /api/bookshelves
pub async fn list_bookshelves(
    user: CurrentUser,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<Bookshelf>>>> {
    let shelves = bookshelves::list(&state.db, &user.id).await?;
    Ok(Json(ApiResponse::ok(shelves)))
}

/// POST /api/bookshelves
pub async fn create_bookshelf(
    user: CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateBookshelfRequest>,
) -> ApiResult<Json<ApiResponse<Bookshelf>>> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(
            LibraryError::InvalidInput("bookshelf name must not be empty".to_string()).into(),
        );
    }

    let shelf =
        bookshelves::create(&state.db, &user.id, name, payload.description.trim()).await?;
    info!(user_id = %user.id, shelf_id = %shelf.id, name, "Bookshelf created");

    Ok(Json(ApiResponse::ok(shelf)))
}

pub fn bookshelf_routes() -> Router<AppState> {
    Router::new().route(
        "/api/bookshelves",
        get(list_bookshelves).post(create_bookshelf),
    )
}
