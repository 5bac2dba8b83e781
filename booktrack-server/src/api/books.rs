//! Book endpoints: save, batch save, search, delete

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::db::books::{self, LibraryBook, SearchFilter};
use crate::services::{BatchReport, BookSubmission};
use crate::{ApiResponse, ApiResult, AppState, LibraryError};

#[derive(Debug, Serialize)]
pub struct SavedBook {
    pub book_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub books: Vec<BookSubmission>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub filter: SearchFilter,
}

#[derive(Debug, Serialize)]
pub struct DeletedBook {
    pub book_id: Uuid,
}

/// POST /api/books
pub async fn save_book(
    user: CurrentUser,
    State(state): State<AppState>,
    Json(submission): Json<BookSubmission>,
) -> ApiResult<Json<ApiResponse<SavedBook>>> {
    let book_id = state.pipeline.persist_book(&user.id, &submission).await?;
    Ok(Json(ApiResponse::ok(SavedBook { book_id })))
}

/// POST /api/books/batch
///
/// Always answers 200 with the per-book report; `success` is false and
/// `error` names the failure count when any book was not saved.
pub async fn save_books(
    user: CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<BatchRequest>,
) -> Json<ApiResponse<BatchReport>> {
    let report = state.pipeline.persist_all(&user.id, &payload.books).await;

    if report.all_saved() {
        return Json(ApiResponse::ok(report));
    }

    let error = format!("Failed to save {} books", report.failed);
    Json(ApiResponse {
        success: false,
        data: Some(report),
        error: Some(error),
    })
}

/// GET /api/books/search?q=&filter=
pub async fn search_books(
    user: CurrentUser,
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<ApiResponse<Vec<LibraryBook>>>> {
    let results = books::search(&state.db, &user.id, &query.q, query.filter).await?;
    Ok(Json(ApiResponse::ok(results)))
}

/// DELETE /api/books/:id
///
/// Only books on one of the caller's shelves can be deleted.
pub async fn delete_book(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(book_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<DeletedBook>>> {
    if !books::is_owned_by(&state.db, book_id, &user.id).await? {
        return Err(LibraryError::NotFound(format!("Book {}", book_id)).into());
    }

    books::delete_book(&state.db, book_id).await?;
    info!(user_id = %user.id, %book_id, "Book deleted");

    Ok(Json(ApiResponse::ok(DeletedBook { book_id })))
}

pub fn book_routes() -> Router<AppState> {
    Router::new()
        .route("/api/books", post(save_book))
        .route("/api/books/batch", post(save_books))
        .route("/api/books/search", get(search_books))
        .route("/api/books/:id", delete(delete_book))
}
