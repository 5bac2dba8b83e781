//! Image ingestion endpoints
//!
//! - `POST /api/ocr`: multipart `file` → `{text}`
//! - `POST /api/analyze`: `{text}` → `{books}`
//! - `POST /api/ingest`: multipart `file` → preview with covers

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::auth::CurrentUser;
use crate::services::ingestion::ExtractedBook;
use crate::services::Preview;
use crate::{ApiError, ApiResponse, ApiResult, AppState};

/// Upload size limit for images
const MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Serialize)]
pub struct OcrResponse {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub books: Vec<ExtractedBook>,
}

/// Bytes of the `file` field
async fn read_image(mut multipart: Multipart) -> ApiResult<Vec<u8>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?;
        if bytes.is_empty() {
            return Err(ApiError::BadRequest("No file data provided".to_string()));
        }
        return Ok(bytes.to_vec());
    }

    Err(ApiError::BadRequest("No file uploaded".to_string()))
}

/// POST /api/ocr
pub async fn detect_text(
    user: CurrentUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<ApiResponse<OcrResponse>>> {
    let image = read_image(multipart).await?;
    debug!(user_id = %user.id, image_bytes = image.len(), "OCR request");

    let text = state.pipeline.detect_text(&image).await?;
    Ok(Json(ApiResponse::ok(OcrResponse { text })))
}

/// POST /api/analyze
pub async fn analyze_text(
    user: CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<AnalyzeRequest>,
) -> ApiResult<Json<ApiResponse<AnalyzeResponse>>> {
    debug!(user_id = %user.id, text_chars = payload.text.len(), "Analyze request");

    let books = state.pipeline.extract_books(&payload.text).await?;
    Ok(Json(ApiResponse::ok(AnalyzeResponse { books })))
}

/// POST /api/ingest
pub async fn ingest_image(
    user: CurrentUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<ApiResponse<Preview>>> {
    let image = read_image(multipart).await?;

    let preview = state.pipeline.analyze_image(&image).await?;
    info!(user_id = %user.id, books = preview.books.len(), "Image analyzed");

    Ok(Json(ApiResponse::ok(preview)))
}

/// Build ingestion routes
pub fn ingest_routes() -> Router<AppState> {
    Router::new()
        .route("/api/ocr", post(detect_text))
        .route("/api/analyze", post(analyze_text))
        .route("/api/ingest", post(ingest_image))
        .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES))
}
