//! Book ingestion pipeline
//!
//! One uploaded image moves through
//! `OCR → extraction → cover fetch → preview`, then each previewed book is
//! persisted on request. Stages run sequentially and nothing is rolled back
//! across stages: a failed extraction leaves no rows behind, and a failed
//! persist keeps whatever author/genre rows it already resolved.
//!
//! # Failure policy
//! - OCR and extraction failures are fatal for the image.
//! - Cover failures degrade to the placeholder image.
//! - Persist failures are reported per book; a batch never undoes its
//!   successful subset.

use chrono::Utc;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::bookshelf_resolver;
use super::completion_client::{CompletionProvider, CompletionRequest};
use super::cover_service::CoverService;
use super::entity_resolver;
use super::ocr_client::OcrProvider;
use crate::db::books;
use crate::db::dimensions::Dimension;
use crate::error::LibraryError;

/// Name stored when the extraction has no author or genre
pub const UNKNOWN: &str = "Unknown";

const EXTRACTION_SYSTEM_MESSAGE: &str = "You are a helpful assistant that analyzes text from book \
    covers and bookshelves to extract book information. Always respond with valid JSON in the \
    specified format.";

/// Pipeline stages, logged as the image moves through them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStage {
    OcrProcessing,
    LlmExtracting,
    CoverFetching,
    Preview,
    Persisting,
    Saved,
    SaveFailed,
}

impl std::fmt::Display for IngestStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            IngestStage::OcrProcessing => "ocr_processing",
            IngestStage::LlmExtracting => "llm_extracting",
            IngestStage::CoverFetching => "cover_fetching",
            IngestStage::Preview => "preview",
            IngestStage::Persisting => "persisting",
            IngestStage::Saved => "saved",
            IngestStage::SaveFailed => "save_failed",
        };
        f.write_str(name)
    }
}

/// One book as read from the completion output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedBook {
    pub title: String,
    pub author: String,
    pub genre: String,
}

/// Extracted book with its cover URL (real or placeholder)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewBook {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub cover_url: String,
}

/// Everything shown to the user before anything is saved
#[derive(Debug, Clone, Serialize)]
pub struct Preview {
    pub text: String,
    pub books: Vec<PreviewBook>,
}

/// Request to save one book
#[derive(Debug, Clone, Deserialize)]
pub struct BookSubmission {
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub bookshelf_id: Option<Uuid>,
}

/// Outcome of one book in a batch save
#[derive(Debug, Clone, Serialize)]
pub struct PersistOutcome {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub book_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Batch save summary
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub saved: usize,
    pub failed: usize,
    pub results: Vec<PersistOutcome>,
}

impl BatchReport {
    pub fn all_saved(&self) -> bool {
        self.failed == 0
    }
}

// Raw completion shape. Fields are optional so one sloppy entry does not
// reject the whole list; only a missing `books` array is malformed.
#[derive(Debug, Deserialize)]
struct RawExtraction {
    books: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawBook {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    genre: Option<String>,
}

/// Trimmed value, or "Unknown" when missing or blank
pub fn name_or_unknown(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => UNKNOWN.to_string(),
    }
}

/// Instruction template wrapped around the OCR text
pub fn extraction_prompt(text: &str) -> String {
    format!(
        "Analyze the following text from a book image or bookshelf and extract book information. \
         If multiple books are detected, list all of them. For each book, provide the title, \
         author (if available), and likely genre based on the title or content.\n\n\
         Format the response as a JSON array with the following structure:\n\
         {{\n  \"books\": [\n    {{\n      \"title\": \"Book Title\",\n      \
         \"author\": \"Author Name or 'Unknown'\",\n      \"genre\": \"Likely Genre\"\n    }}\n  ]\n}}\n\n\
         Text to analyze:\n{}",
        text
    )
}

/// Parse completion output into books
///
/// The output must be a JSON object with a `books` array. Entries without a
/// title are dropped; missing author/genre become "Unknown".
pub fn parse_extraction(content: &str) -> Result<Vec<ExtractedBook>, LibraryError> {
    let raw: RawExtraction = serde_json::from_str(content)
        .map_err(|e| LibraryError::MalformedExtraction(format!("invalid JSON: {}", e)))?;

    let entries = match raw.books {
        Some(serde_json::Value::Array(entries)) => entries,
        Some(_) => {
            return Err(LibraryError::MalformedExtraction(
                "\"books\" is not an array".to_string(),
            ))
        }
        None => {
            return Err(LibraryError::MalformedExtraction(
                "missing \"books\" field".to_string(),
            ))
        }
    };

    let mut books = Vec::with_capacity(entries.len());
    for entry in entries {
        let Ok(raw_book) = serde_json::from_value::<RawBook>(entry) else {
            debug!("Skipping non-object book entry");
            continue;
        };
        let title = raw_book.title.as_deref().map(str::trim).unwrap_or_default();
        if title.is_empty() {
            debug!("Skipping book entry without a title");
            continue;
        }
        books.push(ExtractedBook {
            title: title.to_string(),
            author: name_or_unknown(raw_book.author.as_deref()),
            genre: name_or_unknown(raw_book.genre.as_deref()),
        });
    }

    Ok(books)
}

/// Orchestrates the adapters, resolvers and book tables for one user
#[derive(Clone)]
pub struct IngestionPipeline {
    db: SqlitePool,
    ocr: Arc<dyn OcrProvider>,
    completion: Arc<dyn CompletionProvider>,
    covers: CoverService,
}

impl IngestionPipeline {
    pub fn new(
        db: SqlitePool,
        ocr: Arc<dyn OcrProvider>,
        completion: Arc<dyn CompletionProvider>,
        covers: CoverService,
    ) -> Self {
        Self {
            db,
            ocr,
            completion,
            covers,
        }
    }

    /// OCR stage: image bytes to a non-blank text block
    pub async fn detect_text(&self, image: &[u8]) -> Result<String, LibraryError> {
        info!(stage = %IngestStage::OcrProcessing, image_bytes = image.len(), "Ingestion stage");

        match self.ocr.detect_text(image).await? {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(LibraryError::NoTextDetected),
        }
    }

    /// Extraction stage: OCR text to structured books
    pub async fn extract_books(&self, text: &str) -> Result<Vec<ExtractedBook>, LibraryError> {
        info!(stage = %IngestStage::LlmExtracting, text_chars = text.len(), "Ingestion stage");

        if text.trim().is_empty() {
            return Err(LibraryError::NoTextDetected);
        }

        let request =
            CompletionRequest::json(extraction_prompt(text)).with_system(EXTRACTION_SYSTEM_MESSAGE);
        let content = self.completion.complete(&request).await?;

        let books = parse_extraction(&content)?;
        debug!(books = books.len(), "Extraction parsed");
        Ok(books)
    }

    /// Cover stage: one lookup per book, concurrently; never fails
    pub async fn fetch_covers(&self, books: Vec<ExtractedBook>) -> Vec<PreviewBook> {
        info!(stage = %IngestStage::CoverFetching, books = books.len(), "Ingestion stage");

        let futures = books.into_iter().map(|book| {
            let covers = self.covers.clone();
            async move {
                let cover_url = covers.cover_or_placeholder(&book.title, &book.author).await;
                PreviewBook {
                    title: book.title,
                    author: book.author,
                    genre: book.genre,
                    cover_url,
                }
            }
        });

        join_all(futures).await
    }

    /// OCR, extraction and covers for one image
    pub async fn analyze_image(&self, image: &[u8]) -> Result<Preview, LibraryError> {
        let text = self.detect_text(image).await?;
        let books = self.extract_books(&text).await?;
        let books = self.fetch_covers(books).await;

        info!(stage = %IngestStage::Preview, books = books.len(), "Ingestion stage");
        Ok(Preview { text, books })
    }

    /// Save one book onto a shelf owned by `user_id`
    ///
    /// Order: shelf, author, genre, book row, shelf link. The shelf goes
    /// first so an unauthorized shelf leaves no rows behind. If the link
    /// fails the book row is deleted again.
    pub async fn persist_book(
        &self,
        user_id: &str,
        submission: &BookSubmission,
    ) -> Result<Uuid, LibraryError> {
        let title = validated_title(submission)?;
        info!(stage = %IngestStage::Persisting, user_id, title, "Ingestion stage");

        let shelf_id =
            bookshelf_resolver::resolve_target_shelf(&self.db, user_id, submission.bookshelf_id)
                .await?;
        self.persist_on_shelf(shelf_id, title, submission).await
    }

    /// Save every submission concurrently
    ///
    /// The default shelf is resolved once up front so concurrent saves
    /// without an explicit shelf all land on the same one.
    pub async fn persist_all(&self, user_id: &str, submissions: &[BookSubmission]) -> BatchReport {
        let default_shelf = if submissions.iter().any(|s| s.bookshelf_id.is_none()) {
            Some(bookshelf_resolver::resolve_target_shelf(&self.db, user_id, None).await)
        } else {
            None
        };

        let futures = submissions.iter().map(|submission| {
            let default_shelf = &default_shelf;
            async move {
                let result = match (submission.bookshelf_id, default_shelf) {
                    (None, Some(Ok(shelf_id))) => match validated_title(submission) {
                        Ok(title) => self.persist_on_shelf(*shelf_id, title, submission).await,
                        Err(e) => Err(e),
                    },
                    // Explicit shelf, or the up-front default lookup failed
                    _ => self.persist_book(user_id, submission).await,
                };

                match result {
                    Ok(book_id) => PersistOutcome {
                        title: submission.title.clone(),
                        book_id: Some(book_id),
                        error: None,
                    },
                    Err(e) => {
                        warn!(user_id, title = %submission.title, error = %e, "Book save failed");
                        PersistOutcome {
                            title: submission.title.clone(),
                            book_id: None,
                            error: Some(e.to_string()),
                        }
                    }
                }
            }
        });

        let results = join_all(futures).await;
        let saved = results.iter().filter(|r| r.book_id.is_some()).count();
        let report = BatchReport {
            total: results.len(),
            saved,
            failed: results.len() - saved,
            results,
        };

        info!(
            user_id,
            total = report.total,
            saved = report.saved,
            failed = report.failed,
            "Batch save finished"
        );
        report
    }

    async fn persist_on_shelf(
        &self,
        shelf_id: Uuid,
        title: &str,
        submission: &BookSubmission,
    ) -> Result<Uuid, LibraryError> {
        let result = self.insert_and_link(shelf_id, title, submission).await;
        match &result {
            Ok(book_id) => {
                info!(stage = %IngestStage::Saved, %book_id, %shelf_id, title, "Ingestion stage")
            }
            Err(e) => {
                warn!(
                    stage = %IngestStage::SaveFailed,
                    %shelf_id,
                    title,
                    error = %e,
                    "Ingestion stage"
                )
            }
        }
        result
    }

    async fn insert_and_link(
        &self,
        shelf_id: Uuid,
        title: &str,
        submission: &BookSubmission,
    ) -> Result<Uuid, LibraryError> {
        let author = name_or_unknown(submission.author.as_deref());
        let genre = name_or_unknown(submission.genre.as_deref());

        let author_id =
            entity_resolver::resolve_or_create(&self.db, Dimension::Author, &author).await?;
        let genre_id =
            entity_resolver::resolve_or_create(&self.db, Dimension::Genre, &genre).await?;

        let book_id = books::insert_book(&self.db, title, author_id, genre_id).await?;

        if let Err(e) = books::link_book_to_shelf(&self.db, book_id, shelf_id, Utc::now()).await {
            warn!(%book_id, %shelf_id, error = %e, "Shelf link failed, removing book row");
            if let Err(cleanup) = books::delete_book(&self.db, book_id).await {
                warn!(%book_id, error = %cleanup, "Could not remove unlinked book row");
            }
            return Err(e.into());
        }

        Ok(book_id)
    }
}

fn validated_title(submission: &BookSubmission) -> Result<&str, LibraryError> {
    let title = submission.title.trim();
    if title.is_empty() {
        return Err(LibraryError::InvalidInput(
            "book title must not be empty".to_string(),
        ));
    }
    Ok(title)
}
