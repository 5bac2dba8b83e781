//! Service modules for the library backend
//!
//! External adapters (OCR, completion, cover search), the resolvers that
//! turn names into rows, the ingestion pipeline and the read-side reports.

pub mod analytics;
pub mod bookshelf_resolver;
pub mod completion_client;
pub mod cover_client;
pub mod cover_service;
pub mod entity_resolver;
pub mod ingestion;
pub mod ocr_client;
pub mod recommendations;

pub use completion_client::{
    CompletionError, CompletionProvider, CompletionRequest, OpenAiClient, ResponseFormat,
};
pub use cover_client::{CoverError, CoverProvider, GoogleBooksClient};
pub use cover_service::{CoverService, PLACEHOLDER_COVER};
pub use ingestion::{BatchReport, BookSubmission, IngestionPipeline, Preview, PreviewBook};
pub use ocr_client::{OcrError, OcrProvider, VisionClient};
