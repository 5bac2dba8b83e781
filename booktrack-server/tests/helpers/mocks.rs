//! Hand-written adapter doubles (no network)

use async_trait::async_trait;
use booktrack_server::auth::TrustedHeaderIdentity;
use booktrack_server::services::{
    CompletionError, CompletionProvider, CompletionRequest, CoverError, CoverProvider,
    CoverService, IngestionPipeline, OcrError, OcrProvider,
};
use booktrack_server::AppState;
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// OCR double returning fixed text
pub struct MockOcr {
    text: Option<String>,
    calls: AtomicUsize,
}

impl MockOcr {
    pub fn returning(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn no_text() -> Self {
        Self {
            text: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OcrProvider for MockOcr {
    async fn detect_text(&self, _image: &[u8]) -> Result<Option<String>, OcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.text.clone())
    }
}

/// Completion double returning a fixed body, or failing when none is set
pub struct MockCompletion {
    response: Option<String>,
    calls: AtomicUsize,
    last_request: Mutex<Option<CompletionRequest>>,
}

impl MockCompletion {
    pub fn returning(response: &str) -> Self {
        Self {
            response: Some(response.to_string()),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        Self {
            response: None,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for MockCompletion {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        self.response
            .clone()
            .ok_or_else(|| CompletionError::ApiError(503, "mock outage".to_string()))
    }
}

/// Cover double: `https://covers.test/<title>` unless told otherwise
pub struct MockCovers {
    failing: HashSet<String>,
    missing: HashSet<String>,
    calls: AtomicUsize,
}

impl MockCovers {
    pub fn new() -> Self {
        Self {
            failing: HashSet::new(),
            missing: HashSet::new(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Lookups for `title` fail with a network error
    pub fn failing_for(mut self, title: &str) -> Self {
        self.failing.insert(title.to_string());
        self
    }

    /// Lookups for `title` find nothing
    pub fn missing_for(mut self, title: &str) -> Self {
        self.missing.insert(title.to_string());
        self
    }

    pub fn url_for(title: &str) -> String {
        format!("https://covers.test/{}", title.replace(' ', "_"))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CoverProvider for MockCovers {
    async fn find_cover(&self, title: &str, _author: &str) -> Result<Option<String>, CoverError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(title) {
            return Err(CoverError::NetworkError("connection reset".to_string()));
        }
        if self.missing.contains(title) {
            return Ok(None);
        }
        Ok(Some(Self::url_for(title)))
    }
}

/// One set of doubles, shared between the state and the assertions
pub struct TestServices {
    pub ocr: Arc<MockOcr>,
    pub completion: Arc<MockCompletion>,
    pub covers: Arc<MockCovers>,
}

impl TestServices {
    pub fn new(ocr: MockOcr, completion: MockCompletion, covers: MockCovers) -> Self {
        Self {
            ocr: Arc::new(ocr),
            completion: Arc::new(completion),
            covers: Arc::new(covers),
        }
    }

    /// Doubles that succeed with an empty extraction
    pub fn quiet() -> Self {
        Self::new(
            MockOcr::returning("DUNE"),
            MockCompletion::returning(r#"{"books":[]}"#),
            MockCovers::new(),
        )
    }

    pub fn cover_service(&self, pool: &SqlitePool) -> CoverService {
        CoverService::new(pool.clone(), self.covers.clone())
    }

    pub fn pipeline(&self, pool: &SqlitePool) -> IngestionPipeline {
        IngestionPipeline::new(
            pool.clone(),
            self.ocr.clone(),
            self.completion.clone(),
            self.cover_service(pool),
        )
    }

    pub fn app_state(&self, pool: &SqlitePool) -> AppState {
        AppState::new(
            pool.clone(),
            Arc::new(TrustedHeaderIdentity::new(pool.clone())),
            self.ocr.clone(),
            self.completion.clone(),
            self.covers.clone(),
        )
    }
}
