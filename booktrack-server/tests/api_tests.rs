//! Integration tests for booktrack-server HTTP endpoints
//!
//! Routes run in-process through `tower::ServiceExt::oneshot` against a
//! throw-away database and adapter doubles.

mod helpers;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use booktrack_server::auth::USER_HEADER;
use booktrack_server::build_router;
use booktrack_server::services::PLACEHOLDER_COVER;
use helpers::{
    create_test_db, seed_shelf, seed_user, MockCompletion, MockCovers, MockOcr, TestServices,
};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot` method

const BOUNDARY: &str = "booktrack-test-boundary";

struct TestApp {
    _dir: TempDir,
    pool: SqlitePool,
    services: TestServices,
}

impl TestApp {
    async fn new(services: TestServices) -> Self {
        let (dir, pool) = create_test_db().await;
        Self {
            _dir: dir,
            pool,
            services,
        }
    }

    fn router(&self) -> Router {
        build_router(self.services.app_state(&self.pool))
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        (status, extract_json(response.into_body()).await)
    }
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

fn get(uri: &str, user: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_HEADER, user);
    }
    builder.body(Body::empty()).unwrap()
}

fn delete(uri: &str, user: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .header(USER_HEADER, user)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, user: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(user) = user {
        builder = builder.header(USER_HEADER, user);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn post_image(uri: &str, user: &str, image: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        b"Content-Disposition: form-data; name=\"file\"; filename=\"shelf.jpg\"\r\n",
    );
    body.extend_from_slice(b"Content-Type: image/jpeg\r\n\r\n");
    body.extend_from_slice(image);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(USER_HEADER, user)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

// =============================================================================
// Health and identity
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_no_auth_required() {
    let app = TestApp::new(TestServices::quiet()).await;

    let (status, body) = app.send(get("/health", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "booktrack-server");
    assert!(body["version"].is_string());
    assert!(body["uptime_seconds"].is_u64());
}

#[tokio::test]
async fn test_missing_identity_is_rejected() {
    let app = TestApp::new(TestServices::quiet()).await;

    let (status, body) = app.send(get("/api/bookshelves", None)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Not authenticated");
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn test_unsynced_identity_is_rejected() {
    let app = TestApp::new(TestServices::quiet()).await;

    let (status, _) = app.send(get("/api/analytics/genres", Some("user_ghost"))).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_identity_webhook_creates_and_deletes_users() {
    let app = TestApp::new(TestServices::quiet()).await;

    let created = json!({
        "type": "user.created",
        "data": {
            "id": "user_42",
            "email_addresses": [{"email_address": "reader@example.com"}],
            "first_name": "Ada",
            "last_name": "Reader",
            "image_url": "https://img.example.com/ada.png"
        }
    });
    let (status, body) = app.send(post_json("/api/webhooks/identity", None, created)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["action"], "upserted");

    let (status, _) = app.send(get("/api/bookshelves", Some("user_42"))).await;
    assert_eq!(status, StatusCode::OK);

    let deleted = json!({"type": "user.deleted", "data": {"id": "user_42"}});
    let (status, body) = app.send(post_json("/api/webhooks/identity", None, deleted)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["action"], "deleted");

    let (status, _) = app.send(get("/api/bookshelves", Some("user_42"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_identity_webhook_requires_email() {
    let app = TestApp::new(TestServices::quiet()).await;

    let event = json!({"type": "user.updated", "data": {"id": "user_1", "email_addresses": []}});
    let (status, body) = app.send(post_json("/api/webhooks/identity", None, event)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_identity_webhook_ignores_other_events() {
    let app = TestApp::new(TestServices::quiet()).await;

    let event = json!({"type": "session.created", "data": {"id": "sess_1"}});
    let (status, body) = app.send(post_json("/api/webhooks/identity", None, event)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["action"], "ignored");
}

// =============================================================================
// Ingestion
// =============================================================================

#[tokio::test]
async fn test_ingest_returns_preview_with_covers() {
    let app = TestApp::new(TestServices::new(
        MockOcr::returning("DUNE\nFRANK HERBERT"),
        MockCompletion::returning(
            r#"{"books":[{"title":"Dune","author":"Frank Herbert","genre":"Science Fiction"}]}"#,
        ),
        MockCovers::new(),
    ))
    .await;
    seed_user(&app.pool, "reader").await;

    let (status, body) = app.send(post_image("/api/ingest", "reader", b"\xFF\xD8jpeg")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["text"], "DUNE\nFRANK HERBERT");
    assert_eq!(body["data"]["books"][0]["title"], "Dune");
    assert_eq!(body["data"]["books"][0]["cover_url"], MockCovers::url_for("Dune"));
}

#[tokio::test]
async fn test_ocr_without_text_is_bad_request() {
    let app = TestApp::new(TestServices::new(
        MockOcr::no_text(),
        MockCompletion::returning(r#"{"books":[]}"#),
        MockCovers::new(),
    ))
    .await;
    seed_user(&app.pool, "reader").await;

    let (status, body) = app.send(post_image("/api/ocr", "reader", b"blank")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No text detected in the image");
    assert_eq!(app.services.completion.calls(), 0);
}

#[tokio::test]
async fn test_upload_without_file_is_bad_request() {
    let app = TestApp::new(TestServices::quiet()).await;
    seed_user(&app.pool, "reader").await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/ocr")
        .header(USER_HEADER, "reader")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(format!("--{}--\r\n", BOUNDARY)))
        .unwrap();
    let (status, _) = app.send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.services.ocr.calls(), 0);
}

#[tokio::test]
async fn test_analyze_malformed_output_is_bad_gateway() {
    let app = TestApp::new(TestServices::new(
        MockOcr::returning("x"),
        MockCompletion::returning("I found Dune by Frank Herbert"),
        MockCovers::new(),
    ))
    .await;
    seed_user(&app.pool, "reader").await;

    let (status, body) = app
        .send(post_json("/api/analyze", Some("reader"), json!({"text": "DUNE"})))
        .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["success"], false);
}

// =============================================================================
// Books and bookshelves
// =============================================================================

#[tokio::test]
async fn test_bookshelf_create_and_list() {
    let app = TestApp::new(TestServices::quiet()).await;
    seed_user(&app.pool, "reader").await;

    let (status, body) = app
        .send(post_json(
            "/api/bookshelves",
            Some("reader"),
            json!({"name": "Sci-Fi", "description": "Rockets"}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Sci-Fi");

    seed_shelf(&app.pool, "reader", "Classics").await;
    let (_, body) = app.send(get("/api/bookshelves", Some("reader"))).await;
    let names: Vec<_> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Classics", "Sci-Fi"]);

    let (status, _) = app
        .send(post_json("/api/bookshelves", Some("reader"), json!({"name": "  "})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_save_search_and_delete_book() {
    let app = TestApp::new(TestServices::quiet()).await;
    seed_user(&app.pool, "reader").await;
    seed_user(&app.pool, "other").await;

    let (status, body) = app
        .send(post_json(
            "/api/books",
            Some("reader"),
            json!({"title": "Dune", "author": "Frank Herbert", "genre": "Science Fiction"}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    let book_id = body["data"]["book_id"].as_str().unwrap().to_string();

    let (_, body) = app
        .send(get("/api/books/search?q=herbert&filter=author", Some("reader")))
        .await;
    assert_eq!(body["data"][0]["title"], "Dune");
    assert_eq!(body["data"][0]["bookshelves"], json!(["Default"]));

    let (_, body) = app.send(get("/api/books/search?q=dune", Some("other"))).await;
    assert_eq!(body["data"], json!([]));

    let (status, _) = app.send(delete(&format!("/api/books/{}", book_id), "other")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.send(delete(&format!("/api/books/{}", book_id), "reader")).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.send(get("/api/books/search", Some("reader"))).await;
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn test_save_onto_foreign_shelf_is_invalid_selection() {
    let app = TestApp::new(TestServices::quiet()).await;
    seed_user(&app.pool, "reader").await;
    seed_user(&app.pool, "other").await;
    let shelf = seed_shelf(&app.pool, "other", "Private").await;

    let (status, body) = app
        .send(post_json(
            "/api/books",
            Some("reader"),
            json!({"title": "Dune", "bookshelf_id": shelf}),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid bookshelf selected");
}

#[tokio::test]
async fn test_batch_save_reports_failures() {
    let app = TestApp::new(TestServices::quiet()).await;
    seed_user(&app.pool, "reader").await;

    let (status, body) = app
        .send(post_json(
            "/api/books/batch",
            Some("reader"),
            json!({"books": [
                {"title": "Dune", "author": "Frank Herbert", "genre": "Science Fiction"},
                {"title": "", "author": "Nobody"},
                {"title": "1984", "author": "George Orwell", "genre": "Dystopian"}
            ]}),
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Failed to save 1 books");
    assert_eq!(body["data"]["saved"], 2);
    assert_eq!(body["data"]["failed"], 1);
}

// =============================================================================
// Reports, covers, recommendations
// =============================================================================

#[tokio::test]
async fn test_analytics_routes() {
    let app = TestApp::new(TestServices::quiet()).await;
    seed_user(&app.pool, "reader").await;
    for (title, author, genre) in [
        ("Dune", "Herbert", "SciFi"),
        ("Dune Messiah", "Herbert", "SciFi"),
        ("1984", "Orwell", "Dystopian"),
    ] {
        app.send(post_json(
            "/api/books",
            Some("reader"),
            json!({"title": title, "author": author, "genre": genre}),
        ))
        .await;
    }

    let (_, genres) = app.send(get("/api/analytics/genres", Some("reader"))).await;
    assert_eq!(
        genres["data"],
        json!([{"name": "SciFi", "value": 2}, {"name": "Dystopian", "value": 1}])
    );

    let (_, authors) = app.send(get("/api/analytics/authors", Some("reader"))).await;
    assert_eq!(
        authors["data"],
        json!([{"name": "Herbert", "books": 2}, {"name": "Orwell", "books": 1}])
    );

    let (_, timeline) = app.send(get("/api/analytics/timeline", Some("reader"))).await;
    assert_eq!(timeline["data"][0]["books"], 3);
}

#[tokio::test]
async fn test_cover_route() {
    let app = TestApp::new(TestServices::new(
        MockOcr::returning("x"),
        MockCompletion::returning("{}"),
        MockCovers::new().missing_for("Obscure"),
    ))
    .await;
    seed_user(&app.pool, "reader").await;

    let (status, body) = app
        .send(get("/api/covers?title=Dune&author=Frank%20Herbert", Some("reader")))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["cover_url"], MockCovers::url_for("Dune"));

    let (_, body) = app.send(get("/api/covers?title=Obscure", Some("reader"))).await;
    assert_eq!(body["data"]["cover_url"], PLACEHOLDER_COVER);

    let (status, _) = app.send(get("/api/covers?author=Nobody", Some("reader"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_recommendations_for_empty_library_skip_completion() {
    let app = TestApp::new(TestServices::quiet()).await;
    seed_user(&app.pool, "reader").await;

    let (status, body) = app.send(get("/api/recommendations", Some("reader"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));
    assert_eq!(app.services.completion.calls(), 0);
}

#[tokio::test]
async fn test_recommendations_with_covers() {
    let app = TestApp::new(TestServices::new(
        MockOcr::returning("x"),
        MockCompletion::returning(
            r#"{"recommendations":[
                {"title":"Hyperion","author":"Dan Simmons"},
                {"title":"Foundation","author":"Isaac Asimov"}
            ]}"#,
        ),
        MockCovers::new().failing_for("Foundation"),
    ))
    .await;
    seed_user(&app.pool, "reader").await;
    app.send(post_json(
        "/api/books",
        Some("reader"),
        json!({"title": "Dune", "author": "Frank Herbert", "genre": "SciFi"}),
    ))
    .await;

    let (status, body) = app.send(get("/api/recommendations", Some("reader"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["id"], "hyperion-dan-simmons");
    assert_eq!(body["data"][0]["cover"], MockCovers::url_for("Hyperion"));
    assert_eq!(body["data"][1]["cover"], PLACEHOLDER_COVER);

    let request = app.services.completion.last_request().unwrap();
    assert!(request.prompt.contains("- \"Dune\" by Frank Herbert (SciFi)"));
    assert_eq!(request.max_tokens, Some(500));
}
