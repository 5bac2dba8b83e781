//! HTTP API handlers for booktrack-server
//!
//! Every handler answers with the `{success, data?, error?}` envelope.
//! Library routes require a [`CurrentUser`](crate::auth::CurrentUser);
//! `/health` and the identity webhook do not.

pub mod analytics;
pub mod books;
pub mod bookshelves;
pub mod covers;
pub mod health;
pub mod ingest;
pub mod recommendations;
pub mod webhooks;

pub use analytics::analytics_routes;
pub use books::book_routes;
pub use bookshelves::bookshelf_routes;
pub use covers::cover_routes;
pub use health::health_routes;
pub use ingest::ingest_routes;
pub use recommendations::recommendation_routes;
pub use webhooks::webhook_routes;
