//! Database access for booktrack-server
//!
//! Thin query functions over the shared SQLite pool. Ownership filters
//! (`user_id = ?`) are explicit in every query that touches a bookshelf.

pub mod books;
pub mod bookshelves;
pub mod cover_cache;
pub mod dimensions;
pub mod users;
