//! # BookTrack Common Library
//!
//! Shared code for the BookTrack service:
//! - Configuration loading and root folder resolution
//! - Database bootstrap and row models
//! - Error type
//! - Time and identifier helpers

pub mod config;
pub mod db;
pub mod error;
pub mod time;
pub mod uuid_utils;

pub use error::{Error, Result};
