//! Test Helper Utilities
//!
//! Shared utilities for testing booktrack-server

#![allow(dead_code)]

pub mod db_utils;
pub mod mocks;

pub use db_utils::{create_test_db, seed_shelf, seed_user};
pub use mocks::{MockCompletion, MockCovers, MockOcr, TestServices};
