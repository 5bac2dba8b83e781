//! Database models

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User synced from the identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl User {
    /// Name shown to the user: full name when known, else email
    pub fn display_name(&self) -> String {
        match &self.full_name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => self.email.clone(),
        }
    }
}

/// Bookshelf as shown to its owner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bookshelf {
    pub id: Uuid,
    pub name: String,
    pub description: String,
}
