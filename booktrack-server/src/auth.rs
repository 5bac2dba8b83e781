//! Request identity
//!
//! Authentication itself happens in the front proxy, which forwards the
//! identity-provider user id in [`USER_HEADER`]. A request only counts as
//! authenticated when that id has been synced into `users` through the
//! identity webhook.

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;

use crate::db::users;
use crate::error::{ApiError, LibraryError};
use crate::AppState;

/// Header carrying the authenticated user id
pub const USER_HEADER: &str = "x-booktrack-user";

/// The user a request acts for
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentUser {
    pub id: String,
    pub display_name: String,
}

/// Current-user lookup
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_user(&self, headers: &HeaderMap) -> Result<Option<CurrentUser>, LibraryError>;
}

/// Trusts the proxy-forwarded user header, checked against `users`
pub struct TrustedHeaderIdentity {
    db: SqlitePool,
}

impl TrustedHeaderIdentity {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl IdentityProvider for TrustedHeaderIdentity {
    async fn current_user(&self, headers: &HeaderMap) -> Result<Option<CurrentUser>, LibraryError> {
        let Some(user_id) = headers
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
        else {
            debug!("Request carries no user header");
            return Ok(None);
        };

        let user = users::load_user(&self.db, user_id).await?;
        if user.is_none() {
            debug!(user_id, "User header names an unknown user");
        }

        Ok(user.map(|u| CurrentUser {
            display_name: u.display_name(),
            id: u.id,
        }))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        state
            .identity
            .current_user(&parts.headers)
            .await?
            .ok_or_else(|| LibraryError::NotAuthenticated.into())
    }
}
