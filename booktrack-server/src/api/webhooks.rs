//! Identity-provider sync webhook
//!
//! Mirrors user accounts into `users` so request identities can be
//! checked. Payload shape: `{type, data: {id, email_addresses, first_name,
//! last_name, image_url}}`.

use axum::{extract::State, routing::post, Json, Router};
use booktrack_common::db::User;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::db::users;
use crate::{ApiError, ApiResponse, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct IdentityEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: IdentityUserData,
}

#[derive(Debug, Deserialize)]
pub struct IdentityUserData {
    pub id: String,
    #[serde(default)]
    pub email_addresses: Vec<EmailAddress>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EmailAddress {
    pub email_address: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncAction {
    Upserted,
    Deleted,
    Ignored,
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub action: SyncAction,
}

/// First and last name joined by a space, blanks skipped
fn full_name(first: Option<&str>, last: Option<&str>) -> String {
    [first, last]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

impl IdentityUserData {
    fn into_user(self) -> ApiResult<User> {
        let email = self
            .email_addresses
            .into_iter()
            .next()
            .map(|e| e.email_address)
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| ApiError::BadRequest("No email address found".to_string()))?;

        Ok(User {
            full_name: Some(full_name(self.first_name.as_deref(), self.last_name.as_deref())),
            id: self.id,
            email,
            avatar_url: self.image_url,
        })
    }
}

/// POST /api/webhooks/identity
pub async fn identity_event(
    State(state): State<AppState>,
    Json(event): Json<IdentityEvent>,
) -> ApiResult<Json<ApiResponse<SyncResponse>>> {
    let action = match event.event_type.as_str() {
        "user.created" | "user.updated" => {
            let user = event.data.into_user()?;
            users::upsert_user(&state.db, &user, Utc::now()).await?;
            info!(user_id = %user.id, "User synced");
            SyncAction::Upserted
        }
        "user.deleted" => {
            let removed = users::delete_user(&state.db, &event.data.id).await?;
            info!(user_id = %event.data.id, removed, "User deleted");
            SyncAction::Deleted
        }
        other => {
            debug!(event_type = other, "Ignoring identity event");
            SyncAction::Ignored
        }
    };

    Ok(Json(ApiResponse::ok(SyncResponse { action })))
}

pub fn webhook_routes() -> Router<AppState> {
    Router::new().route("/api/webhooks/identity", post(identity_event))
}
