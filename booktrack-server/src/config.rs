//! External service settings for booktrack-server
//!
//! API keys resolve with ENV → TOML priority. A blank value counts as unset
//! in either source. An unresolved key is not an error here: the matching
//! adapter reports `NotConfigured` on each call instead.

use booktrack_common::config::ServicesConfig;
use std::time::Duration;
use tracing::{info, warn};

pub const VISION_API_KEY_ENV: &str = "BOOKTRACK_VISION_API_KEY";
pub const OPENAI_API_KEY_ENV: &str = "BOOKTRACK_OPENAI_API_KEY";
pub const GOOGLE_BOOKS_API_KEY_ENV: &str = "BOOKTRACK_GOOGLE_BOOKS_API_KEY";

/// Resolved adapter settings
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub vision_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub google_books_api_key: Option<String>,
    pub request_timeout: Duration,
}

impl ServiceSettings {
    pub fn resolve(toml: &ServicesConfig) -> Self {
        Self {
            vision_api_key: resolve_api_key(
                "Vision",
                VISION_API_KEY_ENV,
                toml.vision_api_key.as_deref(),
            ),
            openai_api_key: resolve_api_key(
                "OpenAI",
                OPENAI_API_KEY_ENV,
                toml.openai_api_key.as_deref(),
            ),
            openai_model: toml.openai_model.clone(),
            google_books_api_key: resolve_api_key(
                "Google Books",
                GOOGLE_BOOKS_API_KEY_ENV,
                toml.google_books_api_key.as_deref(),
            ),
            request_timeout: Duration::from_secs(toml.request_timeout_secs.max(1)),
        }
    }

    /// Names of services running without a key
    pub fn missing_keys(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.vision_api_key.is_none() {
            missing.push("Vision");
        }
        if self.openai_api_key.is_none() {
            missing.push("OpenAI");
        }
        if self.google_books_api_key.is_none() {
            missing.push("Google Books");
        }
        missing
    }
}

/// Non-empty, non-whitespace
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Resolve one API key: environment variable, then TOML
pub fn resolve_api_key(service: &str, env_var: &str, toml_key: Option<&str>) -> Option<String> {
    let env_key = std::env::var(env_var).ok().filter(|k| is_valid_key(k));
    let toml_key = toml_key.filter(|k| is_valid_key(k));

    if env_key.is_some() && toml_key.is_some() {
        warn!(
            "{} API key found in multiple sources: environment, TOML. Using environment (highest priority).",
            service
        );
    }

    if let Some(key) = env_key {
        info!("{} API key loaded from environment variable", service);
        return Some(key.trim().to_string());
    }

    if let Some(key) = toml_key {
        info!("{} API key loaded from TOML config", service);
        return Some(key.trim().to_string());
    }

    None
}
