//! Google Cloud Vision text detection client
//!
//! Sends the raw image bytes (base64) with a `TEXT_DETECTION` feature and
//! returns the first annotation, which Vision fills with the full text block.

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const VISION_ANNOTATE_URL: &str = "https://vision.googleapis.com/v1/images:annotate";
const USER_AGENT: &str = concat!("BookTrack/", env!("CARGO_PKG_VERSION"));

/// OCR adapter errors
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Vision API key not configured")]
    NotConfigured,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Image → text adapter
#[async_trait]
pub trait OcrProvider: Send + Sync {
    /// Best-effort text block for the image, `None` when nothing was detected
    async fn detect_text(&self, image: &[u8]) -> Result<Option<String>, OcrError>;
}

#[derive(Debug, Serialize)]
struct AnnotateRequest<'a> {
    requests: [AnnotateImageRequest<'a>; 1],
}

#[derive(Debug, Serialize)]
struct AnnotateImageRequest<'a> {
    image: ImageContent,
    features: [Feature<'a>; 1],
}

#[derive(Debug, Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Debug, Serialize)]
struct Feature<'a> {
    #[serde(rename = "type")]
    feature_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Deserialize)]
struct AnnotateImageResponse {
    #[serde(rename = "textAnnotations", default)]
    text_annotations: Vec<TextAnnotation>,
    error: Option<VisionStatus>,
}

#[derive(Debug, Deserialize)]
struct TextAnnotation {
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct VisionStatus {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: String,
}

/// Vision API client
pub struct VisionClient {
    http_client: reqwest::Client,
    api_key: Option<String>,
}

impl VisionClient {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self, OcrError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| OcrError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key,
        })
    }
}

#[async_trait]
impl OcrProvider for VisionClient {
    async fn detect_text(&self, image: &[u8]) -> Result<Option<String>, OcrError> {
        let api_key = self.api_key.as_deref().ok_or(OcrError::NotConfigured)?;

        let body = AnnotateRequest {
            requests: [AnnotateImageRequest {
                image: ImageContent {
                    content: base64::engine::general_purpose::STANDARD.encode(image),
                },
                features: [Feature {
                    feature_type: "TEXT_DETECTION",
                }],
            }],
        };

        tracing::debug!(image_bytes = image.len(), "Querying Vision API");

        let response = self
            .http_client
            .post(VISION_ANNOTATE_URL)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await
            .map_err(|e| OcrError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(OcrError::ApiError(status.as_u16(), error_text));
        }

        let parsed: AnnotateResponse = response
            .json()
            .await
            .map_err(|e| OcrError::ParseError(e.to_string()))?;

        first_annotation(parsed)
    }
}

fn first_annotation(parsed: AnnotateResponse) -> Result<Option<String>, OcrError> {
    let Some(first) = parsed.responses.into_iter().next() else {
        return Ok(None);
    };

    if let Some(err) = first.error {
        return Err(OcrError::ApiError(err.code, err.message));
    }

    Ok(first
        .text_annotations
        .into_iter()
        .next()
        .map(|annotation| annotation.description))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = VisionClient::new(Some("key".to_string()), Duration::from_secs(5));
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_unconfigured_client_fails_without_network() {
        let client = VisionClient::new(None, Duration::from_secs(5)).unwrap();
        let result = client.detect_text(b"image").await;
        assert!(matches!(result, Err(OcrError::NotConfigured)));
    }

    #[test]
    fn test_first_annotation_is_full_text() {
        let parsed: AnnotateResponse = serde_json::from_str(
            r#"{"responses":[{"textAnnotations":[
                {"description":"DUNE\nFrank Herbert"},
                {"description":"DUNE"}
            ]}]}"#,
        )
        .unwrap();

        assert_eq!(
            first_annotation(parsed).unwrap(),
            Some("DUNE\nFrank Herbert".to_string())
        );
    }

    #[test]
    fn test_no_annotations_is_none() {
        let parsed: AnnotateResponse = serde_json::from_str(r#"{"responses":[{}]}"#).unwrap();
        assert_eq!(first_annotation(parsed).unwrap(), None);

        let parsed: AnnotateResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(first_annotation(parsed).unwrap(), None);
    }

    #[test]
    fn test_embedded_error_is_reported() {
        let parsed: AnnotateResponse = serde_json::from_str(
            r#"{"responses":[{"error":{"code":3,"message":"Bad image data."}}]}"#,
        )
        .unwrap();

        assert!(matches!(
            first_annotation(parsed),
            Err(OcrError::ApiError(3, _))
        ));
    }
}
