//! Gemini (Google) image edit client.

use crate::client::{EditClient, EditRequest};
use crate::encoded::EncodedImage;
use crate::error::{EditError, Result, GENERIC_REFUSAL};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Environment variable the API key is read from when not set explicitly.
pub const API_KEY_ENV_VAR: &str = "GOOGLE_API_KEY";

/// Gemini image model variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GeminiModel {
    /// Gemini 2.5 Flash Image (fast, economical).
    #[default]
    FlashImage,
    /// Gemini 3 Pro Image (highest quality).
    ProImage,
}

impl GeminiModel {
    /// Returns the API model identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FlashImage => "gemini-2.5-flash-image",
            Self::ProImage => "nano-banana-pro-preview",
        }
    }
}

/// Builder for [`GeminiEditClient`].
#[derive(Debug, Clone, Default)]
pub struct GeminiEditClientBuilder {
    api_key: Option<String>,
    model: GeminiModel,
    base_url: Option<String>,
}

impl GeminiEditClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key explicitly instead of reading `GOOGLE_API_KEY`.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the Gemini model variant.
    pub fn model(mut self, model: GeminiModel) -> Self {
        self.model = model;
        self
    }

    /// Overrides the service base URL (tests point this at a local fixture).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Builds the client.
    ///
    /// The API key is deliberately not resolved here: it is read from the
    /// environment on each call, so a missing credential surfaces as a
    /// per-edit failure rather than preventing construction.
    pub fn build(self) -> GeminiEditClient {
        GeminiEditClient {
            client: reqwest::Client::new(),
            api_key: self.api_key,
            model: self.model,
            base_url: self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.into()),
        }
    }
}

/// Gemini image edit client.
///
/// Stateless across calls: it owns nothing but its HTTP client and
/// configuration, and performs exactly one attempt per [`edit`] invocation.
///
/// [`edit`]: EditClient::edit
pub struct GeminiEditClient {
    client: reqwest::Client,
    api_key: Option<String>,
    model: GeminiModel,
    base_url: String,
}

impl GeminiEditClient {
    /// Creates a new [`GeminiEditClientBuilder`].
    pub fn builder() -> GeminiEditClientBuilder {
        GeminiEditClientBuilder::new()
    }

    fn resolve_api_key(&self) -> Result<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV_VAR).ok())
            .filter(|k| !k.is_empty())
            .ok_or(EditError::Config)
    }

    async fn edit_impl(&self, request: &EditRequest) -> Result<EncodedImage> {
        // Credential first, then image shape; neither failure builds a request.
        let api_key = self.resolve_api_key()?;
        request.image.validate()?;

        let start = Instant::now();
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url,
            self.model.as_str(),
        );
        let body = GeminiRequest::from_edit_request(request);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &text));
        }

        let gemini_response: GeminiResponse = response.json().await?;
        let edited = extract_image(gemini_response)?;

        tracing::debug!(
            model = self.model.as_str(),
            mime = edited.mime_type(),
            duration_ms = start.elapsed().as_millis() as u64,
            "edit completed"
        );
        Ok(edited)
    }
}

#[async_trait]
impl EditClient for GeminiEditClient {
    async fn edit(&self, request: &EditRequest) -> Result<EncodedImage> {
        self.edit_impl(request).await
    }

    fn model(&self) -> &str {
        self.model.as_str()
    }
}

fn parse_error(status: u16, text: &str) -> EditError {
    let message = if text.is_empty() {
        "no error detail".to_string()
    } else {
        text.to_string()
    };
    match status {
        401 | 403 => EditError::Auth(message),
        _ => EditError::Api { status, message },
    }
}

/// Scans a response for the edited image.
///
/// Walks the first candidate's parts in document order and returns the first
/// one carrying inline data; later image parts are ignored. When no part has
/// an image, fails with the response's own text (the top-level field when
/// present, else the candidate's concatenated text parts), or the fixed
/// generic message when the response explains nothing.
fn extract_image(response: GeminiResponse) -> Result<EncodedImage> {
    let mut text_parts: Vec<String> = Vec::new();

    if let Some(candidate) = response.candidates.into_iter().next() {
        if let Some(content) = candidate.content {
            for part in content.parts {
                if let Some(inline) = part.inline_data {
                    return Ok(EncodedImage::from_base64(inline.mime_type, inline.data));
                }
                if let Some(text) = part.text {
                    text_parts.push(text);
                }
            }
        }
    }

    let reason = response
        .text
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| text_parts.concat());
    if reason.is_empty() {
        tracing::warn!("response carried neither image nor explanation");
        Err(EditError::Refusal(GENERIC_REFUSAL.to_string()))
    } else {
        tracing::warn!(reason = %reason, "no image in response, surfacing service text");
        Err(EditError::Refusal(reason))
    }
}

// Request/response wire types.
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiRequestPart>,
}

/// A part in a Gemini request, either inline image data or text.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiRequestPart {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineData,
    },
    Text {
        text: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

impl GeminiRequest {
    fn from_edit_request(req: &EditRequest) -> Self {
        let parts = vec![
            GeminiRequestPart::InlineData {
                inline_data: GeminiInlineData {
                    mime_type: req.image.mime_type().to_string(),
                    data: req.image.data().to_string(),
                },
            },
            GeminiRequestPart::Text {
                text: instruction_text(&req.instruction),
            },
        ];
        Self {
            contents: vec![GeminiContent { parts }],
        }
    }
}

/// Wraps the user's instruction in the fixed edit directive.
fn instruction_text(instruction: &str) -> String {
    format!(
        "Modify this image based on the following instruction: \"{instruction}\". \
         Return only the edited image. \
         Maintain the style and quality of the original where possible."
    )
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPartResponse {
    #[serde(default)]
    inline_data: Option<InlineData>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request() -> EditRequest {
        EditRequest::new(
            EncodedImage::parse("data:image/png;base64,AAAA").unwrap(),
            "make it sunset",
        )
    }

    #[test]
    fn test_gemini_model_as_str() {
        assert_eq!(GeminiModel::FlashImage.as_str(), "gemini-2.5-flash-image");
        assert_eq!(GeminiModel::default(), GeminiModel::FlashImage);
    }

    #[test]
    fn test_request_carries_image_then_directive() {
        let body = GeminiRequest::from_edit_request(&sample_request());
        let json = serde_json::to_value(&body).unwrap();

        let parts = &json["contents"][0]["parts"];
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[0]["inlineData"]["data"], "AAAA");

        let text = parts[1]["text"].as_str().unwrap();
        assert!(text.contains("\"make it sunset\""));
        assert!(text.contains("Return only the edited image."));
        assert!(text.contains("Maintain the style and quality"));
    }

    #[test]
    fn test_extract_first_inline_part_wins() {
        let json = r#"{
            "candidates": [{
                "content": {
                    "parts": [
                        {"text": "Here is your edit:"},
                        {"inlineData": {"mimeType": "image/jpeg", "data": "BBBB"}},
                        {"inlineData": {"mimeType": "image/png", "data": "CCCC"}}
                    ]
                }
            }]
        }"#;
        let response: GeminiResponse = serde_json::from_str(json).unwrap();
        let image = extract_image(response).unwrap();
        assert_eq!(image.to_data_uri(), "data:image/jpeg;base64,BBBB");
    }

    #[test]
    fn test_extract_ignores_later_candidates() {
        let json = r#"{
            "candidates": [
                {"content": {"parts": [{"inlineData": {"mimeType": "image/webp", "data": "DDDD"}}]}},
                {"content": {"parts": [{"inlineData": {"mimeType": "image/png", "data": "EEEE"}}]}}
            ]
        }"#;
        let response: GeminiResponse = serde_json::from_str(json).unwrap();
        let image = extract_image(response).unwrap();
        assert_eq!(image.mime_type(), "image/webp");
    }

    #[test]
    fn test_extract_falls_back_to_response_text_exactly() {
        let json = r#"{"candidates": [], "text": "I cannot edit this image."}"#;
        let response: GeminiResponse = serde_json::from_str(json).unwrap();
        match extract_image(response) {
            Err(EditError::Refusal(reason)) => assert_eq!(reason, "I cannot edit this image."),
            other => panic!("expected refusal, got {other:?}"),
        }
    }

    #[test]
    fn test_extract_falls_back_to_candidate_text_parts() {
        let json = r#"{
            "candidates": [{
                "content": {"parts": [{"text": "That request "}, {"text": "was declined."}]}
            }]
        }"#;
        let response: GeminiResponse = serde_json::from_str(json).unwrap();
        match extract_image(response) {
            Err(EditError::Refusal(reason)) => assert_eq!(reason, "That request was declined."),
            other => panic!("expected refusal, got {other:?}"),
        }
    }

    #[test]
    fn test_extract_generic_message_when_response_is_silent() {
        let response: GeminiResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        match extract_image(response) {
            Err(EditError::Refusal(reason)) => assert_eq!(reason, GENERIC_REFUSAL),
            other => panic!("expected refusal, got {other:?}"),
        }

        // Empty-string text field is treated as absent.
        let response: GeminiResponse =
            serde_json::from_str(r#"{"candidates": [], "text": ""}"#).unwrap();
        match extract_image(response) {
            Err(EditError::Refusal(reason)) => assert_eq!(reason, GENERIC_REFUSAL),
            other => panic!("expected refusal, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_error_maps_auth_statuses() {
        assert!(matches!(parse_error(401, "bad key"), EditError::Auth(_)));
        assert!(matches!(parse_error(403, "forbidden"), EditError::Auth(_)));
        assert!(matches!(
            parse_error(500, "boom"),
            EditError::Api { status: 500, .. }
        ));
    }

    #[tokio::test]
    async fn test_missing_credential_fails_before_any_request() {
        std::env::remove_var(API_KEY_ENV_VAR);
        let client = GeminiEditClient::builder()
            // unroutable base URL: a network attempt would fail differently
            .base_url("http://127.0.0.1:1")
            .build();
        match client.edit(&sample_request()).await {
            Err(EditError::Config) => {}
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_explicit_key_falls_through_to_config_error() {
        std::env::remove_var(API_KEY_ENV_VAR);
        let client = GeminiEditClient::builder().api_key("").build();
        assert!(matches!(client.resolve_api_key(), Err(EditError::Config)));
    }

    #[tokio::test]
    async fn test_invalid_image_rejected_without_network() {
        let client = GeminiEditClient::builder()
            .api_key("test-key")
            .base_url("http://127.0.0.1:1")
            .build();
        let request = EditRequest::new(
            EncodedImage::from_base64("text/plain", "AAAA"),
            "make it sunset",
        );
        match client.edit(&request).await {
            Err(EditError::InvalidImage(_)) => {}
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
