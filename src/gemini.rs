//! Gemini (Google) image transformation client.

use crate::error::{parse_retry_after, sanitize_error_message, Result, RetouchError};
use crate::transformer::ImageTransformer;
use crate::types::Mode;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Model used for both transformations.
pub const GEMINI_IMAGE_MODEL: &str = "gemini-2.5-flash-image";

/// Builder for [`GeminiClient`].
#[derive(Debug, Clone, Default)]
pub struct GeminiClientBuilder {
    api_key: Option<String>,
    model: Option<String>,
}

impl GeminiClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to the `GOOGLE_API_KEY` env var.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Overrides the model identifier (defaults to [`GEMINI_IMAGE_MODEL`]).
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Builds the client, resolving the API key.
    pub fn build(self) -> Result<GeminiClient> {
        let api_key = self
            .api_key
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok())
            .ok_or_else(|| {
                RetouchError::Auth("GOOGLE_API_KEY not set and no API key provided".into())
            })?;

        Ok(GeminiClient {
            client: reqwest::Client::new(),
            api_key,
            model: self.model.unwrap_or_else(|| GEMINI_IMAGE_MODEL.to_string()),
        })
    }
}

/// Client for the Gemini image generation API.
///
/// Constructed explicitly and passed to a [`Session`](crate::Session); the
/// credential lives in the client, not in process-wide state.
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    /// Creates a new `GeminiClientBuilder`.
    pub fn builder() -> GeminiClientBuilder {
        GeminiClientBuilder::new()
    }

    async fn transform_impl(
        &self,
        image_base64: &str,
        mime_type: &str,
        mode: Mode,
    ) -> Result<String> {
        let start = Instant::now();

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model,
        );

        let body = GeminiRequest::new(image_base64, mime_type, mode);

        tracing::debug!(
            model = %self.model,
            %mode,
            mime_type,
            payload_len = image_base64.len(),
            "sending transform request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &text, &headers));
        }

        let gemini_response: GeminiResponse = response.json().await?;
        let data = first_inline_image(gemini_response)?;

        tracing::debug!(
            duration_ms = start.elapsed().as_millis() as u64,
            result_len = data.len(),
            "transform request succeeded"
        );

        Ok(data)
    }
}

/// Maps an error response to the matching error kind.
fn parse_error(status: u16, text: &str, headers: &reqwest::header::HeaderMap) -> RetouchError {
    let text = sanitize_error_message(text);
    if status == 429 {
        let retry_after = parse_retry_after(headers).map(std::time::Duration::from_secs);
        return RetouchError::RateLimited { retry_after };
    }
    if status == 401 || status == 403 {
        return RetouchError::Auth(text);
    }
    RetouchError::Api {
        status,
        message: text,
    }
}

/// Scans the first candidate's parts in order for inline image data.
fn first_inline_image(response: GeminiResponse) -> Result<String> {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|content| {
            content
                .parts
                .into_iter()
                .find_map(|p| p.inline_data.map(|d| d.data))
        })
        .ok_or(RetouchError::NoImage)
}

#[async_trait]
impl ImageTransformer for GeminiClient {
    async fn transform(&self, image_base64: &str, mime_type: &str, mode: Mode) -> Result<String> {
        self.transform_impl(image_base64, mime_type, mode).await
    }
}

// Request/Response types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiRequestPart>,
}

/// A part in a Gemini request - inline image data or text.
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

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiConfig {
    response_modalities: Vec<String>,
}

impl GeminiRequest {
    fn new(image_base64: &str, mime_type: &str, mode: Mode) -> Self {
        // Image part first, instruction second, matching the API's
        // expected ordering for edits.
        let parts = vec![
            GeminiRequestPart::InlineData {
                inline_data: GeminiInlineData {
                    mime_type: mime_type.to_string(),
                    data: image_base64.to_string(),
                },
            },
            GeminiRequestPart::Text {
                text: mode.instruction().to_string(),
            },
        ];

        Self {
            contents: vec![GeminiContent { parts }],
            generation_config: GeminiConfig {
                response_modalities: vec!["IMAGE".to_string()],
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
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
    inline_data: Option<GeminiInlineData>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_with_explicit_key() {
        let client = GeminiClientBuilder::new().api_key("test-key").build();
        assert!(client.is_ok());
        assert_eq!(client.unwrap().model, GEMINI_IMAGE_MODEL);
    }

    #[test]
    fn builder_with_model_override() {
        let client = GeminiClientBuilder::new()
            .api_key("test-key")
            .model("gemini-3-pro-image")
            .build()
            .unwrap();
        assert_eq!(client.model, "gemini-3-pro-image");
    }

    #[test]
    fn request_carries_image_then_instruction() {
        let req = GeminiRequest::new("AAAA", "image/png", Mode::RemoveBackground);

        assert_eq!(req.contents.len(), 1);
        let parts = &req.contents[0].parts;
        assert_eq!(parts.len(), 2);
        assert!(matches!(
            &parts[0],
            GeminiRequestPart::InlineData { inline_data }
                if inline_data.mime_type == "image/png" && inline_data.data == "AAAA"
        ));
        assert!(matches!(
            &parts[1],
            GeminiRequestPart::Text { text } if text == Mode::RemoveBackground.instruction()
        ));
        assert_eq!(req.generation_config.response_modalities, vec!["IMAGE"]);
    }

    #[test]
    fn request_instruction_follows_mode() {
        for mode in [Mode::RemoveBackground, Mode::Enhance] {
            let req = GeminiRequest::new("AAAA", "image/png", mode);
            let GeminiRequestPart::Text { text } = &req.contents[0].parts[1] else {
                panic!("second part should be text");
            };
            assert_eq!(text, mode.instruction());
        }
    }

    #[test]
    fn request_serialization_uses_camel_case() {
        let req = GeminiRequest::new("AAAA", "image/png", Mode::Enhance);
        let json = serde_json::to_value(&req).unwrap();

        assert!(json.get("generationConfig").is_some());
        assert!(json.get("generation_config").is_none());
        let part = &json["contents"][0]["parts"][0];
        assert_eq!(part["inlineData"]["mimeType"], "image/png");
        assert_eq!(
            json["generationConfig"]["responseModalities"],
            serde_json::json!(["IMAGE"])
        );
    }

    #[test]
    fn response_first_inline_image_wins() {
        let json = r#"{
            "candidates": [{
                "content": {
                    "parts": [
                        {},
                        { "inlineData": { "mimeType": "image/png", "data": "Zmlyc3Q=" } },
                        { "inlineData": { "mimeType": "image/png", "data": "c2Vjb25k" } }
                    ]
                }
            }]
        }"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        assert_eq!(first_inline_image(resp).unwrap(), "Zmlyc3Q=");
    }

    #[test]
    fn response_without_image_is_no_image_error() {
        let json = r#"{
            "candidates": [{
                "content": {
                    "parts": [{}]
                }
            }]
        }"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(
            first_inline_image(resp),
            Err(RetouchError::NoImage)
        ));
    }

    #[test]
    fn empty_response_is_no_image_error() {
        let resp: GeminiResponse = serde_json::from_str("{}").unwrap();
        assert!(matches!(
            first_inline_image(resp),
            Err(RetouchError::NoImage)
        ));
    }

    #[test]
    fn parse_error_classifies_status_codes() {
        let headers = reqwest::header::HeaderMap::new();
        assert!(matches!(
            parse_error(401, "bad key", &headers),
            RetouchError::Auth(_)
        ));
        assert!(matches!(
            parse_error(429, "slow down", &headers),
            RetouchError::RateLimited { retry_after: None }
        ));
        assert!(matches!(
            parse_error(500, "boom", &headers),
            RetouchError::Api { status: 500, .. }
        ));
    }

    #[test]
    fn parse_error_reads_retry_after_header() {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(reqwest::header::RETRY_AFTER, "30".parse().unwrap());
        let err = parse_error(429, "slow down", &headers);
        assert!(matches!(
            err,
            RetouchError::RateLimited {
                retry_after: Some(d)
            } if d.as_secs() == 30
        ));
    }
}
