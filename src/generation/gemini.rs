//! Gemini (Google) generation client.

use crate::error::{sanitize_error_message, FlagPortraitError, Result};
use crate::generation::client::{GenerationClient, PORTRAIT_INSTRUCTION};
use crate::image::{decode_base64_lenient, ImageAsset, ImageFormat};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Environment variables consulted for the API key, in order.
pub const API_KEY_ENV_VARS: [&str; 3] = ["GOOGLE_API_KEY", "GEMINI_API_KEY", "API_KEY"];

/// Gemini image model variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GeminiModel {
    /// Nano Banana - Gemini 2.5 Flash Image (fast, economical).
    #[default]
    NanoBanana,
    /// Nano Banana Pro - Gemini 3 Pro Image (highest quality).
    NanoBananaPro,
}

impl GeminiModel {
    /// Returns the API model identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NanoBanana => "gemini-2.5-flash-image",
            Self::NanoBananaPro => "gemini-3-pro-image-preview",
        }
    }
}

/// Builder for GeminiClient.
#[derive(Debug, Clone, Default)]
pub struct GeminiClientBuilder {
    api_key: Option<String>,
    model: GeminiModel,
    base_url: Option<String>,
    instruction: Option<String>,
}

impl GeminiClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to the [`API_KEY_ENV_VARS`] variables.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the Gemini model variant.
    pub fn model(mut self, model: GeminiModel) -> Self {
        self.model = model;
        self
    }

    /// Overrides the API base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Replaces the fixed portrait instruction.
    pub fn instruction(mut self, text: impl Into<String>) -> Self {
        self.instruction = Some(text.into());
        self
    }

    /// Builds the client, resolving the API key.
    ///
    /// A missing or blank key is an [`FlagPortraitError::InvalidCredentials`].
    pub fn build(self) -> Result<GeminiClient> {
        self.build_with_env(|name| std::env::var(name).ok())
    }

    fn build_with_env(self, env: impl Fn(&str) -> Option<String>) -> Result<GeminiClient> {
        let api_key = resolve_api_key(self.api_key, env)
            .ok_or_else(|| {
                FlagPortraitError::InvalidCredentials(format!(
                    "no API key provided and none of {} is set",
                    API_KEY_ENV_VARS.join(", ")
                ))
            })?;

        Ok(GeminiClient {
            client: reqwest::Client::new(),
            api_key,
            model: self.model,
            base_url: self
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            instruction: self
                .instruction
                .unwrap_or_else(|| PORTRAIT_INSTRUCTION.to_string()),
        })
    }
}

fn resolve_api_key(
    explicit: Option<String>,
    env: impl Fn(&str) -> Option<String>,
) -> Option<String> {
    let non_blank = |key: String| {
        let key = key.trim().to_string();
        (!key.is_empty()).then_some(key)
    };

    explicit.and_then(non_blank).or_else(|| {
        API_KEY_ENV_VARS
            .iter()
            .find_map(|name| env(*name).and_then(non_blank))
    })
}

/// Gemini generation client.
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: GeminiModel,
    base_url: String,
    instruction: String,
}

impl GeminiClient {
    /// Creates a new `GeminiClientBuilder`.
    pub fn builder() -> GeminiClientBuilder {
        GeminiClientBuilder::new()
    }

    /// Returns the model this client calls.
    pub fn model(&self) -> GeminiModel {
        self.model
    }

    async fn generate_impl(&self, person: &ImageAsset, flag: &ImageAsset) -> Result<ImageAsset> {
        let start = Instant::now();

        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url,
            self.model.as_str(),
        );

        let body = GeminiRequest::new(person, flag, &self.instruction);

        tracing::debug!(model = self.model.as_str(), "submitting portrait request");

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
            let text = response.text().await.unwrap_or_default();
            let err = classify_error(status.as_u16(), &text);
            tracing::warn!(status = status.as_u16(), kind = %err.kind(), "Gemini request failed");
            return Err(err);
        }

        let gemini_response: GeminiResponse = response.json().await?;
        let image = gemini_response.into_image()?;

        tracing::debug!(
            duration_ms = start.elapsed().as_millis() as u64,
            format = image.mime_type(),
            "portrait generation complete"
        );

        Ok(image)
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn generate(&self, person: &ImageAsset, flag: &ImageAsset) -> Result<ImageAsset> {
        self.generate_impl(person, flag).await
    }

    fn name(&self) -> &str {
        "Gemini (Google)"
    }

    async fn health_check(&self) -> Result<()> {
        let url = format!("{}/models/{}", self.base_url, self.model.as_str());

        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let text = response.text().await.unwrap_or_default();
        Err(classify_error(status.as_u16(), &text))
    }
}

/// Maps an HTTP failure onto the error taxonomy.
///
/// Credential problems win over quota problems, which win over everything else.
fn classify_error(status: u16, text: &str) -> FlagPortraitError {
    let message = serde_json::from_str::<GeminiErrorResponse>(text)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| text.to_string());
    let message = sanitize_error_message(&message);
    let lower = text.to_lowercase();

    if status == 401
        || status == 403
        || lower.contains("api key not valid")
        || lower.contains("api_key_invalid")
        || lower.contains("permission")
    {
        return FlagPortraitError::InvalidCredentials(message);
    }
    if status == 429 || lower.contains("quota") || lower.contains("resource_exhausted") {
        return FlagPortraitError::QuotaExceeded(message);
    }
    if lower.contains("safety") || lower.contains("blocked") || lower.contains("prohibited") {
        return FlagPortraitError::ContentBlocked(message);
    }
    FlagPortraitError::Api { status, message }
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

/// A part in a Gemini request - can be text or inline image data.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiRequestPart {
    Text { text: String },
    InlineData { inline_data: GeminiInlineData },
}

#[derive(Debug, Serialize)]
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
    fn new(person: &ImageAsset, flag: &ImageAsset, instruction: &str) -> Self {
        let inline = |asset: &ImageAsset| GeminiRequestPart::InlineData {
            inline_data: GeminiInlineData {
                mime_type: asset.mime_type().to_string(),
                data: asset.payload().to_string(),
            },
        };

        // Person first, flag second; the instruction refers to them by position
        let parts = vec![
            inline(person),
            inline(flag),
            GeminiRequestPart::Text {
                text: instruction.to_string(),
            },
        ];

        Self {
            contents: vec![GeminiContent { parts }],
            generation_config: GeminiConfig {
                response_modalities: vec!["IMAGE".to_string(), "TEXT".to_string()],
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

impl GeminiResponse {
    fn into_image(self) -> Result<ImageAsset> {
        // Blocks are reported with HTTP 200
        if let Some(ref feedback) = self.prompt_feedback {
            if let Some(ref reason) = feedback.block_reason {
                let msg = feedback
                    .block_reason_message
                    .clone()
                    .unwrap_or_else(|| format!("Prompt blocked: {}", reason));
                return Err(FlagPortraitError::ContentBlocked(msg));
            }
        }

        let candidate = self.candidates.into_iter().next().ok_or_else(|| {
            FlagPortraitError::UnexpectedResponse("No candidates in Gemini response".into())
        })?;

        if let Some(ref finish_reason) = candidate.finish_reason {
            match finish_reason.as_str() {
                "SAFETY"
                | "IMAGE_SAFETY"
                | "IMAGE_PROHIBITED_CONTENT"
                | "IMAGE_RECITATION"
                | "RECITATION"
                | "PROHIBITED_CONTENT"
                | "BLOCKLIST" => {
                    return Err(FlagPortraitError::ContentBlocked(format!(
                        "Content blocked by Gemini safety filter: {}",
                        finish_reason
                    )));
                }
                "IMAGE_OTHER" | "NO_IMAGE" => {
                    return Err(FlagPortraitError::UnexpectedResponse(format!(
                        "Generation failed: {}",
                        finish_reason
                    )));
                }
                _ => {} // STOP, MAX_TOKENS, etc. are normal
            }
        }

        let content = candidate.content.ok_or_else(|| {
            FlagPortraitError::UnexpectedResponse("No content in Gemini candidate".into())
        })?;

        let mut text_reply = None;
        let mut inline_data = None;
        for part in content.parts {
            if let Some(data) = part.inline_data {
                inline_data = Some(data);
                break;
            }
            if text_reply.is_none() {
                text_reply = part.text;
            }
        }

        let inline_data = inline_data.ok_or_else(|| {
            let detail = text_reply
                .map(|t| format!(": {}", sanitize_error_message(&t)))
                .unwrap_or_default();
            FlagPortraitError::UnexpectedResponse(format!(
                "No image data in Gemini response{detail}"
            ))
        })?;

        let data = decode_base64_lenient(&inline_data.data)?;
        if data.is_empty() {
            return Err(FlagPortraitError::UnexpectedResponse(
                "Gemini returned an empty image".into(),
            ));
        }

        let format = ImageFormat::from_magic_bytes(&data)
            .or_else(|| ImageFormat::from_mime_type(&inline_data.mime_type))
            .unwrap_or_default();

        Ok(ImageAsset::from_bytes_with_format(&data, format))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
    #[serde(default)]
    block_reason_message: Option<String>,
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
    text: Option<String>,
    #[serde(default)]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}
