//! # extract::ai: call Claude or OpenAI
//!
//! Both providers are supported through the `AI_PROVIDER` env var.  Images
//! go inline as base64; neither provider needs a separate upload step.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{parse_response, prompt, AIProcessedExpense, ExpenseExtractor, SUPPORTED_IMAGE_TYPES};
use crate::config::{AiProvider, Config};
use crate::error::AppError;

const CLAUDE_MODEL: &str = "claude-3-5-sonnet-20241022";
const OPENAI_MODEL: &str = "gpt-4o";
const MAX_TOKENS: u32 = 1024;

/// Raw bill photo attached to a request.
#[derive(Clone, Copy)]
struct ImageInput<'a> {
    bytes:     &'a [u8],
    mime_type: &'a str,
}

// ─── Extractor ────────────────────────────────────────────────────────────────

pub struct AiExtractor {
    client:   reqwest::Client,
    provider: AiProvider,
    api_key:  String,
    timeout:  Duration,
}

impl AiExtractor {
    pub fn new(client: reqwest::Client, provider: AiProvider, api_key: String, timeout: Duration) -> Self {
        Self { client, provider, api_key, timeout }
    }

    /// `None` when no API key is configured.
    pub fn from_config(client: reqwest::Client, config: &Config) -> Option<Self> {
        let key = config.ai_api_key.clone()?;
        Some(Self::new(client, config.ai_provider, key, config.ai_timeout))
    }

    async fn call(&self, prompt: &str, image: Option<ImageInput<'_>>) -> Result<AIProcessedExpense, AppError> {
        let raw = match self.provider {
            AiProvider::Claude => self.call_claude(prompt, image).await,
            AiProvider::OpenAi => self.call_openai(prompt, image).await,
        }
        .map_err(|e| {
            warn!(provider = %self.provider, error = %e, "❌ Bill extraction failed");
            AppError::ExtractionFailed(format!("{e:#}"))
        })?;

        let draft = parse_response(&raw)?;
        info!(
            provider = %self.provider,
            payer    = %draft.payer,
            total    = %draft.total_amount,
            splits   = draft.splits.len(),
            "🧾 Bill extracted"
        );
        Ok(draft)
    }
}

#[async_trait]
impl ExpenseExtractor for AiExtractor {
    async fn extract_from_text(&self, text: &str) -> Result<AIProcessedExpense, AppError> {
        if text.trim().is_empty() {
            return Err(AppError::BadRequest("nothing to extract: text is empty".into()));
        }
        self.call(&prompt::text_prompt(text), None).await
    }

    async fn extract_from_image(
        &self,
        bytes: &[u8],
        mime_type: &str,
    ) -> Result<AIProcessedExpense, AppError> {
        if bytes.is_empty() {
            return Err(AppError::BadRequest("nothing to extract: image is empty".into()));
        }
        if !SUPPORTED_IMAGE_TYPES.contains(&mime_type) {
            return Err(AppError::BadRequest(format!("unsupported image type '{mime_type}'")));
        }
        self.call(&prompt::image_prompt(), Some(ImageInput { bytes, mime_type })).await
    }
}

// ─── Anthropic Claude ─────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ClaudeRequest<'a> {
    model:      &'a str,
    max_tokens: u32,
    messages:   Vec<ClaudeMessage<'a>>,
}

#[derive(Serialize)]
struct ClaudeMessage<'a> {
    role:    &'a str,
    content: Vec<ClaudeBlock<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClaudeBlock<'a> {
    Image { source: ClaudeImageSource<'a> },
    Text { text: &'a str },
}

#[derive(Serialize)]
struct ClaudeImageSource<'a> {
    #[serde(rename = "type")]
    kind:       &'a str,
    media_type: &'a str,
    data:       String,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    content: Vec<ClaudeContent>,
}

#[derive(Deserialize)]
struct ClaudeContent {
    #[serde(default)]
    text: Option<String>,
}

fn claude_blocks<'a>(prompt: &'a str, image: Option<ImageInput<'a>>) -> Vec<ClaudeBlock<'a>> {
    let mut blocks = Vec::with_capacity(2);
    if let Some(img) = image {
        blocks.push(ClaudeBlock::Image {
            source: ClaudeImageSource {
                kind:       "base64",
                media_type: img.mime_type,
                data:       BASE64.encode(img.bytes),
            },
        });
    }
    blocks.push(ClaudeBlock::Text { text: prompt });
    blocks
}

impl AiExtractor {
    async fn call_claude(&self, prompt: &str, image: Option<ImageInput<'_>>) -> anyhow::Result<String> {
        let body = ClaudeRequest {
            model:      CLAUDE_MODEL,
            max_tokens: MAX_TOKENS,
            messages:   vec![ClaudeMessage { role: "user", content: claude_blocks(prompt, image) }],
        };

        debug!(with_image = image.is_some(), "Calling Claude API...");

        let resp = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .context("Claude API request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("Claude API error {status}: {text}");
        }

        let data: ClaudeResponse = resp.json().await.context("Claude response parse error")?;

        data.content
            .into_iter()
            .find_map(|c| c.text)
            .context("Claude returned empty content")
    }
}

// ─── OpenAI GPT-4o ────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model:           &'a str,
    messages:        Vec<OpenAiMessage<'a>>,
    response_format: OpenAiResponseFormat,
}

#[derive(Serialize)]
struct OpenAiResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct OpenAiMessage<'a> {
    role:    &'a str,
    content: OpenAiContent<'a>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum OpenAiContent<'a> {
    Text(&'a str),
    Parts(Vec<OpenAiPart<'a>>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OpenAiPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: OpenAiImageUrl },
}

#[derive(Serialize)]
struct OpenAiImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiChoiceMsg,
}

#[derive(Deserialize)]
struct OpenAiChoiceMsg {
    content: Option<String>,
}

fn openai_user_content<'a>(prompt: &'a str, image: Option<ImageInput<'a>>) -> OpenAiContent<'a> {
    match image {
        None => OpenAiContent::Text(prompt),
        Some(img) => OpenAiContent::Parts(vec![
            OpenAiPart::Text { text: prompt },
            OpenAiPart::ImageUrl {
                image_url: OpenAiImageUrl {
                    url: format!("data:{};base64,{}", img.mime_type, BASE64.encode(img.bytes)),
                },
            },
        ]),
    }
}

impl AiExtractor {
    async fn call_openai(&self, prompt: &str, image: Option<ImageInput<'_>>) -> anyhow::Result<String> {
        let body = OpenAiRequest {
            model:           OPENAI_MODEL,
            messages:        vec![
                OpenAiMessage {
                    role:    "system",
                    content: OpenAiContent::Text(
                        "You split shared expenses between friends. Always respond with valid JSON only.",
                    ),
                },
                OpenAiMessage { role: "user", content: openai_user_content(prompt, image) },
            ],
            response_format: OpenAiResponseFormat { kind: "json_object" },
        };

        debug!(with_image = image.is_some(), "Calling OpenAI API...");

        let resp = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .context("OpenAI API request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI API error {status}: {text}");
        }

        let data: OpenAiResponse = resp.json().await.context("OpenAI response parse error")?;

        data.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .context("OpenAI returned empty content")
    }
}
