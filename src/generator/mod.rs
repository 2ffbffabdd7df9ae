//! Evolution generator abstraction and implementations.
//!
//! Enum-based dispatch over the supported backends, avoiding the
//! dyn-compatibility issues with async trait methods. Concrete
//! implementations exist for OpenAI-compatible APIs and the Anthropic
//! Messages API, both over HTTP via `reqwest`, plus a deterministic
//! scripted backend for tests and offline runs.
//!
//! The engine does not care which model is behind the API: it hands over a
//! product, and expects a JSON draft for the next version back within the
//! configured deadline.

mod scripted;

use std::time::Duration;

use thiserror::Error;

pub use scripted::ScriptedGenerator;

use crate::config::{BackendType, GeneratorConfig};
use crate::models::{EvolutionDraft, Product};

#[derive(Debug, Error)]
pub enum GeneratorError {
    /// HTTP transport or API-level failure.
    #[error("generator backend: {0}")]
    Backend(String),

    /// The backend answered, but not with a usable draft.
    #[error("malformed generator output: {0}")]
    Malformed(String),

    /// The call exceeded its deadline.
    #[error("generator timed out after {0:?}")]
    Timeout(Duration),
}

/// A generator that can propose the next version of a product.
pub enum Generator {
    /// OpenAI-compatible chat completions API.
    OpenAi(OpenAiBackend),
    /// Anthropic Messages API.
    Anthropic(AnthropicBackend),
    /// Deterministic canned drafts, no network.
    Scripted(ScriptedGenerator),
}

impl Generator {
    /// Build the configured HTTP backend.
    pub fn from_config(config: &GeneratorConfig) -> Self {
        match config.backend_type {
            BackendType::OpenAi => Self::OpenAi(OpenAiBackend::new(config)),
            BackendType::Anthropic => Self::Anthropic(AnthropicBackend::new(config)),
        }
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &str {
        match self {
            Self::OpenAi(_) => "openai-compatible",
            Self::Anthropic(_) => "anthropic",
            Self::Scripted(_) => "scripted",
        }
    }

    /// Propose the next version of `product`, bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// [`GeneratorError::Timeout`] when the deadline elapses,
    /// [`GeneratorError::Backend`] on transport/API failure, and
    /// [`GeneratorError::Malformed`] when the response is not a complete
    /// draft.
    pub async fn propose(
        &self,
        product: &Product,
        timeout: Duration,
    ) -> Result<EvolutionDraft, GeneratorError> {
        let call = async {
            let raw = match self {
                Self::OpenAi(backend) => backend.complete(product).await?,
                Self::Anthropic(backend) => backend.complete(product).await?,
                Self::Scripted(backend) => return backend.propose(product).await,
            };
            parse_draft(&raw)
        };

        tokio::time::timeout(timeout, call)
            .await
            .map_err(|_| GeneratorError::Timeout(timeout))?
    }
}

/// System prompt shared by the HTTP backends.
const SYSTEM_PROMPT: &str = "You are evolving a product for a comedic shopping channel. \
Generate an EVOLVED version that adds one absurd new feature. The product should get \
progressively more ridiculous with each evolution. You can subtract features (to prevent \
bloat) but you must provide an absurd reason for the removal. Make it funny but not crude, \
appropriate for a family-friendly audience. Parody \"as seen on TV\" products. Not too corny. \
Respond with a single JSON object with string fields: name, tagline, description, ascii_art, \
evolution_note.";

/// Render the user half of the prompt from the product's current fields.
fn render_prompt(product: &Product) -> String {
    format!(
        "The product to evolve is:\n\
         - Name: {}\n\
         - Version: {}\n\
         - Tagline: {}\n\
         - Description: {}",
        product.name, product.version, product.tagline, product.description
    )
}

/// Parse the backend's raw text into a validated draft.
///
/// Tries a direct parse first, then extraction from a markdown code block.
/// A draft with any empty display field counts as malformed.
fn parse_draft(raw: &str) -> Result<EvolutionDraft, GeneratorError> {
    let trimmed = raw.trim();

    let draft: EvolutionDraft = serde_json::from_str(trimmed)
        .or_else(|e| match extract_json_from_codeblock(trimmed) {
            Some(inner) => serde_json::from_str(inner),
            None => Err(e),
        })
        .map_err(|e| GeneratorError::Malformed(format!("draft parse failed: {e}")))?;

    if !draft.is_complete() {
        return Err(GeneratorError::Malformed(
            "draft has empty display fields".to_string(),
        ));
    }

    Ok(draft)
}

/// Extract the contents of the first fenced code block, if any.
fn extract_json_from_codeblock(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after_fence = &text[start + 3..];
    let body_start = after_fence.find('\n')? + 1;
    let body = &after_fence[body_start..];
    let end = body.find("```")?;
    Some(body[..end].trim())
}

// ---------------------------------------------------------------------------
// OpenAI-compatible backend
// ---------------------------------------------------------------------------

/// Backend for OpenAI-compatible chat completions APIs.
///
/// Sends requests to `{api_url}/chat/completions`.
pub struct OpenAiBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl OpenAiBackend {
    pub fn new(config: &GeneratorConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    async fn complete(&self, product: &Product) -> Result<String, GeneratorError> {
        let url = format!("{}/chat/completions", self.api_url);

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": render_prompt(product)}
            ],
            "temperature": 0.9,
            "max_tokens": 1024,
            "response_format": {"type": "json_object"}
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| GeneratorError::Backend(format!("OpenAI request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(GeneratorError::Backend(format!(
                "OpenAI returned {status}: {error_body}"
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GeneratorError::Backend(format!("OpenAI response parse failed: {e}")))?;

        extract_openai_content(&json)
    }
}

/// Extract the text content from an OpenAI chat completions response.
fn extract_openai_content(json: &serde_json::Value) -> Result<String, GeneratorError> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            GeneratorError::Backend(
                "OpenAI response missing choices[0].message.content".to_owned(),
            )
        })
}

// ---------------------------------------------------------------------------
// Anthropic Messages API backend
// ---------------------------------------------------------------------------

/// Backend for the Anthropic Messages API.
///
/// Anthropic differs from OpenAI in three ways: `x-api-key` header instead
/// of a bearer token, system as a top-level field, and the response text
/// living at `content[0].text`.
pub struct AnthropicBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl AnthropicBackend {
    pub fn new(config: &GeneratorConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    async fn complete(&self, product: &Product) -> Result<String, GeneratorError> {
        let url = format!("{}/messages", self.api_url);

        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": 1024,
            "system": SYSTEM_PROMPT,
            "messages": [
                {"role": "user", "content": render_prompt(product)}
            ]
        });

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| GeneratorError::Backend(format!("Anthropic request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(GeneratorError::Backend(format!(
                "Anthropic returned {status}: {error_body}"
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| {
                GeneratorError::Backend(format!("Anthropic response parse failed: {e}"))
            })?;

        extract_anthropic_content(&json)
    }
}

/// Extract the text content from an Anthropic Messages API response.
fn extract_anthropic_content(json: &serde_json::Value) -> Result<String, GeneratorError> {
    json.get("content")
        .and_then(|c| c.get(0))
        .and_then(|b| b.get("text"))
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            GeneratorError::Backend("Anthropic response missing content[0].text".to_owned())
        })
}
