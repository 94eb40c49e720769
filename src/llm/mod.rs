//! Generative model clients shared by the nutrition and spoilage strategies.

pub mod gemini;
pub mod handlers;
pub mod ollama;

use async_trait::async_trait;
use axum::Router;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

pub use gemini::GeminiClient;
pub use ollama::OllamaClient;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    handlers::routes()
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("model is not configured")]
    NotConfigured,
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("model API returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("model returned an empty response")]
    Empty,
    #[error("no JSON object in model response")]
    NoJson,
    #[error("invalid JSON from model: {0}")]
    Json(#[from] serde_json::Error),
}

/// A model that answers a prompt, optionally looking at one JPEG image.
#[async_trait]
pub trait TextModel: Send + Sync {
    /// Short tag reported as the `source` of results.
    fn source(&self) -> &'static str;

    async fn generate(&self, prompt: &str, image: Option<&[u8]>) -> Result<String, LlmError>;
}

lazy_static! {
    static ref JSON_OBJECT: Regex = Regex::new(r"(?s)\{.*\}").unwrap();
}

/// Models wrap JSON in prose or code fences; take the outermost object.
pub fn extract_json_object(text: &str) -> Result<Value, LlmError> {
    let m = JSON_OBJECT.find(text).ok_or(LlmError::NoJson)?;
    Ok(serde_json::from_str(m.as_str())?)
}
