use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::{LlmError, TextModel};

/// Local Ollama server, `/api/generate` without streaming.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Run a prompt against any installed model.
    pub async fn generate_with_model(
        &self,
        model: &str,
        prompt: &str,
        image: Option<&[u8]>,
    ) -> Result<String, LlmError> {
        let images = image
            .map(|b| vec![general_purpose::STANDARD.encode(b)])
            .unwrap_or_default();
        let body = GenerateRequest {
            model,
            prompt,
            stream: false,
            images,
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            error!(status, body = %body, "ollama API error");
            return Err(LlmError::Status { status, body });
        }

        let parsed: GenerateResponse = response.json().await?;
        debug!(model, len = parsed.response.len(), "ollama answered");
        Ok(parsed.response)
    }
}

#[async_trait]
impl TextModel for OllamaClient {
    fn source(&self) -> &'static str {
        "ollama"
    }

    async fn generate(&self, prompt: &str, image: Option<&[u8]>) -> Result<String, LlmError> {
        let text = self.generate_with_model(&self.model, prompt, image).await?;
        if text.trim().is_empty() {
            return Err(LlmError::Empty);
        }
        Ok(text)
    }
}
