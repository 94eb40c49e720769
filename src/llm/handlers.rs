use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::LlmError;
use crate::{error::ApiError, state::AppState};

#[derive(Debug, Default, Deserialize)]
pub struct OllamaPromptRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OllamaPromptResponse {
    pub status: &'static str,
    pub response: String,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/predict_with_ollama", post(predict_with_ollama))
}

/// Raw prompt passthrough to the local Ollama server.
#[instrument(skip(state, body), fields(model = tracing::field::Empty))]
pub async fn predict_with_ollama(
    State(state): State<AppState>,
    Json(body): Json<OllamaPromptRequest>,
) -> Result<Json<OllamaPromptResponse>, ApiError> {
    let prompt = body
        .prompt
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("No prompt provided"))?;
    let model = body
        .model
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| state.ollama.model().to_string());
    tracing::Span::current().record("model", model.as_str());

    let response = state
        .ollama
        .generate_with_model(&model, &prompt, None)
        .await
        .map_err(|e| match e {
            LlmError::Status { status, body } => {
                ApiError::internal(format!("Ollama API error: {status} {body}"))
            }
            other => ApiError::internal(format!("Error calling Ollama: {other}")),
        })?;

    Ok(Json(OllamaPromptResponse {
        status: "success",
        response,
    }))
}
