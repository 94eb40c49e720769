use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use super::services::send_nutrition_email;
use crate::{error::ApiError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct SendEmailRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, rename = "nutritionData")]
    pub nutrition_data: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct SendEmailResponse {
    pub status: &'static str,
    pub message: &'static str,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/send_email", post(send_email))
}

#[instrument(skip(state, body))]
pub async fn send_email(
    State(state): State<AppState>,
    Json(body): Json<SendEmailRequest>,
) -> Result<Json<SendEmailResponse>, ApiError> {
    let email = body.email.as_deref().map(str::trim).filter(|e| !e.is_empty());
    let (Some(email), Some(data)) = (email, body.nutrition_data.as_ref().filter(|d| !d.is_null())) else {
        return Err(ApiError::bad_request("Missing required data"));
    };

    send_nutrition_email(state.mailer.as_ref(), email, data).await?;
    Ok(Json(SendEmailResponse {
        status: "success",
        message: "Email sent successfully",
    }))
}
