use axum::{extract::State, routing::post, Json, Router};
use time::OffsetDateTime;
use tracing::{debug, instrument};

use super::dto::{ExtractNutritionRequest, ExtractNutritionResponse};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/extract_nutrition", post(extract_nutrition))
}

#[instrument(skip(state, body), fields(text_len = body.text.len()))]
pub async fn extract_nutrition(
    State(state): State<AppState>,
    Json(body): Json<ExtractNutritionRequest>,
) -> Json<ExtractNutritionResponse> {
    let (nutrition, source) = state.nutrition.run(&body.text).await;

    if let Some(email) = body.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
        state
            .nutrition_log
            .append(email, nutrition.clone(), OffsetDateTime::now_utc())
            .await;
        debug!(email, "nutrition result logged for daily report");
    }

    Json(ExtractNutritionResponse {
        status: "success",
        nutrition,
        source,
    })
}
