use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument};

use super::dto::{AckResponse, DhtReading, IotReading, SensorPayload};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/iot_data", post(post_iot_data))
        .route("/get_iot_data", get(get_iot_data))
        .route("/nodemcu_dht", post(post_nodemcu_dht))
        .route("/get_latest_nodemcu_dht", get(get_latest_nodemcu_dht))
}

#[instrument(skip(state, payload))]
pub async fn post_iot_data(
    State(state): State<AppState>,
    Json(payload): Json<SensorPayload>,
) -> Json<AckResponse> {
    let reading = state
        .telemetry
        .record_iot(&payload, OffsetDateTime::now_utc())
        .await;
    info!(temperature = reading.temperature, humidity = reading.humidity, "iot data received");
    Json(AckResponse { status: "success" })
}

#[instrument(skip(state))]
pub async fn get_iot_data(State(state): State<AppState>) -> Json<IotReading> {
    Json(state.telemetry.latest_iot().await)
}

#[instrument(skip(state, payload))]
pub async fn post_nodemcu_dht(
    State(state): State<AppState>,
    Json(payload): Json<SensorPayload>,
) -> Json<AckResponse> {
    let reading = state
        .telemetry
        .record_dht(&payload, OffsetDateTime::now_utc())
        .await;
    info!(temperature = reading.temperature, humidity = reading.humidity, "nodemcu dht received");
    Json(AckResponse { status: "success" })
}

#[instrument(skip(state))]
pub async fn get_latest_nodemcu_dht(State(state): State<AppState>) -> Json<DhtReading> {
    Json(state.telemetry.latest_dht().await)
}
