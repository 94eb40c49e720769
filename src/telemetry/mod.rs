//! Temperature and humidity readings pushed by the storage-room devices.

pub mod dto;
pub mod handlers;
pub mod services;

use axum::Router;

use crate::state::AppState;

pub use services::{IotLogEntry, TelemetryStore};

pub fn router() -> Router<AppState> {
    handlers::routes()
}
