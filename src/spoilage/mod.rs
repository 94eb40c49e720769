//! Freshness classification of ESP32 camera frames.

pub mod classifier;
pub mod dto;
pub mod handlers;
pub mod local;

use axum::Router;

use crate::state::AppState;

pub use classifier::{Classification, ClassifierChain, ClassifyError, ModelClassifier, SpoilageClassifier};
pub use local::{ClassIndex, ImageModel, LocalModelClassifier};

pub fn router() -> Router<AppState> {
    handlers::routes()
}
