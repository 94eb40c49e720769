//! Nutrition-label extraction and scoring.
//!
//! The engine (`extraction`, `units`, `labels`, `scoring`, `services`) is
//! pure and total; `strategies` puts optional model-backed extractors in
//! front of it.

pub mod dto;
pub mod extraction;
pub mod handlers;
pub mod labels;
pub mod record;
pub mod scoring;
pub mod services;
pub mod strategies;
pub mod units;

use axum::Router;

use crate::state::AppState;

pub use record::{Micronutrient, NutritionRecord};
pub use strategies::{ModelNutritionExtractor, NutritionChain, NutritionExtractor, PatternNutritionExtractor};

pub fn router() -> Router<AppState> {
    handlers::routes()
}
