use serde::{Deserialize, Serialize};

use super::record::NutritionRecord;

#[derive(Debug, Default, Deserialize)]
pub struct ExtractNutritionRequest {
    #[serde(default)]
    pub text: String,
    /// When present the result also lands in the daily report log.
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExtractNutritionResponse {
    pub status: &'static str,
    pub nutrition: NutritionRecord,
    pub source: &'static str,
}
