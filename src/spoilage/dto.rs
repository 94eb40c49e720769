use serde::Serialize;

use super::classifier::Classification;

#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub status: &'static str,
    #[serde(flatten)]
    pub result: Classification,
}

impl From<Classification> for PredictionResponse {
    fn from(result: Classification) -> Self {
        Self {
            status: "success",
            result,
        }
    }
}
