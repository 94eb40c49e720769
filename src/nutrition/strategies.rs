use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use super::{record::NutritionRecord, services};
use crate::llm::{extract_json_object, LlmError, TextModel};

const NUTRITION_PROMPT: &str = r#"Analyze this nutrition label text and extract ALL nutrition values present in the label. Return only a JSON object in this format:
{
    "calories": number,
    "fat": number, "saturated_fat": number, "trans_fat": number,
    "cholesterol": number (mg), "sodium": number (mg),
    "carbs": number, "fiber": number, "sugar": number, "protein": number,
    "serving_size": string,
    "ingredients": string[],
    "additional_nutrients": { "nutrient_name": { "value": number, "unit": string } }
}
Use grams unless noted. Include every vitamin and mineral listed.
Text to analyze: "#;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Model(#[from] LlmError),
    #[error("model answer is not a nutrition object")]
    Shape,
}

#[async_trait]
pub trait NutritionExtractor: Send + Sync {
    fn source(&self) -> &'static str;

    async fn attempt(&self, text: &str) -> Result<NutritionRecord, ExtractError>;
}

/// Regex pipeline; always succeeds, so it closes the chain.
pub struct PatternNutritionExtractor;

#[async_trait]
impl NutritionExtractor for PatternNutritionExtractor {
    fn source(&self) -> &'static str {
        "local"
    }

    async fn attempt(&self, text: &str) -> Result<NutritionRecord, ExtractError> {
        Ok(services::extract_full_nutrition(text))
    }
}

/// Asks a generative model for JSON and coerces it into a record.
pub struct ModelNutritionExtractor {
    model: Arc<dyn TextModel>,
}

impl ModelNutritionExtractor {
    pub fn new(model: Arc<dyn TextModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl NutritionExtractor for ModelNutritionExtractor {
    fn source(&self) -> &'static str {
        self.model.source()
    }

    async fn attempt(&self, text: &str) -> Result<NutritionRecord, ExtractError> {
        let prompt = format!("{NUTRITION_PROMPT}{text}");
        let answer = self.model.generate(&prompt, None).await?;
        let value = extract_json_object(&answer)?;
        services::record_from_json(&value).ok_or(ExtractError::Shape)
    }
}

/// Ordered strategies, tried until one succeeds.
pub struct NutritionChain {
    strategies: Vec<Arc<dyn NutritionExtractor>>,
}

impl NutritionChain {
    pub fn new(strategies: Vec<Arc<dyn NutritionExtractor>>) -> Self {
        Self { strategies }
    }

    /// Falls through to the regex pipeline if every strategy fails, so a
    /// record is always produced.
    pub async fn run(&self, text: &str) -> (NutritionRecord, &'static str) {
        for strategy in &self.strategies {
            match strategy.attempt(text).await {
                Ok(record) => {
                    info!(source = strategy.source(), "nutrition extracted");
                    return (record, strategy.source());
                }
                Err(e) => {
                    warn!(source = strategy.source(), error = %e, "nutrition strategy failed");
                }
            }
        }
        let fallback = PatternNutritionExtractor;
        (services::extract_full_nutrition(text), fallback.source())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedModel;

    #[tokio::test]
    async fn first_successful_model_wins() {
        let gemini = Arc::new(ScriptedModel::ok("api", r#"{"calories": 120, "protein": 30}"#));
        let chain = NutritionChain::new(vec![
            Arc::new(ModelNutritionExtractor::new(gemini.clone())),
            Arc::new(PatternNutritionExtractor),
        ]);
        let (rec, source) = chain.run("Calories 999").await;
        assert_eq!(source, "api");
        assert_eq!(rec.calories, 120.0);
        assert_eq!(rec.benefits, vec!["High in protein"]);

        let prompts = gemini.prompts.lock().unwrap();
        assert!(prompts[0].0.ends_with("Calories 999"));
        assert!(!prompts[0].1);
    }

    #[tokio::test]
    async fn failures_fall_back_in_order() {
        let chain = NutritionChain::new(vec![
            Arc::new(ModelNutritionExtractor::new(Arc::new(ScriptedModel::failing("api")))),
            Arc::new(ModelNutritionExtractor::new(Arc::new(ScriptedModel::ok(
                "ollama",
                "I cannot read that label.",
            )))),
            Arc::new(PatternNutritionExtractor),
        ]);
        let (rec, source) = chain.run("Calories 80 Protein 2g").await;
        assert_eq!(source, "local");
        assert_eq!(rec.calories, 80.0);
        assert_eq!(rec.protein, 2.0);
    }

    #[tokio::test]
    async fn non_object_answer_is_rejected() {
        let model = Arc::new(ScriptedModel::ok("ollama", "{\"a\": 1} and {\"b\": 2}"));
        let err = ModelNutritionExtractor::new(model).attempt("x").await.unwrap_err();
        assert!(matches!(err, ExtractError::Model(LlmError::Json(_))));
    }

    #[tokio::test]
    async fn empty_chain_still_extracts() {
        let (rec, source) = NutritionChain::new(vec![]).run("Sodium 100mg").await;
        assert_eq!(source, "local");
        assert_eq!(rec.sodium, 100.0);
        assert_eq!(rec.benefits, vec!["Low in sodium"]);
    }
}
