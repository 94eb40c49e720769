use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::llm::{extract_json_object, LlmError, TextModel};

const GEMINI_PROMPT: &str = "Classify the food item in this image as fresh or spoiled. Also, identify \
the specific food item. Respond with a JSON object: {foodItemName: <name of food item>, \
predictedClass: <fresh/spoiled>, confidence: <confidence as a float between 0 and 1>}";

const OLLAMA_PROMPT: &str = "You are a food spoilage detection expert. Analyze the food item in the \
attached image and return a JSON object with keys: predictedClass, confidence (0-100), \
spoilage_status (fresh/good/warning/spoiled), foodItemName, and a short explanation. All values \
must be valid JSON types.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    #[serde(rename = "foodItemName", skip_serializing_if = "Option::is_none")]
    pub food_item_name: Option<String>,
    #[serde(rename = "predictedClass")]
    pub predicted_class: String,
    /// Percent, `0..=100`.
    pub confidence: f64,
    pub spoilage_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    pub source: &'static str,
}

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error(transparent)]
    Model(#[from] LlmError),
    #[error("model answer is missing `{0}`")]
    MissingField(&'static str),
    #[error("image could not be decoded: {0}")]
    Decode(#[from] image::ImageError),
    #[error("local model failed: {0}")]
    Inference(String),
    #[error("local model returned no scores")]
    NoScores,
    #[error("all classifiers failed: {}", .0.join("; "))]
    Exhausted(Vec<String>),
}

#[async_trait]
pub trait SpoilageClassifier: Send + Sync {
    fn source(&self) -> &'static str;

    async fn attempt(&self, image: &[u8]) -> Result<Classification, ClassifyError>;
}

/// Label-derived status used when a model does not report one.
pub fn status_for(label: &str) -> &'static str {
    let lower = label.to_lowercase();
    if lower.contains("rotten") || lower.contains("spoil") {
        "Spoiled"
    } else {
        "Fresh"
    }
}

/// How a model reports confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceScale {
    Fraction,
    Percent,
}

/// Remote or local generative model asked to judge the picture.
pub struct ModelClassifier {
    model: Arc<dyn TextModel>,
    prompt: &'static str,
    scale: ConfidenceScale,
}

impl ModelClassifier {
    pub fn gemini(model: Arc<dyn TextModel>) -> Self {
        Self {
            model,
            prompt: GEMINI_PROMPT,
            scale: ConfidenceScale::Fraction,
        }
    }

    pub fn ollama(model: Arc<dyn TextModel>) -> Self {
        Self {
            model,
            prompt: OLLAMA_PROMPT,
            scale: ConfidenceScale::Percent,
        }
    }

    fn parse(&self, answer: &Value) -> Result<Classification, ClassifyError> {
        let text = |k: &str| {
            answer
                .get(k)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let predicted_class = text("predictedClass").ok_or(ClassifyError::MissingField("predictedClass"))?;
        let raw_confidence = match answer.get("confidence") {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().trim_end_matches('%').parse::<f64>().ok(),
            _ => None,
        }
        .filter(|c| c.is_finite())
        .ok_or(ClassifyError::MissingField("confidence"))?;

        let confidence = match self.scale {
            ConfidenceScale::Fraction => raw_confidence * 100.0,
            ConfidenceScale::Percent => raw_confidence,
        }
        .clamp(0.0, 100.0);

        let spoilage_status =
            text("spoilage_status").unwrap_or_else(|| status_for(&predicted_class).to_string());

        Ok(Classification {
            food_item_name: text("foodItemName"),
            predicted_class,
            confidence,
            spoilage_status,
            explanation: text("explanation"),
            source: self.model.source(),
        })
    }
}

#[async_trait]
impl SpoilageClassifier for ModelClassifier {
    fn source(&self) -> &'static str {
        self.model.source()
    }

    async fn attempt(&self, image: &[u8]) -> Result<Classification, ClassifyError> {
        let answer = self.model.generate(self.prompt, Some(image)).await?;
        let value = extract_json_object(&answer)?;
        self.parse(&value)
    }
}

/// Ordered strategies; the first success is returned.
pub struct ClassifierChain {
    strategies: Vec<Arc<dyn SpoilageClassifier>>,
}

impl ClassifierChain {
    pub fn new(strategies: Vec<Arc<dyn SpoilageClassifier>>) -> Self {
        Self { strategies }
    }

    pub fn sources(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.source()).collect()
    }

    pub async fn classify(&self, image: &[u8]) -> Result<Classification, ClassifyError> {
        let mut failures = Vec::with_capacity(self.strategies.len());
        for strategy in &self.strategies {
            match strategy.attempt(image).await {
                Ok(c) => {
                    info!(
                        source = c.source,
                        class = %c.predicted_class,
                        confidence = c.confidence,
                        "image classified"
                    );
                    return Ok(c);
                }
                Err(e) => {
                    warn!(source = strategy.source(), error = %e, "classifier failed");
                    failures.push(format!("{}: {}", strategy.source(), e));
                }
            }
        }
        if failures.is_empty() {
            failures.push("no classifier configured".to_string());
        }
        Err(ClassifyError::Exhausted(failures))
    }
}
