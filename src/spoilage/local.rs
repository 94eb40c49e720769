//! On-device classifier: image preprocessing plus an injected model.

use std::{path::Path, sync::Arc};

use anyhow::Context;
use async_trait::async_trait;
use image::imageops::FilterType;
use serde::Deserialize;
use tracing::{info, warn};

use super::classifier::{status_for, Classification, ClassifyError, SpoilageClassifier};

pub const IMG_WIDTH: u32 = 128;
pub const IMG_HEIGHT: u32 = 128;

const FALLBACK_CLASSES: [&str; 18] = [
    "freshapples",
    "freshbanana",
    "freshbittergroud",
    "freshcapsicum",
    "freshcucumber",
    "freshokra",
    "freshoranges",
    "freshpotato",
    "freshtomato",
    "rottenapples",
    "rottenbanana",
    "rottenbittergroud",
    "rottencapsicum",
    "rottencucumber",
    "rottenokra",
    "rottenoranges",
    "rottenpatato",
    "rottentamto",
];

/// Output index to class name, in model output order.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassIndex {
    classes: Vec<String>,
}

#[derive(Deserialize)]
struct ClassesFile {
    #[serde(default)]
    classes: Vec<String>,
}

impl ClassIndex {
    pub fn new(classes: Vec<String>) -> Self {
        Self { classes }
    }

    pub fn fallback() -> Self {
        Self::new(FALLBACK_CLASSES.iter().map(|s| s.to_string()).collect())
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let file: ClassesFile = serde_json::from_str(raw).context("parse classes json")?;
        anyhow::ensure!(!file.classes.is_empty(), "classes list is empty");
        Ok(Self::new(file.classes))
    }

    /// Read `{"classes": [...]}`; a missing or broken file falls back to
    /// the built-in list.
    pub fn load(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "class list not found, using fallback");
                return Self::fallback();
            }
        };
        match Self::from_json(&raw) {
            Ok(index) => {
                info!(path = %path.display(), classes = index.len(), "class mappings loaded");
                index
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "bad class list, using fallback");
                Self::fallback()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn label(&self, idx: usize) -> Option<&str> {
        self.classes.get(idx).map(String::as_str)
    }
}

/// Inference runtime for the trained weights. Input is RGB in HWC order,
/// `IMG_HEIGHT * IMG_WIDTH * 3` floats in `[0, 1]`; output is one score per
/// class.
pub trait ImageModel: Send + Sync {
    fn predict(&self, input: &[f32]) -> anyhow::Result<Vec<f32>>;
}

pub fn preprocess(bytes: &[u8]) -> Result<Vec<f32>, ClassifyError> {
    let img = image::load_from_memory(bytes)?
        .resize_exact(IMG_WIDTH, IMG_HEIGHT, FilterType::Triangle)
        .to_rgb8();
    Ok(img.into_raw().into_iter().map(|p| p as f32 / 255.0).collect())
}

fn argmax(scores: &[f32]) -> Option<(usize, f32)> {
    scores
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, s)| s.is_finite())
        .max_by(|a, b| a.1.total_cmp(&b.1))
}

pub struct LocalModelClassifier {
    model: Arc<dyn ImageModel>,
    classes: ClassIndex,
}

impl LocalModelClassifier {
    pub fn new(model: Arc<dyn ImageModel>, classes: ClassIndex) -> Self {
        Self { model, classes }
    }

    fn interpret(&self, scores: &[f32]) -> Result<Classification, ClassifyError> {
        let (idx, score) = argmax(scores).ok_or(ClassifyError::NoScores)?;
        let label = self.classes.label(idx).unwrap_or("Unknown").to_string();
        let food = label
            .strip_prefix("fresh")
            .or_else(|| label.strip_prefix("rotten"))
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(Classification {
            food_item_name: food,
            spoilage_status: status_for(&label).to_string(),
            predicted_class: label,
            confidence: (f64::from(score) * 100.0).clamp(0.0, 100.0),
            explanation: None,
            source: self.source(),
        })
    }
}

#[async_trait]
impl SpoilageClassifier for LocalModelClassifier {
    fn source(&self) -> &'static str {
        "local"
    }

    async fn attempt(&self, image: &[u8]) -> Result<Classification, ClassifyError> {
        let bytes = image.to_vec();
        let model = Arc::clone(&self.model);
        let scores = tokio::task::spawn_blocking(move || -> Result<Vec<f32>, ClassifyError> {
            let input = preprocess(&bytes)?;
            model
                .predict(&input)
                .map_err(|e| ClassifyError::Inference(format!("{e:#}")))
        })
        .await
        .map_err(|e| ClassifyError::Inference(e.to_string()))??;

        self.interpret(&scores)
    }
}
