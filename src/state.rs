use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    config::AppConfig,
    llm::{GeminiClient, OllamaClient, TextModel},
    nutrition::{ModelNutritionExtractor, NutritionChain, NutritionExtractor, PatternNutritionExtractor},
    reports::{scheduler::ReportContext, DisabledMailer, Mailer, NutritionLog, SmtpMailer},
    spoilage::{ClassIndex, ClassifierChain, ImageModel, LocalModelClassifier, ModelClassifier, SpoilageClassifier},
    storage::{FsImageStore, ImageStore},
    telemetry::TelemetryStore,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub images: Arc<dyn ImageStore>,
    pub nutrition: Arc<NutritionChain>,
    pub classifier: Arc<ClassifierChain>,
    pub ollama: Arc<OllamaClient>,
    pub telemetry: Arc<TelemetryStore>,
    pub nutrition_log: Arc<NutritionLog>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    /// Wire strategies in fallback order: Gemini (when a key is set),
    /// Ollama, then the local model or the regex pipeline.
    pub async fn init(config: AppConfig, local_model: Option<Arc<dyn ImageModel>>) -> anyhow::Result<Self> {
        let config = Arc::new(config);

        let images = Arc::new(FsImageStore::new(&config.upload_folder).await?) as Arc<dyn ImageStore>;
        let ollama = Arc::new(OllamaClient::new(&config.ollama_url, &config.ollama_model));
        let gemini = config.gemini_api_key.as_ref().map(|key| {
            Arc::new(GeminiClient::new(key.clone(), config.gemini_model.clone())) as Arc<dyn TextModel>
        });
        if gemini.is_none() {
            warn!("SERVER_API_KEY not set; Gemini strategies disabled");
        }

        let mut extractors: Vec<Arc<dyn NutritionExtractor>> = Vec::new();
        let mut classifiers: Vec<Arc<dyn SpoilageClassifier>> = Vec::new();
        if let Some(gemini) = &gemini {
            extractors.push(Arc::new(ModelNutritionExtractor::new(gemini.clone())));
            classifiers.push(Arc::new(ModelClassifier::gemini(gemini.clone())));
        }
        extractors.push(Arc::new(ModelNutritionExtractor::new(ollama.clone())));
        extractors.push(Arc::new(PatternNutritionExtractor));
        classifiers.push(Arc::new(ModelClassifier::ollama(ollama.clone())));
        match local_model {
            Some(model) => {
                let classes = ClassIndex::load(&config.classes_json_path);
                classifiers.push(Arc::new(LocalModelClassifier::new(model, classes)));
            }
            None => warn!("no local image model supplied; local classification disabled"),
        }

        let classifier = ClassifierChain::new(classifiers);
        info!(strategies = ?classifier.sources(), "spoilage classifiers ready");

        let mailer: Arc<dyn Mailer> = match &config.smtp {
            Some(smtp) => Arc::new(SmtpMailer::new(smtp)?),
            None => {
                warn!("SMTP not configured; email disabled");
                Arc::new(DisabledMailer)
            }
        };

        Ok(Self {
            config,
            images,
            nutrition: Arc::new(NutritionChain::new(extractors)),
            classifier: Arc::new(classifier),
            ollama,
            telemetry: Arc::new(TelemetryStore::new()),
            nutrition_log: Arc::new(NutritionLog::new()),
            mailer,
        })
    }

    pub fn report_context(&self) -> ReportContext {
        ReportContext {
            nutrition_log: self.nutrition_log.clone(),
            telemetry: self.telemetry.clone(),
            mailer: self.mailer.clone(),
        }
    }
}

#[cfg(test)]
impl AppState {
    fn fake_parts(classifier_answer: Option<&str>, mailer: Arc<dyn Mailer>) -> Self {
        use crate::{llm::testing::ScriptedModel, storage::testing::MemoryImageStore};

        let config = AppConfig::from_lookup(|key| match key {
            "OLLAMA_URL" => Some("not-a-url".to_string()),
            _ => None,
        })
        .expect("default config");

        let model = match classifier_answer {
            Some(answer) => ScriptedModel::ok("api", answer),
            None => ScriptedModel::failing("api"),
        };
        let classifier = ClassifierChain::new(vec![Arc::new(ModelClassifier::gemini(Arc::new(model)))]);

        Self {
            ollama: Arc::new(OllamaClient::new(&config.ollama_url, &config.ollama_model)),
            config: Arc::new(config),
            images: Arc::new(MemoryImageStore::default()),
            nutrition: Arc::new(NutritionChain::new(vec![Arc::new(PatternNutritionExtractor)])),
            classifier: Arc::new(classifier),
            telemetry: Arc::new(TelemetryStore::new()),
            nutrition_log: Arc::new(NutritionLog::new()),
            mailer,
        }
    }

    /// In-memory image store, regex-only nutrition, a canned "spoiled"
    /// classifier, and an Ollama client that cannot connect.
    pub fn fake() -> Self {
        Self::fake_parts(
            Some(r#"{"foodItemName": "Apple", "predictedClass": "spoiled", "confidence": 0.9}"#),
            Arc::new(DisabledMailer),
        )
    }

    pub fn fake_failing_classifier() -> Self {
        Self::fake_parts(None, Arc::new(DisabledMailer))
    }

    pub fn fake_with_mailer() -> (Self, Arc<crate::reports::mailer::testing::RecordingMailer>) {
        let mailer = Arc::new(crate::reports::mailer::testing::RecordingMailer::default());
        (Self::fake_parts(Some("{}"), mailer.clone()), mailer)
    }
}
