// Model loading — backend selection and the process-wide model registry.
//
// Models are expensive to load and read-only once loaded, so each one is
// loaded at most once per process, on first use, and shared behind an Arc.
// Analysis code asks a ModelProvider for a classifier instead of loading
// anything itself, which lets tests hand in stubs.

pub mod download;
pub mod onnx;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::info;

use crate::emotion::{EmotionDetector, OnnxEmotionDetector};
use crate::sentiment::classical::ClassicalClassifier;
use crate::sentiment::onnx::TransformerClassifier;
use crate::sentiment::SentimentClassifier;

/// Which sentiment backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelBackend {
    /// TF-IDF + logistic regression, exported to JSON. Fast, no ONNX runtime.
    Classical,
    /// RoBERTa sentiment model via ONNX (default).
    #[default]
    Transformer,
}

impl fmt::Display for ModelBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelBackend::Classical => f.write_str("classical"),
            ModelBackend::Transformer => f.write_str("transformer"),
        }
    }
}

impl FromStr for ModelBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "classical" | "tfidf" | "tf-idf" => Ok(ModelBackend::Classical),
            "transformer" | "bert" | "roberta" => Ok(ModelBackend::Transformer),
            other => anyhow::bail!("unknown model backend {other:?} (expected classical or transformer)"),
        }
    }
}

/// Source of loaded models, injected into the analysis layer.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Sentiment classifier for the given backend.
    async fn sentiment(&self, backend: ModelBackend) -> Result<Arc<dyn SentimentClassifier>>;

    /// Emotion detector.
    async fn emotion(&self) -> Result<Arc<dyn EmotionDetector>>;
}

/// Lazily loads each model from `model_dir` the first time it's asked for.
pub struct ModelRegistry {
    model_dir: PathBuf,
    classical: OnceCell<Arc<ClassicalClassifier>>,
    transformer: OnceCell<Arc<TransformerClassifier>>,
    emotion: OnceCell<Arc<OnnxEmotionDetector>>,
}

impl ModelRegistry {
    pub fn new(model_dir: PathBuf) -> Self {
        Self {
            model_dir,
            classical: OnceCell::new(),
            transformer: OnceCell::new(),
            emotion: OnceCell::new(),
        }
    }
}

#[async_trait]
impl ModelProvider for ModelRegistry {
    async fn sentiment(&self, backend: ModelBackend) -> Result<Arc<dyn SentimentClassifier>> {
        match backend {
            ModelBackend::Classical => {
                let model = self
                    .classical
                    .get_or_try_init(|| async {
                        let path = download::classical_model_path(&self.model_dir);
                        info!(path = %path.display(), "Loading classical sentiment model");
                        ClassicalClassifier::load(&path).map(Arc::new)
                    })
                    .await?;
                Ok(model.clone())
            }
            ModelBackend::Transformer => {
                let model = self
                    .transformer
                    .get_or_try_init(|| async {
                        let dir = download::sentiment_model_dir(&self.model_dir);
                        info!(path = %dir.display(), "Loading transformer sentiment model");
                        TransformerClassifier::load(&dir).map(Arc::new)
                    })
                    .await?;
                Ok(model.clone())
            }
        }
    }

    async fn emotion(&self) -> Result<Arc<dyn EmotionDetector>> {
        let model = self
            .emotion
            .get_or_try_init(|| async {
                let dir = download::emotion_model_dir(&self.model_dir);
                info!(path = %dir.display(), "Loading emotion model");
                OnnxEmotionDetector::load(&dir).map(Arc::new)
            })
            .await?;
        Ok(model.clone())
    }
}
