// Transformer sentiment backend: twitter-roberta-base-sentiment via ONNX.
//
// The exported model keeps the generic LABEL_0/1/2 ids from its config, in
// the order negative, neutral, positive. They're mapped to canonical names
// here and handed back as a labeled mapping for the normalizer to check.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

use super::distribution::{Distribution, ModelOutput};
use super::traits::SentimentClassifier;
use crate::models::onnx::OnnxTextModel;

/// Model label ids in output order, with the names they stand for.
const LABEL_NAMES: [(&str, &str); 3] = [
    ("LABEL_0", "Negative"),
    ("LABEL_1", "Neutral"),
    ("LABEL_2", "Positive"),
];

pub struct TransformerClassifier {
    model: OnnxTextModel,
}

impl TransformerClassifier {
    /// Load the sentiment model from a directory holding `model.onnx` and
    /// `tokenizer.json`.
    pub fn load(model_dir: &Path) -> Result<Self> {
        let model = OnnxTextModel::load(model_dir, LABEL_NAMES.len())?;
        Ok(Self { model })
    }
}

/// Translate the model's raw label ids into canonical label names.
pub fn map_label_ids(raw: HashMap<String, f64>) -> HashMap<String, f64> {
    raw.into_iter()
        .map(|(id, score)| {
            let name = LABEL_NAMES
                .iter()
                .find(|(raw_id, _)| *raw_id == id)
                .map(|(_, name)| name.to_string())
                .unwrap_or(id);
            (name, score)
        })
        .collect()
}

#[async_trait]
impl SentimentClassifier for TransformerClassifier {
    fn name(&self) -> &'static str {
        "transformer"
    }

    async fn classify(&self, text: &str) -> Result<ModelOutput> {
        if text.trim().is_empty() {
            return Ok(ModelOutput::from(Distribution::uniform()));
        }

        let probs = self.model.predict(text).await?;
        let raw: HashMap<String, f64> = LABEL_NAMES
            .iter()
            .map(|(id, _)| id.to_string())
            .zip(probs)
            .collect();

        Ok(ModelOutput::Labeled(map_label_ids(raw)))
    }
}
