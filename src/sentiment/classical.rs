// Classical sentiment model: TF-IDF features + multinomial logistic regression.
//
// The model is trained offline and exported to JSON (vocabulary, idf weights,
// one coefficient row per class, intercepts). Inference is a sparse dot
// product and a softmax, cheap enough to run inline without spawn_blocking.
//
// Text goes through the same cleaning the training data did: lowercase, keep
// only ASCII letters and spaces, drop English stop words.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use stop_words::{get, LANGUAGE};
use tracing::debug;

use super::distribution::{Distribution, ModelOutput};
use super::traits::SentimentClassifier;
use crate::models::onnx::softmax;

/// Number of sentiment classes the exported model must have.
const NUM_CLASSES: usize = 3;

/// On-disk form of the exported model.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassicalModelFile {
    /// Term → feature column.
    pub vocabulary: HashMap<String, usize>,
    /// Inverse document frequency per feature column.
    pub idf: Vec<f64>,
    /// One row per class in canonical order [Negative, Neutral, Positive].
    pub coef: Vec<Vec<f64>>,
    /// One intercept per class, same order.
    pub intercept: Vec<f64>,
}

/// Loaded classical model plus the stop word list used for cleaning.
pub struct ClassicalClassifier {
    model: ClassicalModelFile,
    stop_words: HashSet<String>,
}

impl ClassicalClassifier {
    /// Load and validate an exported model file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!(
                "Classical model file not found: {}\n\
                 Export the trained TF-IDF model to this path, or use --model transformer.",
                path.display()
            );
        }
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let model: ClassicalModelFile = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse classical model {}", path.display()))?;

        debug!(
            vocabulary = model.vocabulary.len(),
            path = %path.display(),
            "Loaded classical sentiment model"
        );
        Self::from_model(model)
    }

    /// Wrap an in-memory model, checking that its shapes line up.
    pub fn from_model(model: ClassicalModelFile) -> Result<Self> {
        if model.coef.len() != NUM_CLASSES || model.intercept.len() != NUM_CLASSES {
            anyhow::bail!(
                "Classical model must have {NUM_CLASSES} classes, found {} coefficient rows and {} intercepts",
                model.coef.len(),
                model.intercept.len()
            );
        }
        let features = model.idf.len();
        if let Some(row) = model.coef.iter().find(|row| row.len() != features) {
            anyhow::bail!(
                "Coefficient row has {} entries but the model has {features} features",
                row.len()
            );
        }
        if let Some((term, col)) = model.vocabulary.iter().find(|(_, col)| **col >= features) {
            anyhow::bail!("Vocabulary term {term:?} maps to column {col}, past {features} features");
        }

        Ok(Self {
            model,
            stop_words: get(LANGUAGE::English).into_iter().collect(),
        })
    }

    /// Class probabilities in canonical order.
    pub fn predict_proba(&self, text: &str) -> Vec<f64> {
        let cleaned = clean_text(text, &self.stop_words);
        let features = self.vectorize(&cleaned);

        let logits: Vec<f32> = self
            .model
            .coef
            .iter()
            .zip(&self.model.intercept)
            .map(|(row, intercept)| {
                let dot: f64 = features.iter().map(|&(col, value)| row[col] * value).sum();
                (dot + intercept) as f32
            })
            .collect();

        softmax(&logits)
    }

    /// Sparse, L2-normalized TF-IDF vector as (column, weight) pairs.
    fn vectorize(&self, cleaned: &str) -> Vec<(usize, f64)> {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        // Single-letter tokens never make it into the vocabulary.
        for token in cleaned.split_whitespace().filter(|t| t.chars().count() >= 2) {
            if let Some(&col) = self.model.vocabulary.get(token) {
                *counts.entry(col).or_insert(0.0) += 1.0;
            }
        }

        let mut weighted: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(col, tf)| (col, tf * self.model.idf[col]))
            .collect();

        let norm = weighted.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, w) in &mut weighted {
                *w /= norm;
            }
        }
        weighted
    }
}

#[async_trait]
impl SentimentClassifier for ClassicalClassifier {
    fn name(&self) -> &'static str {
        "classical"
    }

    async fn classify(&self, text: &str) -> Result<ModelOutput> {
        if text.trim().is_empty() {
            return Ok(ModelOutput::from(Distribution::uniform()));
        }
        Ok(ModelOutput::Ordered(self.predict_proba(text)))
    }
}

/// Normalize text the way the training pipeline did.
pub fn clean_text(text: &str, stop_words: &HashSet<String>) -> String {
    let letters_only: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphabetic() || *c == ' ')
        .collect();

    letters_only
        .split_whitespace()
        .filter(|word| !stop_words.contains(*word))
        .collect::<Vec<_>>()
        .join(" ")
}
