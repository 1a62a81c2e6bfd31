// Emotion detection — the dominant emotion in a piece of text.
//
// Backed by emotion-english-distilroberta-base through ONNX. The model has
// seven classes; callers only ever see the top one and its probability.

use std::fmt;
use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use crate::models::onnx::OnnxTextModel;

/// Emotion classes in the model's output order.
pub const EMOTION_LABELS: [&str; 7] = [
    "anger", "disgust", "fear", "joy", "neutral", "sadness", "surprise",
];

/// The strongest emotion found in a text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Emotion {
    pub label: String,
    pub score: f64,
}

impl Emotion {
    /// Label reported for text with nothing to detect.
    pub fn neutral() -> Self {
        Self {
            label: "neutral".to_string(),
            score: 1.0,
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.2})", self.label, self.score)
    }
}

#[async_trait]
pub trait EmotionDetector: Send + Sync {
    async fn detect(&self, text: &str) -> Result<Emotion>;
}

/// Pick the highest-probability label. Ties go to the earlier label.
pub fn top_emotion(probs: &[f64]) -> Result<Emotion> {
    if probs.len() != EMOTION_LABELS.len() {
        anyhow::bail!(
            "emotion model returned {} scores, expected {}",
            probs.len(),
            EMOTION_LABELS.len()
        );
    }

    let mut best = 0;
    for (i, &p) in probs.iter().enumerate() {
        if p > probs[best] {
            best = i;
        }
    }

    Ok(Emotion {
        label: EMOTION_LABELS[best].to_string(),
        score: probs[best],
    })
}

pub struct OnnxEmotionDetector {
    model: OnnxTextModel,
}

impl OnnxEmotionDetector {
    pub fn load(model_dir: &Path) -> Result<Self> {
        let model = OnnxTextModel::load(model_dir, EMOTION_LABELS.len())?;
        Ok(Self { model })
    }
}

#[async_trait]
impl EmotionDetector for OnnxEmotionDetector {
    async fn detect(&self, text: &str) -> Result<Emotion> {
        if text.trim().is_empty() {
            return Ok(Emotion::neutral());
        }
        let probs = self.model.predict(text).await?;
        top_emotion(&probs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_emotion_picks_max() {
        let emotion = top_emotion(&[0.05, 0.05, 0.05, 0.6, 0.1, 0.1, 0.05]).unwrap();
        assert_eq!(emotion.label, "joy");
        assert!((emotion.score - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_top_emotion_tie_prefers_first() {
        let emotion = top_emotion(&[0.3, 0.3, 0.1, 0.1, 0.1, 0.05, 0.05]).unwrap();
        assert_eq!(emotion.label, "anger");
    }

    #[test]
    fn test_top_emotion_wrong_length() {
        assert!(top_emotion(&[0.5, 0.5]).is_err());
    }

    #[test]
    fn test_display() {
        let e = Emotion {
            label: "sadness".to_string(),
            score: 0.8765,
        };
        assert_eq!(e.to_string(), "sadness (0.88)");
    }
}
