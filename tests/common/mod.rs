// Stub collaborators shared by the integration tests.
//
// Nothing here touches ONNX, the network, or the filesystem.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;

use tenor::analysis::Analyzer;
use tenor::emotion::{Emotion, EmotionDetector};
use tenor::models::{ModelBackend, ModelProvider};
use tenor::sentiment::{Distribution, ModelOutput, SentimentClassifier, SentimentLabel};
use tenor::speech::Transcriber;
use tenor::youtube::CommentSource;

/// Classifier backed by a closure.
pub struct StubClassifier<F>(pub F);

#[async_trait]
impl<F> SentimentClassifier for StubClassifier<F>
where
    F: Fn(&str) -> Result<ModelOutput> + Send + Sync,
{
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn classify(&self, text: &str) -> Result<ModelOutput> {
        (self.0)(text)
    }
}

/// "great" → Positive, "bad" → Negative, anything else → Neutral.
/// Answers in the labeled shape, like the transformer backend.
pub fn keyword_output(text: &str) -> Result<ModelOutput> {
    let label = if text.contains("great") {
        SentimentLabel::Positive
    } else if text.contains("bad") {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    };
    Ok(ModelOutput::Labeled(Distribution::certain(label).to_labeled()))
}

pub fn keyword_classifier() -> Arc<dyn SentimentClassifier> {
    Arc::new(StubClassifier(keyword_output))
}

pub struct StubEmotion;

#[async_trait]
impl EmotionDetector for StubEmotion {
    async fn detect(&self, text: &str) -> Result<Emotion> {
        if text.contains("great") {
            Ok(Emotion {
                label: "joy".to_string(),
                score: 0.9,
            })
        } else {
            Ok(Emotion::neutral())
        }
    }
}

/// Hands out the same classifier for every backend and records which
/// backends were asked for.
pub struct StubModels {
    pub classifier: Arc<dyn SentimentClassifier>,
    pub requested: Mutex<Vec<ModelBackend>>,
}

impl StubModels {
    pub fn new(classifier: Arc<dyn SentimentClassifier>) -> Self {
        Self {
            classifier,
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn requested(&self) -> Vec<ModelBackend> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelProvider for StubModels {
    async fn sentiment(&self, backend: ModelBackend) -> Result<Arc<dyn SentimentClassifier>> {
        self.requested.lock().unwrap().push(backend);
        Ok(Arc::clone(&self.classifier))
    }

    async fn emotion(&self) -> Result<Arc<dyn EmotionDetector>> {
        Ok(Arc::new(StubEmotion))
    }
}

/// Fixed comment list, truncated to the requested limit.
pub struct StubComments(pub Vec<String>);

#[async_trait]
impl CommentSource for StubComments {
    async fn fetch_comments(&self, _url: &str, limit: usize) -> Vec<String> {
        self.0.iter().take(limit).cloned().collect()
    }
}

pub struct StubTranscriber(pub String);

#[async_trait]
impl Transcriber for StubTranscriber {
    async fn transcribe(&self, _wav: &[u8]) -> String {
        self.0.clone()
    }
}

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Analyzer over stubs, returning the model stub so tests can inspect it.
pub fn stub_analyzer(comments: &[&str], transcript: &str) -> (Analyzer, Arc<StubModels>) {
    let models = Arc::new(StubModels::new(keyword_classifier()));
    let analyzer = Analyzer::new(
        Arc::clone(&models) as Arc<dyn ModelProvider>,
        Arc::new(StubComments(strings(comments))),
        Arc::new(StubTranscriber(transcript.to_string())),
        100,
    );
    (analyzer, models)
}
