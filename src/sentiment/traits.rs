// Sentiment classifier trait — the seam between analysis code and model backends.
//
// Backends return raw ModelOutput; callers normalize it. Keeping normalization
// out of the trait means a malformed backend can't hide behind its own
// adapter, and the aggregator can tell "the call failed" (recoverable) apart
// from "the call returned garbage" (fatal).

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::distribution::{normalize, Classification, ModelOutput};
use crate::aggregate::filter::cap_chars;
use crate::aggregate::filter::MAX_INPUT_CHARS;

/// Trait for scoring text sentiment. Async because transformer inference is
/// offloaded to a blocking thread.
#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Classify a single text. Must return the uniform distribution for
    /// empty or whitespace-only input instead of failing.
    async fn classify(&self, text: &str) -> Result<ModelOutput>;
}

/// Classify one piece of direct input: cap it, run the backend, normalize.
///
/// Empty or whitespace-only text never reaches the backend.
pub async fn classify_text(
    classifier: &dyn SentimentClassifier,
    text: &str,
) -> Result<Classification> {
    if text.trim().is_empty() {
        return Ok(Classification::empty_input());
    }

    let output = classifier
        .classify(cap_chars(text, MAX_INPUT_CHARS))
        .await
        .with_context(|| format!("{} classifier failed", classifier.name()))?;

    let distribution = normalize(output)
        .with_context(|| format!("{} classifier returned malformed output", classifier.name()))?;

    Ok(Classification::from(distribution))
}
