// Local ONNX text classification model — tokenizer + session pair.
//
// Both transformer models (sentiment and emotion) are RoBERTa-family sequence
// classifiers with the same inputs (input_ids, attention_mask) and a single
// [batch, num_labels] logits output. This type owns the shared plumbing; the
// sentiment and emotion modules only map logits to their own label sets.

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use ort::environment::Environment;
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::debug;

/// Maximum sequence length the RoBERTa models accept.
pub const MAX_TOKENS: usize = 512;

/// File names expected inside each model directory.
pub const MODEL_FILE: &str = "model.onnx";
pub const TOKENIZER_FILE: &str = "tokenizer.json";

/// Process-wide default ONNX Runtime environment (ort allows only one per process).
fn default_environment() -> Result<Environment> {
    static ENV: Mutex<Option<Environment>> = Mutex::new(None);
    let mut env = ENV.lock().unwrap_or_else(|e| e.into_inner());
    if env.is_none() {
        *env = Some(ort::init().build().context("Failed to create ONNX Runtime environment")?);
    }
    Ok(env.clone().expect("environment initialized above"))
}

/// Tokenizer and ONNX session for a sequence classification model.
pub struct OnnxTextModel {
    // ort::Session::run takes &mut self; the Arc lets spawn_blocking own a handle.
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    num_labels: usize,
}

impl OnnxTextModel {
    /// Load `model.onnx` and `tokenizer.json` from `model_dir`.
    ///
    /// The tokenizer truncates to `MAX_TOKENS`, so long inputs never overflow
    /// the model's position embeddings.
    pub fn load(model_dir: &Path, num_labels: usize) -> Result<Self> {
        let model_path = model_dir.join(MODEL_FILE);
        let tokenizer_path = model_dir.join(TOKENIZER_FILE);

        if !model_path.exists() {
            anyhow::bail!(
                "Model file not found: {}\nRun `tenor download-model` to download it.",
                model_path.display()
            );
        }
        if !tokenizer_path.exists() {
            anyhow::bail!(
                "Tokenizer file not found: {}\nRun `tenor download-model` to download it.",
                tokenizer_path.display()
            );
        }

        let session = Session::builder(&default_environment()?)
            .context("Failed to create ONNX session builder")?
            .commit_from_file(&model_path)
            .with_context(|| format!("Failed to load ONNX model from {}", model_path.display()))?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_TOKENS,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("Failed to configure tokenizer truncation: {}", e))?;

        debug!("Loaded ONNX model from {}", model_dir.display());

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            num_labels,
        })
    }

    /// Run the model on one text and return its softmaxed class probabilities.
    ///
    /// Tokenization and inference are CPU-bound, so both run on a blocking
    /// thread.
    pub async fn predict(&self, text: &str) -> Result<Vec<f64>> {
        let session = Arc::clone(&self.session);
        let tokenizer = Arc::clone(&self.tokenizer);
        let num_labels = self.num_labels;
        let text = text.to_string();

        tokio::task::spawn_blocking(move || {
            let logits = run_logits(&session, &tokenizer, &text)?;
            if logits.len() != num_labels {
                anyhow::bail!(
                    "Model returned {} logits, expected {}",
                    logits.len(),
                    num_labels
                );
            }
            Ok(softmax(&logits))
        })
        .await
        .context("spawn_blocking panicked")?
    }
}

fn run_logits(session: &Mutex<Session>, tokenizer: &Tokenizer, text: &str) -> Result<Vec<f32>> {
    let encoding = tokenizer
        .encode(text, true)
        .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

    let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
    let attention_mask: Vec<i64> = encoding
        .get_attention_mask()
        .iter()
        .map(|&m| m as i64)
        .collect();
    let shape = [1i64, input_ids.len() as i64];

    let input_ids_tensor = Tensor::from_array((shape, input_ids))
        .context("Failed to create input_ids tensor")?;
    let attention_mask_tensor = Tensor::from_array((shape, attention_mask))
        .context("Failed to create attention_mask tensor")?;

    let mut session = session
        .lock()
        .map_err(|e| anyhow::anyhow!("Session lock poisoned: {}", e))?;

    let outputs = session
        .run(ort::inputs! {
            "input_ids" => input_ids_tensor,
            "attention_mask" => attention_mask_tensor
        })
        .context("ONNX inference failed")?;

    // Output shape: [1, num_labels]
    let (_shape, data) = outputs[0]
        .try_extract_tensor::<f32>()
        .context("Failed to extract output tensor")?;

    Ok(data.to_vec())
}

/// Numerically stable softmax: subtracts the max logit before exponentiating.
pub fn softmax(logits: &[f32]) -> Vec<f64> {
    let max = logits
        .iter()
        .map(|&l| l as f64)
        .fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|&l| (l as f64 - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(&[1.0, 2.0, 3.0]);
        let sum: f64 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_softmax_preserves_order() {
        let probs = softmax(&[-1.0, 0.5, 2.0]);
        assert!(probs[0] < probs[1]);
        assert!(probs[1] < probs[2]);
    }

    #[test]
    fn test_softmax_equal_logits_uniform() {
        let probs = softmax(&[0.7, 0.7, 0.7]);
        for p in probs {
            assert!((p - 1.0 / 3.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_softmax_large_logits_stable() {
        let probs = softmax(&[1000.0, 1000.0, 990.0]);
        assert!(probs.iter().all(|p| p.is_finite()));
        assert!((probs[0] - probs[1]).abs() < 1e-12);
    }

    #[test]
    fn test_load_missing_files_errors() {
        let dir = std::env::temp_dir().join("tenor-onnx-missing-model");
        let err = match OnnxTextModel::load(&dir, 3) {
            Ok(_) => panic!("loading from an empty directory should fail"),
            Err(e) => e.to_string(),
        };
        assert!(err.contains("Model file not found"), "got: {err}");
    }
}
