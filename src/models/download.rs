// Fetches the transformer ONNX exports from HuggingFace.
//
// Two models, each a tokenizer.json plus model.onnx:
//   sentiment  twitter-roberta-base-sentiment (~500 MB, 3 classes)
//   emotion    emotion-english-distilroberta-base (~330 MB, 7 classes)
//
// They land in the platform data directory (~/.local/share/tenor/models/ on
// Linux). The classical model is trained offline and copied in by hand.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use super::onnx::{MODEL_FILE, TOKENIZER_FILE};

/// HuggingFace repo with the ONNX export of the sentiment model.
const SENTIMENT_HF_URL: &str =
    "https://huggingface.co/Xenova/twitter-roberta-base-sentiment/resolve/main";

/// HuggingFace repo with the ONNX export of the emotion model.
const EMOTION_HF_URL: &str =
    "https://huggingface.co/Xenova/emotion-english-distilroberta-base/resolve/main";

/// Path of the ONNX graph inside the HuggingFace repos.
const HF_MODEL_PATH: &str = "onnx/model.onnx";

/// File name of the exported classical (TF-IDF + logistic regression) model.
pub const CLASSICAL_MODEL_FILE: &str = "classical_model.json";

/// Returns the default directory for storing model files.
/// Uses the platform data directory: ~/.local/share/tenor/models/ on Linux.
pub fn default_model_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tenor")
        .join("models")
}

/// Subdirectory holding the sentiment transformer.
pub fn sentiment_model_dir(base: &Path) -> PathBuf {
    base.join("sentiment")
}

/// Subdirectory holding the emotion transformer.
pub fn emotion_model_dir(base: &Path) -> PathBuf {
    base.join("emotion")
}

/// Location of the classical model file.
pub fn classical_model_path(base: &Path) -> PathBuf {
    base.join(CLASSICAL_MODEL_FILE)
}

fn onnx_files_present(dir: &Path) -> bool {
    dir.join(MODEL_FILE).exists() && dir.join(TOKENIZER_FILE).exists()
}

/// Check whether the sentiment transformer files exist.
pub fn sentiment_files_present(base: &Path) -> bool {
    onnx_files_present(&sentiment_model_dir(base))
}

/// Check whether the emotion transformer files exist.
pub fn emotion_files_present(base: &Path) -> bool {
    onnx_files_present(&emotion_model_dir(base))
}

/// Fetch the sentiment and emotion transformers into `dir`, skipping files
/// that are already there.
pub async fn download_models(dir: &Path) -> Result<()> {
    println!("\nSentiment model (twitter-roberta-base-sentiment):");
    download_onnx_model(SENTIMENT_HF_URL, &sentiment_model_dir(dir), "~500 MB").await?;

    println!("\nEmotion model (emotion-english-distilroberta-base):");
    download_onnx_model(EMOTION_HF_URL, &emotion_model_dir(dir), "~330 MB").await?;

    Ok(())
}

async fn download_onnx_model(base_url: &str, dest_dir: &Path, size_hint: &str) -> Result<()> {
    std::fs::create_dir_all(dest_dir)
        .with_context(|| format!("Failed to create model directory: {}", dest_dir.display()))?;

    // (path in the HuggingFace repo, local file name, large enough for a bar)
    let files = [
        (TOKENIZER_FILE, TOKENIZER_FILE, false),
        (HF_MODEL_PATH, MODEL_FILE, true),
    ];

    for (remote, local, large) in files {
        let dest = dest_dir.join(local);
        if dest.exists() {
            info!(path = %dest.display(), "Already downloaded, skipping");
            println!("  {local} (already exists)");
            continue;
        }

        if large {
            println!("  Downloading {local} ({size_hint})...");
        } else {
            println!("  Downloading {local}...");
        }
        download_file(&format!("{base_url}/{remote}"), &dest, large).await?;
    }

    Ok(())
}

/// Stream `url` into `dest`, optionally with a byte progress bar.
async fn download_file(url: &str, dest: &Path, show_progress: bool) -> Result<()> {
    let client = reqwest::Client::new();
    let mut response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to download {url}"))?;

    if !response.status().is_success() {
        anyhow::bail!("Download failed with status {}: {}", response.status(), url);
    }

    let pb = if show_progress {
        Some(download_progress_bar(response.content_length())?)
    } else {
        None
    };

    // Write to a temporary name so an interrupted download never looks complete
    let partial = dest.with_extension("part");
    let mut bytes = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .context("Failed to read response body")?
    {
        bytes.extend_from_slice(&chunk);
        if let Some(ref pb) = pb {
            pb.set_position(bytes.len() as u64);
        }
    }

    std::fs::write(&partial, &bytes)
        .with_context(|| format!("Failed to write {}", partial.display()))?;
    std::fs::rename(&partial, dest)
        .with_context(|| format!("Failed to move download into {}", dest.display()))?;

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    info!(url, path = %dest.display(), "Downloaded");
    Ok(())
}

fn download_progress_bar(total_size: Option<u64>) -> Result<ProgressBar> {
    let pb = match total_size {
        Some(size) => {
            let pb = ProgressBar::new(size);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("    [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")?
                    .progress_chars("=> "),
            );
            pb
        }
        None => {
            let pb = ProgressBar::new_spinner();
            pb.set_style(ProgressStyle::default_spinner().template("    {spinner} {bytes}")?);
            pb
        }
    };
    Ok(pb)
}
