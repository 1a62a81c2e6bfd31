use std::env;
use std::path::PathBuf;

use anyhow::Result;

use crate::models::ModelBackend;

/// Comments fetched per video when TENOR_COMMENT_LIMIT is unset.
pub const DEFAULT_COMMENT_LIMIT: usize = 100;

/// Central configuration loaded from environment variables.
///
/// All secrets come from env vars (never hardcoded). The .env file
/// is loaded automatically at startup via dotenvy.
pub struct Config {
    pub db_path: String,
    /// Directory holding the classical model file and the ONNX model subdirectories
    pub model_dir: PathBuf,
    /// Sentiment backend used when a request doesn't pick one
    pub default_backend: ModelBackend,
    pub youtube_api_key: String,
    /// Maximum comments fetched per video
    pub comment_limit: usize,
    /// Speech-to-text endpoint for voice analysis
    pub speech_url: String,
    /// Secret for HMAC session token signing (TENOR_SESSION_SECRET env var)
    #[cfg(feature = "web")]
    pub session_secret: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Everything has a default or is optional here; commands call the
    /// `require_*` methods for the settings they actually need.
    pub fn load() -> Result<Self> {
        let default_backend = match env::var("TENOR_MODEL") {
            Ok(value) if !value.trim().is_empty() => value.parse()?,
            _ => ModelBackend::default(),
        };

        let comment_limit = match env::var("TENOR_COMMENT_LIMIT") {
            Ok(value) => parse_comment_limit(&value)?,
            Err(_) => DEFAULT_COMMENT_LIMIT,
        };

        let model_dir = env::var("TENOR_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| crate::models::download::default_model_dir());

        Ok(Self {
            db_path: env::var("TENOR_DB_PATH").unwrap_or_else(|_| "./tenor.db".to_string()),
            model_dir,
            default_backend,
            youtube_api_key: env::var("YOUTUBE_API_KEY").unwrap_or_default(),
            comment_limit,
            speech_url: env::var("TENOR_SPEECH_URL").unwrap_or_default(),
            #[cfg(feature = "web")]
            session_secret: env::var("TENOR_SESSION_SECRET").unwrap_or_default(),
        })
    }

    /// Check that the YouTube API key is configured.
    pub fn require_youtube(&self) -> Result<()> {
        if self.youtube_api_key.is_empty() {
            anyhow::bail!(
                "YOUTUBE_API_KEY not set. Add it to your .env file.\n\
                 See .env.example for the required variables."
            );
        }
        Ok(())
    }

    /// Check that a speech-to-text endpoint is configured.
    pub fn require_speech(&self) -> Result<()> {
        if self.speech_url.is_empty() {
            anyhow::bail!(
                "TENOR_SPEECH_URL not set. Point it at a speech-to-text endpoint\n\
                 that accepts WAV audio and returns {{\"text\": \"...\"}}."
            );
        }
        Ok(())
    }

    /// Validate that the chosen backend's model files are on disk.
    pub fn require_model(&self, backend: ModelBackend) -> Result<()> {
        use crate::models::download;

        match backend {
            ModelBackend::Classical => {
                let path = download::classical_model_path(&self.model_dir);
                if !path.exists() {
                    anyhow::bail!(
                        "Classical model not found at {}\n\
                         Export a trained TF-IDF model there, or use --model transformer.",
                        path.display()
                    );
                }
            }
            ModelBackend::Transformer => {
                if !download::sentiment_files_present(&self.model_dir) {
                    anyhow::bail!(
                        "Transformer model files not found in {}\n\
                         Run `tenor download-model` to download them.",
                        self.model_dir.display()
                    );
                }
            }
        }
        Ok(())
    }

    /// Check that the emotion model's files are on disk.
    pub fn require_emotion_model(&self) -> Result<()> {
        if !crate::models::download::emotion_files_present(&self.model_dir) {
            anyhow::bail!(
                "Emotion model files not found in {}\n\
                 Run `tenor download-model` to download them.",
                self.model_dir.display()
            );
        }
        Ok(())
    }

    /// Check that a session secret is set and long enough to sign cookies.
    #[cfg(feature = "web")]
    pub fn require_session_secret(&self) -> Result<()> {
        if self.session_secret.len() < 32 {
            anyhow::bail!(
                "TENOR_SESSION_SECRET must be set to at least 32 characters.\n\
                 Generate one with: openssl rand -hex 32"
            );
        }
        Ok(())
    }
}

fn parse_comment_limit(value: &str) -> Result<usize> {
    value
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|&limit| limit > 0)
        .ok_or_else(|| {
            anyhow::anyhow!("TENOR_COMMENT_LIMIT must be a positive integer, got {value:?}")
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_limit_must_be_positive() {
        assert_eq!(parse_comment_limit("25").unwrap(), 25);
        assert_eq!(parse_comment_limit(" 100\n").unwrap(), 100);
        assert!(parse_comment_limit("0").is_err());
        assert!(parse_comment_limit("-3").is_err());
        assert!(parse_comment_limit("lots").is_err());
    }
}
