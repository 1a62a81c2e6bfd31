// Speech-to-text for voice analysis.
//
// Audio is posted as WAV to an HTTP transcription endpoint that answers with
// {"text": "..."}. Anything that goes wrong collapses to a fixed sentinel
// transcript, which then flows through sentiment analysis like any other text.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

/// Transcript returned when the audio could not be turned into text.
pub const AUDIO_NOT_CLEAR: &str = "Audio not clear";

#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe WAV audio. Never fails; returns `AUDIO_NOT_CLEAR` instead.
    async fn transcribe(&self, wav: &[u8]) -> String;
}

/// True when the bytes start with a RIFF/WAVE header.
pub fn is_wav(bytes: &[u8]) -> bool {
    bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE"
}

#[derive(Debug, Deserialize)]
struct TranscriptResponse {
    #[serde(default)]
    text: String,
}

pub struct HttpTranscriber {
    client: reqwest::Client,
    url: String,
}

impl HttpTranscriber {
    pub fn new(url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("tenor/0.1 (comment-sentiment)")
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    async fn try_transcribe(&self, wav: &[u8]) -> Result<String> {
        if self.url.is_empty() {
            anyhow::bail!("TENOR_SPEECH_URL not set");
        }
        if !is_wav(wav) {
            anyhow::bail!("audio is not a WAV file");
        }

        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "audio/wav")
            .body(wav.to_vec())
            .send()
            .await
            .context("Speech API request failed")?;

        if !response.status().is_success() {
            anyhow::bail!("Speech API returned {}", response.status());
        }

        let transcript = response
            .json::<TranscriptResponse>()
            .await
            .context("Failed to parse speech API response")?;

        let text = transcript.text.trim().to_string();
        if text.is_empty() {
            anyhow::bail!("empty transcript");
        }
        Ok(text)
    }
}

#[async_trait]
impl Transcriber for HttpTranscriber {
    async fn transcribe(&self, wav: &[u8]) -> String {
        match self.try_transcribe(wav).await {
            Ok(text) => {
                debug!(chars = text.chars().count(), "Transcribed audio");
                text
            }
            Err(e) => {
                warn!(error = %e, "Speech recognition failed");
                AUDIO_NOT_CLEAR.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_header() -> Vec<u8> {
        let mut bytes = b"RIFF".to_vec();
        bytes.extend_from_slice(&36u32.to_le_bytes());
        bytes.extend_from_slice(b"WAVEfmt ");
        bytes
    }

    #[test]
    fn test_is_wav() {
        assert!(is_wav(&wav_header()));
        assert!(!is_wav(b"ID3\x03\x00mp3 data here"));
        assert!(!is_wav(b"RIFF"));
    }

    #[tokio::test]
    async fn test_non_wav_is_not_clear() {
        let t = HttpTranscriber::new("http://127.0.0.1:9/transcribe").unwrap();
        assert_eq!(t.transcribe(b"not audio").await, AUDIO_NOT_CLEAR);
    }

    #[tokio::test]
    async fn test_unconfigured_endpoint_is_not_clear() {
        let t = HttpTranscriber::new("").unwrap();
        assert_eq!(t.transcribe(&wav_header()).await, AUDIO_NOT_CLEAR);
    }
}
