// Analysis operations — what the CLI and the web API actually run.
//
// An Analyzer owns its collaborators as trait objects (models, comment
// source, transcriber), so tests drive the full operations with stubs and
// never touch ONNX or the network.

use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::aggregate::{
    aggregate_continuous, aggregate_discrete, CancelFlag, ContinuousReport, DiscreteReport,
    Outcome, ScanProgress, ScanTally,
};
use crate::emotion::Emotion;
use crate::models::{ModelBackend, ModelProvider};
use crate::sentiment::{classify_text, Classification};
use crate::speech::Transcriber;
use crate::youtube::{is_youtube_url, CommentSource};

/// Name of the column bulk scoring reads from.
pub const TEXT_COLUMN: &str = "text";

/// Validation problems with direct text input. Reported to the user as a
/// warning, not as a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextInputError {
    Empty,
}

impl fmt::Display for TextInputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextInputError::Empty => f.write_str("Please enter some text"),
        }
    }
}

impl std::error::Error for TextInputError {}

/// Bulk scoring input without a `text` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingTextColumn;

impl fmt::Display for MissingTextColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CSV must contain a '{TEXT_COLUMN}' column")
    }
}

impl std::error::Error for MissingTextColumn {}

/// Bulk scoring input with a row wider than its header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RaggedRow {
    /// 1-based line in the input.
    pub line: u64,
    pub expected: usize,
    pub found: usize,
}

impl fmt::Display for RaggedRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Expected {} fields in line {}, saw {}",
            self.expected, self.line, self.found
        )
    }
}

impl std::error::Error for RaggedRow {}

/// How comment classifications are reduced to one video-level answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationMode {
    /// Mean probability distribution (continuous).
    Average,
    /// Comments per predicted label (discrete).
    #[default]
    Count,
}

impl fmt::Display for AggregationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregationMode::Average => f.write_str("average"),
            AggregationMode::Count => f.write_str("count"),
        }
    }
}

impl FromStr for AggregationMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "average" | "mean" | "continuous" => Ok(AggregationMode::Average),
            "count" | "discrete" => Ok(AggregationMode::Count),
            other => anyhow::bail!("unknown aggregation mode {other:?} (expected average or count)"),
        }
    }
}

/// Aggregated sentiment for one video.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum VideoReport {
    Average(ContinuousReport),
    Count(DiscreteReport),
}

impl VideoReport {
    pub fn outcome(&self) -> Outcome {
        match self {
            VideoReport::Average(report) => report.outcome(),
            VideoReport::Count(report) => report.outcome(),
        }
    }

    pub fn tally(&self) -> &ScanTally {
        match self {
            VideoReport::Average(report) => &report.tally,
            VideoReport::Count(report) => &report.tally,
        }
    }

    pub fn mode(&self) -> AggregationMode {
        match self {
            VideoReport::Average(_) => AggregationMode::Average,
            VideoReport::Count(_) => AggregationMode::Count,
        }
    }
}

/// Result of analyzing a piece of direct text input.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TextAnalysis {
    /// Plain text: one classification and its dominant emotion.
    Single {
        classification: Classification,
        emotion: Emotion,
    },
    /// The text was a YouTube link; its comments were averaged instead.
    Video { report: VideoReport },
}

#[derive(Debug, Clone, Serialize)]
pub struct VoiceAnalysis {
    pub transcript: String,
    pub classification: Classification,
    pub emotion: Emotion,
}

/// An uploaded CSV with `Sentiment` and `Emotion` columns appended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ScoredTable {
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut out = csv::Writer::from_writer(writer);
        out.write_record(&self.headers)?;
        for row in &self.rows {
            out.write_record(row)?;
        }
        out.flush().context("Failed to write CSV")?;
        Ok(())
    }

    /// Rows as header → value objects.
    pub fn to_json_rows(&self) -> Vec<serde_json::Map<String, serde_json::Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.headers
                    .iter()
                    .zip(row)
                    .map(|(h, v)| (h.clone(), serde_json::Value::String(v.clone())))
                    .collect()
            })
            .collect()
    }
}

pub struct Analyzer {
    models: Arc<dyn ModelProvider>,
    comments: Arc<dyn CommentSource>,
    transcriber: Arc<dyn Transcriber>,
    comment_limit: usize,
}

impl Analyzer {
    pub fn new(
        models: Arc<dyn ModelProvider>,
        comments: Arc<dyn CommentSource>,
        transcriber: Arc<dyn Transcriber>,
        comment_limit: usize,
    ) -> Self {
        Self {
            models,
            comments,
            transcriber,
            comment_limit,
        }
    }

    pub fn comment_limit(&self) -> usize {
        self.comment_limit
    }

    /// Analyze direct text input. A YouTube link is treated as a request to
    /// average the sentiment of that video's comments.
    ///
    /// Empty input fails with a `TextInputError` the caller can downcast to.
    pub async fn analyze_text(
        &self,
        text: &str,
        backend: ModelBackend,
        progress: &mut (dyn FnMut(ScanProgress) + Send),
    ) -> Result<TextAnalysis> {
        if text.trim().is_empty() {
            return Err(TextInputError::Empty.into());
        }

        if is_youtube_url(text) {
            let report = self
                .analyze_video(
                    text.trim(),
                    AggregationMode::Average,
                    backend,
                    self.comment_limit,
                    progress,
                    None,
                )
                .await?;
            return Ok(TextAnalysis::Video { report });
        }

        let classifier = self.models.sentiment(backend).await?;
        let classification = classify_text(classifier.as_ref(), text).await?;
        let emotion = self
            .models
            .emotion()
            .await?
            .detect(text)
            .await
            .context("Emotion detection failed")?;

        debug!(backend = %backend, label = %classification.label, "Analyzed text");
        Ok(TextAnalysis::Single {
            classification,
            emotion,
        })
    }

    /// Fetch a video's comments and aggregate them.
    pub async fn analyze_video(
        &self,
        url: &str,
        mode: AggregationMode,
        backend: ModelBackend,
        limit: usize,
        progress: &mut (dyn FnMut(ScanProgress) + Send),
        cancel: Option<&CancelFlag>,
    ) -> Result<VideoReport> {
        let classifier = self.models.sentiment(backend).await?;
        let comments = self.comments.fetch_comments(url, limit).await;
        info!(url, fetched = comments.len(), mode = %mode, backend = %backend, "Aggregating comments");

        let report = match mode {
            AggregationMode::Average => VideoReport::Average(
                aggregate_continuous(&comments, classifier.as_ref(), progress, cancel).await?,
            ),
            AggregationMode::Count => VideoReport::Count(
                aggregate_discrete(&comments, classifier.as_ref(), progress, cancel).await?,
            ),
        };
        Ok(report)
    }

    /// Label counts for a video's comments, always with the transformer model.
    pub async fn analyze_youtube(
        &self,
        url: &str,
        progress: &mut (dyn FnMut(ScanProgress) + Send),
        cancel: Option<&CancelFlag>,
    ) -> Result<DiscreteReport> {
        let classifier = self.models.sentiment(ModelBackend::Transformer).await?;
        let comments = self.comments.fetch_comments(url, self.comment_limit).await;
        aggregate_discrete(&comments, classifier.as_ref(), progress, cancel).await
    }

    /// Transcribe WAV audio, then classify and detect emotion in the transcript.
    pub async fn analyze_voice(&self, wav: &[u8]) -> Result<VoiceAnalysis> {
        let transcript = self.transcriber.transcribe(wav).await;

        let classifier = self.models.sentiment(ModelBackend::Transformer).await?;
        let classification = classify_text(classifier.as_ref(), &transcript).await?;
        let emotion = self
            .models
            .emotion()
            .await?
            .detect(&transcript)
            .await
            .context("Emotion detection failed")?;

        Ok(VoiceAnalysis {
            transcript,
            classification,
            emotion,
        })
    }

    /// Score every row of a CSV with a `text` column.
    ///
    /// The original columns and row order are kept; `Sentiment` and `Emotion`
    /// are appended. Short rows are padded with empty fields; a row with more
    /// fields than the header is rejected with [`RaggedRow`].
    pub async fn analyze_csv<R: Read + Send>(&self, reader: R) -> Result<ScoredTable> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);

        let mut headers: Vec<String> = csv_reader
            .headers()
            .context("Failed to read CSV header")?
            .iter()
            .map(str::to_string)
            .collect();
        let Some(text_idx) = headers.iter().position(|h| h.trim() == TEXT_COLUMN) else {
            return Err(MissingTextColumn.into());
        };

        let records = csv_reader
            .records()
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to parse CSV")?;

        let width = headers.len();
        if let Some((i, record)) = records
            .iter()
            .enumerate()
            .find(|(_, record)| record.len() > width)
        {
            return Err(RaggedRow {
                // Header is line 1
                line: record.position().map_or(i as u64 + 2, |p| p.line()),
                expected: width,
                found: record.len(),
            }
            .into());
        }

        let classifier = self.models.sentiment(ModelBackend::Transformer).await?;
        let detector = self.models.emotion().await?;

        let mut rows = Vec::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            let text = record.get(text_idx).unwrap_or("");
            let classification = classify_text(classifier.as_ref(), text)
                .await
                .with_context(|| format!("Failed to classify row {}", i + 1))?;
            let emotion = detector
                .detect(text)
                .await
                .with_context(|| format!("Failed to detect emotion for row {}", i + 1))?;

            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            row.resize(width, String::new());
            row.push(classification.label.to_string());
            row.push(emotion.label);
            rows.push(row);
        }

        headers.push("Sentiment".to_string());
        headers.push("Emotion".to_string());
        info!(rows = rows.len(), "Scored CSV");
        Ok(ScoredTable { headers, rows })
    }
}
