// Comment sentiment aggregation — the video-level reduction over comments.
//
// Both modes share one scan loop: walk the fetched comments in order, drop
// the invalid ones, cap the rest to MAX_INPUT_CHARS, classify one at a time,
// and report progress after every comment. The modes differ only in what
// they do with each classification:
//
//   continuous — running mean of the full probability distributions
//   discrete   — count of comments per argmax label
//
// A failed classifier call skips that comment. Malformed classifier output
// (wrong label set, wrong vector length) aborts the whole run.

pub mod continuous;
pub mod discrete;
pub mod filter;
pub mod progress;

pub use continuous::{aggregate_continuous, ContinuousReport};
pub use discrete::{aggregate_discrete, DiscreteReport, LabelCounts};
pub use filter::{cap_chars, is_valid_comment, MAX_INPUT_CHARS, MIN_COMMENT_CHARS};
pub use progress::{no_progress, CancelFlag, ScanProgress};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::output::truncate_chars;
use crate::sentiment::{normalize, Classification, SentimentClassifier};

/// What an aggregation run found, for callers choosing what to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The comment source returned nothing.
    NoComments,
    /// Comments were fetched but none was long enough (or none got classified
    /// before cancellation).
    NoValidComments,
    /// At least one comment was classified.
    Analyzed,
}

/// Counters shared by both aggregation modes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanTally {
    /// Comments fetched, before filtering.
    pub fetched: usize,
    /// Comments that passed the validity filter.
    pub valid: usize,
    /// Valid comments classified successfully.
    pub analyzed: usize,
    /// Valid comments whose classifier call failed.
    pub failed: usize,
    /// True when the run stopped early on a cancel request.
    pub cancelled: bool,
}

impl ScanTally {
    pub fn outcome(&self) -> Outcome {
        if self.fetched == 0 {
            Outcome::NoComments
        } else if self.analyzed == 0 {
            Outcome::NoValidComments
        } else {
            Outcome::Analyzed
        }
    }
}

/// Drive one aggregation run. Calls `on_result` with each successful
/// classification, in input order.
pub(crate) async fn scan_comments<F>(
    comments: &[String],
    classifier: &dyn SentimentClassifier,
    progress: &mut (dyn FnMut(ScanProgress) + Send),
    cancel: Option<&CancelFlag>,
    mut on_result: F,
) -> Result<ScanTally>
where
    F: FnMut(Classification) + Send,
{
    let total = comments.len();
    let mut tally = ScanTally {
        fetched: total,
        ..ScanTally::default()
    };
    let mut last_error = None;

    for (i, comment) in comments.iter().enumerate() {
        if cancel.is_some_and(CancelFlag::is_cancelled) {
            info!(scanned = i, total, "Aggregation cancelled");
            tally.cancelled = true;
            break;
        }

        if is_valid_comment(comment) {
            tally.valid += 1;
            let text = cap_chars(comment, MAX_INPUT_CHARS);

            match classifier.classify(text).await {
                Ok(output) => {
                    let distribution = normalize(output).with_context(|| {
                        format!(
                            "{} classifier returned malformed output for comment {}",
                            classifier.name(),
                            i + 1
                        )
                    })?;
                    let classification = Classification::from(distribution);
                    debug!(
                        index = i,
                        label = %classification.label,
                        text_preview = %truncate_chars(text, 50),
                        "Classified comment"
                    );
                    on_result(classification);
                    tally.analyzed += 1;
                }
                Err(e) => {
                    warn!(index = i, error = %e, "Failed to classify comment, skipping");
                    tally.failed += 1;
                    last_error = Some(e);
                }
            }
        }

        progress(ScanProgress {
            scanned: i + 1,
            total,
        });
    }

    if tally.analyzed == 0 {
        if let Some(e) = last_error {
            return Err(e.context(format!(
                "all {} valid comments failed to classify",
                tally.failed
            )));
        }
    }

    Ok(tally)
}
