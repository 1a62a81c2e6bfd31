// Discrete mode: number of comments per predicted label.

use anyhow::Result;
use serde::Serialize;

use super::{scan_comments, CancelFlag, Outcome, ScanProgress, ScanTally};
use crate::sentiment::{SentimentClassifier, SentimentLabel};

/// Comment count per sentiment label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LabelCounts {
    pub negative: usize,
    pub neutral: usize,
    pub positive: usize,
}

impl LabelCounts {
    pub fn increment(&mut self, label: SentimentLabel) {
        match label {
            SentimentLabel::Negative => self.negative += 1,
            SentimentLabel::Neutral => self.neutral += 1,
            SentimentLabel::Positive => self.positive += 1,
        }
    }

    pub fn get(&self, label: SentimentLabel) -> usize {
        match label {
            SentimentLabel::Negative => self.negative,
            SentimentLabel::Neutral => self.neutral,
            SentimentLabel::Positive => self.positive,
        }
    }

    pub fn total(&self) -> usize {
        self.negative + self.neutral + self.positive
    }

    /// True when there is nothing to chart.
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Result of counting comment labels.
#[derive(Debug, Clone, Serialize)]
pub struct DiscreteReport {
    pub counts: LabelCounts,
    #[serde(flatten)]
    pub tally: ScanTally,
}

impl DiscreteReport {
    pub fn outcome(&self) -> Outcome {
        self.tally.outcome()
    }
}

/// Count valid comments by their argmax sentiment label. No normalization.
pub async fn aggregate_discrete(
    comments: &[String],
    classifier: &dyn SentimentClassifier,
    progress: &mut (dyn FnMut(ScanProgress) + Send),
    cancel: Option<&CancelFlag>,
) -> Result<DiscreteReport> {
    let mut counts = LabelCounts::default();
    let tally = scan_comments(comments, classifier, progress, cancel, |c| {
        counts.increment(c.label)
    })
    .await?;

    Ok(DiscreteReport { counts, tally })
}
