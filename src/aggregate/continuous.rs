// Continuous mode: mean probability distribution across comments.

use anyhow::Result;
use serde::Serialize;

use super::{scan_comments, CancelFlag, Outcome, ScanProgress, ScanTally};
use crate::sentiment::{Distribution, SentimentClassifier};

/// Result of averaging comment distributions.
#[derive(Debug, Clone, Serialize)]
pub struct ContinuousReport {
    /// Mean distribution over classified comments. `None` when nothing was
    /// classified — never a distribution of zeros or NaNs.
    pub mean: Option<Distribution>,
    #[serde(flatten)]
    pub tally: ScanTally,
}

impl ContinuousReport {
    pub fn outcome(&self) -> Outcome {
        self.tally.outcome()
    }
}

/// Incremental elementwise mean.
///
/// Updated as `m += (x - m) / n` rather than summing and dividing once, so a
/// constant input averages back to exactly that constant.
#[derive(Debug, Default)]
struct RunningMean {
    values: [f64; 3],
    count: usize,
}

impl RunningMean {
    fn push(&mut self, distribution: &Distribution) {
        self.count += 1;
        let n = self.count as f64;
        for (mean, x) in self.values.iter_mut().zip(distribution.to_ordered()) {
            *mean += (x - *mean) / n;
        }
    }

    fn finish(&self) -> Option<Distribution> {
        if self.count == 0 {
            return None;
        }
        let [negative, neutral, positive] = self.values;
        Some(Distribution::new(negative, neutral, positive))
    }
}

/// Average the sentiment distributions of all valid comments.
///
/// `progress` fires after every fetched comment with `(index + 1) / fetched`.
/// `report.tally.analyzed` is the count the mean was taken over.
pub async fn aggregate_continuous(
    comments: &[String],
    classifier: &dyn SentimentClassifier,
    progress: &mut (dyn FnMut(ScanProgress) + Send),
    cancel: Option<&CancelFlag>,
) -> Result<ContinuousReport> {
    let mut mean = RunningMean::default();
    let tally = scan_comments(comments, classifier, progress, cancel, |c| {
        mean.push(&c.distribution)
    })
    .await?;

    Ok(ContinuousReport {
        mean: mean.finish(),
        tally,
    })
}
