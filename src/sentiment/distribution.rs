// Sentiment labels, probability distributions, and the model-output adapter.
//
// Classifier backends disagree on output shape: the classical model returns
// an ordered probability vector, the transformer returns label → score pairs.
// Both are wrapped in ModelOutput and normalized into a Distribution right at
// the boundary, so nothing downstream ever branches on the backend.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The fixed sentiment label set, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SentimentLabel {
    Negative,
    Neutral,
    Positive,
}

impl SentimentLabel {
    /// All labels in canonical order: the order of the classical model's
    /// probability vector.
    pub const ALL: [SentimentLabel; 3] = [
        SentimentLabel::Negative,
        SentimentLabel::Neutral,
        SentimentLabel::Positive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Negative => "Negative",
            SentimentLabel::Neutral => "Neutral",
            SentimentLabel::Positive => "Positive",
        }
    }

    /// Position of this label in the canonical order.
    pub fn index(&self) -> usize {
        match self {
            SentimentLabel::Negative => 0,
            SentimentLabel::Neutral => 1,
            SentimentLabel::Positive => 2,
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SentimentLabel {
    type Err = NormalizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Negative" => Ok(SentimentLabel::Negative),
            "Neutral" => Ok(SentimentLabel::Neutral),
            "Positive" => Ok(SentimentLabel::Positive),
            other => Err(NormalizeError::UnknownLabel(other.to_string())),
        }
    }
}

/// Probability mass over {Negative, Neutral, Positive}.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub negative: f64,
    pub neutral: f64,
    pub positive: f64,
}

impl Distribution {
    pub fn new(negative: f64, neutral: f64, positive: f64) -> Self {
        Self {
            negative,
            neutral,
            positive,
        }
    }

    /// Even split across all three labels. Returned for empty input.
    pub fn uniform() -> Self {
        let third = 1.0 / 3.0;
        Self::new(third, third, third)
    }

    /// All mass on a single label.
    pub fn certain(label: SentimentLabel) -> Self {
        let mut values = [0.0; 3];
        values[label.index()] = 1.0;
        Self::from_ordered(values)
    }

    fn from_ordered(values: [f64; 3]) -> Self {
        Self::new(values[0], values[1], values[2])
    }

    pub fn get(&self, label: SentimentLabel) -> f64 {
        match label {
            SentimentLabel::Negative => self.negative,
            SentimentLabel::Neutral => self.neutral,
            SentimentLabel::Positive => self.positive,
        }
    }

    /// Values in canonical order.
    pub fn to_ordered(&self) -> [f64; 3] {
        [self.negative, self.neutral, self.positive]
    }

    /// Label → probability mapping, the shape the transformer backend emits.
    pub fn to_labeled(&self) -> HashMap<String, f64> {
        SentimentLabel::ALL
            .iter()
            .map(|label| (label.as_str().to_string(), self.get(*label)))
            .collect()
    }

    /// The most probable label. Ties go to the earliest label in canonical order.
    pub fn argmax(&self) -> SentimentLabel {
        let mut best = SentimentLabel::Negative;
        for label in SentimentLabel::ALL {
            if self.get(label) > self.get(best) {
                best = label;
            }
        }
        best
    }

    pub fn sum(&self) -> f64 {
        self.negative + self.neutral + self.positive
    }
}

/// A single classifier verdict: the distribution and its argmax label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Classification {
    pub label: SentimentLabel,
    pub distribution: Distribution,
}

impl Classification {
    /// Verdict for empty or whitespace-only input: an even split, reported
    /// as Neutral (a valid argmax, since all three labels tie).
    pub fn empty_input() -> Self {
        Self {
            label: SentimentLabel::Neutral,
            distribution: Distribution::uniform(),
        }
    }
}

impl From<Distribution> for Classification {
    fn from(distribution: Distribution) -> Self {
        Self {
            label: distribution.argmax(),
            distribution,
        }
    }
}

/// Raw output of a classifier backend, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelOutput {
    /// Probability vector in canonical order [Negative, Neutral, Positive].
    Ordered(Vec<f64>),
    /// Label name → probability.
    Labeled(HashMap<String, f64>),
}

impl From<Distribution> for ModelOutput {
    fn from(distribution: Distribution) -> Self {
        ModelOutput::Ordered(distribution.to_ordered().to_vec())
    }
}

/// Malformed classifier output. Always a contract violation by the backend,
/// never something to paper over.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizeError {
    /// Ordered vector with the wrong number of entries.
    WrongLength(usize),
    /// A label outside {Negative, Neutral, Positive}.
    UnknownLabel(String),
    /// A canonical label absent from a labeled mapping.
    MissingLabel(SentimentLabel),
    /// NaN, infinite, or negative probability.
    InvalidValue { label: SentimentLabel, value: f64 },
}

impl fmt::Display for NormalizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizeError::WrongLength(len) => {
                write!(f, "expected 3 class probabilities, got {len}")
            }
            NormalizeError::UnknownLabel(label) => {
                write!(f, "classifier returned unknown sentiment label {label:?}")
            }
            NormalizeError::MissingLabel(label) => {
                write!(f, "classifier output is missing the {label} label")
            }
            NormalizeError::InvalidValue { label, value } => {
                write!(f, "invalid probability {value} for {label}")
            }
        }
    }
}

impl std::error::Error for NormalizeError {}

/// Convert either backend shape into a Distribution.
///
/// Rejects vectors whose length isn't 3, mappings whose key set isn't exactly
/// the canonical three labels, and values that aren't finite and non-negative.
pub fn normalize(output: ModelOutput) -> Result<Distribution, NormalizeError> {
    let values: [f64; 3] = match output {
        ModelOutput::Ordered(values) => {
            if values.len() != 3 {
                return Err(NormalizeError::WrongLength(values.len()));
            }
            [values[0], values[1], values[2]]
        }
        ModelOutput::Labeled(scores) => {
            let mut values = [None; 3];
            for (name, score) in scores {
                let label: SentimentLabel = name.parse()?;
                values[label.index()] = Some(score);
            }
            let mut ordered = [0.0; 3];
            for label in SentimentLabel::ALL {
                ordered[label.index()] =
                    values[label.index()].ok_or(NormalizeError::MissingLabel(label))?;
            }
            ordered
        }
    };

    for label in SentimentLabel::ALL {
        let value = values[label.index()];
        if !value.is_finite() || value < 0.0 {
            return Err(NormalizeError::InvalidValue { label, value });
        }
    }

    Ok(Distribution::from_ordered(values))
}
