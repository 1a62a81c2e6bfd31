// Sentiment classification — trait-based abstraction over two backends.
//
// The classical backend is a TF-IDF + logistic regression model exported to
// JSON; the transformer backend runs a RoBERTa sentiment model through ONNX.
// Both sit behind SentimentClassifier so the aggregator and the analysis
// operations never know which one they're talking to.

pub mod classical;
pub mod distribution;
pub mod onnx;
pub mod traits;

pub use distribution::{
    normalize, Classification, Distribution, ModelOutput, NormalizeError, SentimentLabel,
};
pub use traits::{classify_text, SentimentClassifier};
