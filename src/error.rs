//! Error types shared across the recognition pipeline.

use thiserror::Error;

/// An input whose length does not match what the pipeline expects.
///
/// Shape mismatches are always request-local validation failures: the request
/// is rejected with a descriptive reason and process state is unaffected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ShapeError {
    /// A flat landmark array of the wrong length was passed.
    #[error("expected {expected} landmark coordinates, got {actual}")]
    Landmarks { expected: usize, actual: usize },

    /// A class score vector whose length does not match the label table.
    #[error("got {scores} class scores for {labels} labels")]
    Scores { scores: usize, labels: usize },

    /// A class score vector with no entries.
    #[error("empty class score vector")]
    EmptyScores,
}

/// A classifier or label table that failed to load at startup.
///
/// This is fatal: the process refuses to serve rather than return undefined
/// predictions.
#[derive(Debug, Error)]
#[error("{what} unavailable")]
pub struct ModelUnavailable {
    pub what: String,
    #[source]
    pub source: anyhow::Error,
}

impl ModelUnavailable {
    pub fn new(what: impl Into<String>, source: anyhow::Error) -> Self {
        Self {
            what: what.into(),
            source,
        }
    }
}
