//! Prediction resolution.
//!
//! Turns the raw per-class score vector of a classifier into a ranked,
//! thresholded result. The resolver is classifier-agnostic: it post-processes
//! whatever scores it is given and leaves model selection to the caller.

use std::cmp::{Ordering, Reverse};

use itertools::Itertools;
use serde::Serialize;

use crate::error::ShapeError;
use crate::labels::LabelTable;
use crate::landmark::Handedness;

/// An `f32` ordered by the IEEE 754 totalOrder predicate, so that score
/// ranking is deterministic even in the presence of NaNs.
#[derive(Clone, Copy)]
struct TotalF32(f32);

impl PartialEq for TotalF32 {
    fn eq(&self, other: &Self) -> bool {
        f32::total_cmp(&self.0, &other.0) == Ordering::Equal
    }
}

impl Eq for TotalF32 {}

impl PartialOrd for TotalF32 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TotalF32 {
    fn cmp(&self, other: &Self) -> Ordering {
        f32::total_cmp(&self.0, &other.0)
    }
}

/// A label paired with the classifier's confidence in it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredLabel {
    pub label: String,
    pub confidence: f32,
}

/// Ranked classifier output for a single inference.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    /// The `k` best labels, sorted descending by score.
    pub top: Vec<ScoredLabel>,
    /// Whether the best score fell below the configured threshold.
    ///
    /// Advisory only; the prediction itself is still the classifier's best
    /// effort.
    pub uncertain: bool,
}

impl Ranking {
    /// The overall best prediction.
    pub fn best(&self) -> &ScoredLabel {
        &self.top[0]
    }
}

/// Ranks `scores` against `labels`, keeping the `k` best classes.
///
/// Scores are taken as-is: no re-normalization happens here, so callers that
/// want a probability interpretation must feed a valid distribution.
///
/// Ordering is strictly descending by score; equal scores are won by the
/// lower index. `k` is clamped to `1..=scores.len()`, so the result always
/// contains at least the best class.
pub fn resolve(
    scores: &[f32],
    labels: &LabelTable,
    k: usize,
    min_confidence: f32,
) -> Result<Ranking, ShapeError> {
    if scores.len() != labels.len() {
        return Err(ShapeError::Scores {
            scores: scores.len(),
            labels: labels.len(),
        });
    }
    if scores.is_empty() {
        return Err(ShapeError::EmptyScores);
    }

    let top: Vec<ScoredLabel> = scores
        .iter()
        .enumerate()
        .sorted_by_key(|&(i, &score)| (Reverse(TotalF32(score)), i))
        .take(k.max(1))
        .map(|(i, &score)| ScoredLabel {
            label: labels.get(i).to_string(),
            confidence: score,
        })
        .collect();

    let uncertain = top[0].confidence < min_confidence;
    Ok(Ranking { top, uncertain })
}

/// A fully resolved prediction, annotated with the routing metadata of the
/// model that produced it. This is the shape the HTTP layer serializes.
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub prediction: String,
    pub confidence: f32,
    pub top3: Vec<ScoredLabel>,
    pub uncertain: bool,
    pub handedness: Handedness,
    pub model_used: String,
}

impl Prediction {
    /// Annotates a [`Ranking`] with the hand model that produced it.
    pub fn from_ranking(ranking: Ranking, handedness: Handedness, model_used: &str) -> Self {
        let best = ranking.best().clone();
        Self {
            prediction: best.label,
            confidence: best.confidence,
            top3: ranking.top,
            uncertain: ranking.uncertain,
            handedness,
            model_used: model_used.to_string(),
        }
    }
}
