//! Landmark normalization.
//!
//! Converts a raw hand landmark set into the fixed-length feature vector the
//! classifiers were trained on. The transform must match training-time
//! preprocessing exactly, otherwise the learned decision boundary is invalid,
//! so everything here is a pure, deterministic function over its input.

use crate::error::ShapeError;
use crate::landmark::{LandmarkIdx, NUM_LANDMARKS};

/// Per-point dimensionality of a landmark set.
///
/// Which one to use is decided by the classifier that will consume the
/// feature vector: the dual-hand models take 42 inputs ([`FeatureDims::Xy`]),
/// other model families take all 63 ([`FeatureDims::Xyz`]). No inference is
/// performed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureDims {
    /// 2 coordinates per point, 42 values total.
    Xy,
    /// 3 coordinates per point, 63 values total.
    Xyz,
}

impl FeatureDims {
    /// Number of coordinates per landmark point.
    #[inline]
    pub fn per_point(self) -> usize {
        match self {
            FeatureDims::Xy => 2,
            FeatureDims::Xyz => 3,
        }
    }

    /// Length of a flat landmark array (and of the normalized feature vector).
    #[inline]
    pub fn feature_len(self) -> usize {
        NUM_LANDMARKS * self.per_point()
    }

    /// Determines the dimensionality from a flat array length (42 or 63).
    pub fn from_feature_len(len: usize) -> Option<Self> {
        match len {
            42 => Some(FeatureDims::Xy),
            63 => Some(FeatureDims::Xyz),
            _ => None,
        }
    }
}

/// Normalizes a flat landmark array into a classifier feature vector.
///
/// `flat` holds 21 points of `dims` coordinates each, in point order with x
/// before y (before z). The transform:
///
/// 1. subtracts the wrist (point 0) from every point, making the feature
///    independent of where the hand sits in the frame, and
/// 2. divides every value by the largest absolute value, making it
///    independent of hand size and camera distance.
///
/// The result lies in `[-1, 1]` with at least one component at exactly ±1,
/// except for the degenerate case where all points coincide with the wrist:
/// there is no shape to scale, so the output is all zeros rather than a
/// division by zero. That case is not an error.
pub fn normalize(flat: &[f32], dims: FeatureDims) -> Result<Vec<f32>, ShapeError> {
    let per = dims.per_point();
    let expected = dims.feature_len();
    if flat.len() != expected {
        return Err(ShapeError::Landmarks {
            expected,
            actual: flat.len(),
        });
    }

    let base = LandmarkIdx::Wrist as usize * per;
    let wrist: Vec<f32> = flat[base..base + per].to_vec();

    let mut out = flat.to_vec();
    for point in out.chunks_exact_mut(per) {
        for (v, w) in point.iter_mut().zip(&wrist) {
            *v -= w;
        }
    }

    let max_value = out.iter().fold(0.0f32, |m, v| m.max(v.abs()));
    if max_value != 0.0 {
        for v in &mut out {
            *v /= max_value;
        }
    }

    Ok(out)
}

/// Projects a 63-value 3D landmark array down to the 42-value 2D layout by
/// dropping every z coordinate.
///
/// Callers typically capture 3D landmarks but feed classifiers that were
/// trained on 2D ones; the projection happens *before* [`normalize`].
pub fn drop_z(flat: &[f32]) -> Result<Vec<f32>, ShapeError> {
    let expected = FeatureDims::Xyz.feature_len();
    if flat.len() != expected {
        return Err(ShapeError::Landmarks {
            expected,
            actual: flat.len(),
        });
    }

    let mut out = Vec::with_capacity(FeatureDims::Xy.feature_len());
    for point in flat.chunks_exact(3) {
        out.extend_from_slice(&point[..2]);
    }
    Ok(out)
}
