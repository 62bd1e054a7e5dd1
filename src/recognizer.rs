//! The recognition context.
//!
//! A [`Recognizer`] owns everything that is loaded once at process start and
//! then treated as read-only: the two hand-specific classifiers, the label
//! table, and the confidence threshold. Request handlers share it behind an
//! [`Arc`](std::sync::Arc) and call [`Recognizer::predict`] concurrently;
//! there is no cross-request state.

use std::path::PathBuf;

use anyhow::ensure;

use crate::error::{ModelUnavailable, ShapeError};
use crate::feature::{drop_z, normalize, FeatureDims};
use crate::labels::LabelTable;
use crate::landmark::Handedness;
use crate::nn::{Classifier, DenseClassifier};
use crate::predict::{resolve, Prediction};
use crate::timer::Timer;

/// Number of ranked alternatives included in every prediction.
pub const TOP_K: usize = 3;

/// Default threshold below which predictions are flagged as uncertain.
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.4;

/// File locations and tuning for [`Recognizer::load`].
pub struct RecognizerConfig {
    pub model_left: PathBuf,
    pub model_right: PathBuf,
    /// Optional label table path; when [`None`], a default alphabet matching
    /// the classifier's class count is generated.
    pub labels: Option<PathBuf>,
    pub min_confidence: f32,
}

struct HandModel {
    classifier: Box<dyn Classifier>,
    dims: FeatureDims,
    name: &'static str,
}

impl HandModel {
    fn new(classifier: Box<dyn Classifier>, name: &'static str) -> anyhow::Result<Self> {
        let dims = FeatureDims::from_feature_len(classifier.input_len());
        let Some(dims) = dims else {
            anyhow::bail!(
                "{name} model takes {} inputs, expected 42 or 63",
                classifier.input_len(),
            );
        };
        Ok(Self {
            classifier,
            dims,
            name,
        })
    }
}

/// Immutable prediction context shared by all request handlers.
pub struct Recognizer {
    left: HandModel,
    right: HandModel,
    labels: LabelTable,
    min_confidence: f32,
    t_normalize: Timer,
    t_infer: Timer,
}

impl Recognizer {
    /// Builds a recognizer from already-loaded classifiers.
    ///
    /// When `labels` is [`None`], [`LabelTable::fallback`] provides the
    /// alphabet. Both classifiers must agree on the class count, and the
    /// label table must match it.
    pub fn new(
        left: Box<dyn Classifier>,
        right: Box<dyn Classifier>,
        labels: Option<LabelTable>,
        min_confidence: f32,
    ) -> anyhow::Result<Self> {
        let num_classes = right.num_classes();
        ensure!(
            left.num_classes() == num_classes,
            "left hand model has {} classes, right hand model has {num_classes}",
            left.num_classes(),
        );

        let labels = match labels {
            Some(labels) => labels,
            None => LabelTable::fallback(num_classes)?,
        };
        ensure!(
            labels.len() == num_classes,
            "label table has {} entries for {num_classes} classifier outputs",
            labels.len(),
        );

        Ok(Self {
            left: HandModel::new(left, "Left Hand")?,
            right: HandModel::new(right, "Right Hand")?,
            labels,
            min_confidence,
            t_normalize: Timer::new("normalize"),
            t_infer: Timer::new("infer"),
        })
    }

    /// Loads both classifiers and the label table from disk, failing fast.
    ///
    /// Any failure here means the process cannot produce defined predictions,
    /// so initialization is aborted rather than serving partially.
    pub fn load(config: &RecognizerConfig) -> anyhow::Result<Self> {
        let left = DenseClassifier::from_path(&config.model_left)
            .map_err(|e| ModelUnavailable::new("left hand classifier", e))?;
        let right = DenseClassifier::from_path(&config.model_right)
            .map_err(|e| ModelUnavailable::new("right hand classifier", e))?;

        let labels = match &config.labels {
            Some(path) => Some(
                LabelTable::from_json_file(path)
                    .map_err(|e| ModelUnavailable::new("label table", e))?,
            ),
            None => None,
        };

        let recognizer = Self::new(Box::new(left), Box::new(right), labels, config.min_confidence)
            .map_err(|e| ModelUnavailable::new("classifier configuration", e))?;

        log::info!(
            "loaded dual hand models: {} / {}, {} classes",
            config.model_left.display(),
            config.model_right.display(),
            recognizer.labels.len(),
        );
        Ok(recognizer)
    }

    /// Classifies a flat landmark array (42 or 63 values).
    ///
    /// The classifier is selected by `handedness` before inference. A
    /// 63-value input is projected to 2D when the routed classifier was
    /// trained on 42 values; a 42-value input cannot feed a 63-input
    /// classifier and is rejected with a [`ShapeError`].
    pub fn predict(&self, raw: &[f32], handedness: Handedness) -> anyhow::Result<Prediction> {
        let hand = match handedness {
            Handedness::Left => &self.left,
            Handedness::Right => &self.right,
        };

        let features = self.t_normalize.time(|| -> Result<Vec<f32>, ShapeError> {
            if hand.dims == FeatureDims::Xy && raw.len() == FeatureDims::Xyz.feature_len() {
                normalize(&drop_z(raw)?, FeatureDims::Xy)
            } else {
                normalize(raw, hand.dims)
            }
        })?;

        let scores = self.t_infer.time(|| hand.classifier.infer(&features))?;
        let ranking = resolve(&scores, &self.labels, TOP_K, self.min_confidence)?;

        let prediction = Prediction::from_ranking(ranking, handedness, hand.name);
        log::debug!(
            "{}: {} ({:.1}%){}",
            hand.name,
            prediction.prediction,
            prediction.confidence * 100.0,
            if prediction.uncertain { " [uncertain]" } else { "" },
        );
        Ok(prediction)
    }

    /// Read-only snapshot of the active label table.
    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    /// Returns profiling timers for the prediction pipeline.
    pub fn timers(&self) -> impl Iterator<Item = &Timer> + '_ {
        [&self.t_normalize, &self.t_infer].into_iter()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    struct StubClassifier {
        input_len: usize,
        scores: Vec<f32>,
        seen: Arc<Mutex<Vec<Vec<f32>>>>,
    }

    impl StubClassifier {
        fn new(input_len: usize, scores: Vec<f32>) -> Self {
            Self {
                input_len,
                scores,
                seen: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn seen(&self) -> Arc<Mutex<Vec<Vec<f32>>>> {
            self.seen.clone()
        }
    }

    impl Classifier for StubClassifier {
        fn input_len(&self) -> usize {
            self.input_len
        }

        fn num_classes(&self) -> usize {
            self.scores.len()
        }

        fn infer(&self, features: &[f32]) -> anyhow::Result<Vec<f32>> {
            self.seen.lock().unwrap().push(features.to_vec());
            Ok(self.scores.clone())
        }
    }

    fn scores_favoring(index: usize) -> Vec<f32> {
        let mut scores = vec![0.01; 26];
        scores[index] = 0.8;
        scores
    }

    fn landmarks_63() -> Vec<f32> {
        (0..63).map(|i| (i as f32 * 0.11).cos()).collect()
    }

    #[test]
    fn routes_by_handedness() {
        let recognizer = Recognizer::new(
            Box::new(StubClassifier::new(42, scores_favoring(1))),
            Box::new(StubClassifier::new(42, scores_favoring(0))),
            None,
            DEFAULT_MIN_CONFIDENCE,
        )
        .unwrap();

        let left = recognizer
            .predict(&landmarks_63(), Handedness::Left)
            .unwrap();
        assert_eq!(left.prediction, "b");
        assert_eq!(left.model_used, "Left Hand");
        assert_eq!(left.handedness, Handedness::Left);

        let right = recognizer
            .predict(&landmarks_63(), Handedness::Right)
            .unwrap();
        assert_eq!(right.prediction, "a");
        assert_eq!(right.model_used, "Right Hand");
    }

    #[test]
    fn projects_3d_input_for_2d_models() {
        let stub = StubClassifier::new(42, scores_favoring(2));
        let seen = stub.seen();
        let recognizer = Recognizer::new(
            Box::new(StubClassifier::new(42, scores_favoring(2))),
            Box::new(stub),
            None,
            DEFAULT_MIN_CONFIDENCE,
        )
        .unwrap();

        recognizer
            .predict(&landmarks_63(), Handedness::Right)
            .unwrap();

        // The classifier must have seen the normalized 2D projection.
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let features = &seen[0];
        assert_eq!(features.len(), 42);
        assert!(features.iter().all(|v| v.abs() <= 1.0));
        assert!(features.iter().any(|v| v.abs() == 1.0));
    }

    #[test]
    fn rejects_wrong_length() {
        let recognizer = Recognizer::new(
            Box::new(StubClassifier::new(42, scores_favoring(0))),
            Box::new(StubClassifier::new(42, scores_favoring(0))),
            None,
            DEFAULT_MIN_CONFIDENCE,
        )
        .unwrap();

        let err = recognizer
            .predict(&vec![0.0; 60], Handedness::Right)
            .unwrap_err();
        assert!(err.downcast_ref::<ShapeError>().is_some());
    }

    #[test]
    fn short_input_cannot_feed_3d_model() {
        let recognizer = Recognizer::new(
            Box::new(StubClassifier::new(63, scores_favoring(0))),
            Box::new(StubClassifier::new(63, scores_favoring(0))),
            None,
            DEFAULT_MIN_CONFIDENCE,
        )
        .unwrap();

        let err = recognizer
            .predict(&vec![0.5; 42], Handedness::Right)
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<ShapeError>(),
            Some(&ShapeError::Landmarks {
                expected: 63,
                actual: 42
            })
        );
    }

    #[test]
    fn timers_record_pipeline_stages() {
        let recognizer = Recognizer::new(
            Box::new(StubClassifier::new(42, scores_favoring(0))),
            Box::new(StubClassifier::new(42, scores_favoring(0))),
            None,
            DEFAULT_MIN_CONFIDENCE,
        )
        .unwrap();

        recognizer
            .predict(&landmarks_63(), Handedness::Right)
            .unwrap();

        let shown: Vec<String> = recognizer.timers().map(|t| t.to_string()).collect();
        assert_eq!(shown.len(), 2);
        assert!(shown[0].starts_with("normalize: 1x"), "{}", shown[0]);
        assert!(shown[1].starts_with("infer: 1x"), "{}", shown[1]);
    }

    #[test]
    fn label_table_must_match_class_count() {
        let labels = LabelTable::from_labels(vec!["a".into(), "b".into()]);
        let result = Recognizer::new(
            Box::new(StubClassifier::new(42, scores_favoring(0))),
            Box::new(StubClassifier::new(42, scores_favoring(0))),
            Some(labels),
            DEFAULT_MIN_CONFIDENCE,
        );
        assert!(result.is_err());
    }

    #[test]
    fn mismatched_hand_models_are_rejected() {
        let result = Recognizer::new(
            Box::new(StubClassifier::new(42, vec![0.5; 25])),
            Box::new(StubClassifier::new(42, vec![0.5; 26])),
            None,
            DEFAULT_MIN_CONFIDENCE,
        );
        assert!(result.is_err());
    }
}
