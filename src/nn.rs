//! Classifier inference.
//!
//! The recognition pipeline only needs one operation from a model: map a
//! fixed-length feature vector to one score per class. [`Classifier`] is that
//! seam; [`DenseClassifier`] implements it with an ONNX model executed by
//! `tract`, and tests substitute their own stubs.

use std::path::Path;
use std::sync::Arc;

use anyhow::ensure;
use tract_onnx::prelude::{
    tvec, Framework, Graph, InferenceModelExt, SimplePlan, TValue, Tensor, TypedFact, TypedOp,
};

type Model = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// A pre-trained hand shape classifier.
///
/// Implementations must be safe for concurrent stateless inference; the
/// recognizer shares them read-only across request threads.
pub trait Classifier: Send + Sync {
    /// Length of the feature vector this classifier consumes (42 or 63).
    fn input_len(&self) -> usize;

    /// Number of classes in the classifier's output.
    fn num_classes(&self) -> usize;

    /// Runs inference, returning one score per class.
    ///
    /// Scores are returned exactly as the model produces them; softmax (or
    /// its absence) is the model's business.
    fn infer(&self, features: &[f32]) -> anyhow::Result<Vec<f32>>;
}

/// A dense feed-forward classifier loaded from an ONNX file.
pub struct DenseClassifier {
    plan: Model,
    input_len: usize,
    num_classes: usize,
}

impl DenseClassifier {
    /// Loads and optimizes a classifier from an ONNX file path.
    ///
    /// The path must have a `.onnx` extension. In the future, other model
    /// formats may be supported.
    pub fn from_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        Self::from_path_impl(path.as_ref())
    }

    fn from_path_impl(path: &Path) -> anyhow::Result<Self> {
        match path.extension() {
            Some(ext) if ext == "onnx" => {}
            _ => anyhow::bail!("classifier file must have `.onnx` extension"),
        }

        let model_data = std::fs::read(path)?;
        Self::from_onnx(&model_data)
    }

    /// Loads and optimizes a classifier from an in-memory ONNX file.
    ///
    /// Returns an error if the model data is malformed or if the model is not
    /// a single-input, single-output vector classifier.
    pub fn from_onnx(raw: &[u8]) -> anyhow::Result<Self> {
        let graph = tract_onnx::onnx()
            .model_for_read(&mut &*raw)?
            .into_optimized()?;

        ensure!(
            graph.inputs.len() == 1,
            "classifier must take exactly 1 input, this one takes {}",
            graph.inputs.len(),
        );
        ensure!(
            graph.outputs.len() == 1,
            "classifier must produce exactly 1 output, this one produces {}",
            graph.outputs.len(),
        );

        let input_len = vector_len(graph.input_fact(0)?.shape.as_concrete(), "input")?;
        let num_classes = vector_len(graph.output_fact(0)?.shape.as_concrete(), "output")?;

        let plan = graph.into_runnable()?;
        Ok(Self {
            plan,
            input_len,
            num_classes,
        })
    }
}

/// Extracts `N` from a `[N]` or `[1, N]` tensor shape.
fn vector_len(shape: Option<&[usize]>, what: &str) -> anyhow::Result<usize> {
    match shape {
        Some([n]) | Some([1, n]) => Ok(*n),
        _ => anyhow::bail!("classifier {what} must be a `[1, N]` vector, got {shape:?}"),
    }
}

impl Classifier for DenseClassifier {
    fn input_len(&self) -> usize {
        self.input_len
    }

    fn num_classes(&self) -> usize {
        self.num_classes
    }

    fn infer(&self, features: &[f32]) -> anyhow::Result<Vec<f32>> {
        ensure!(
            features.len() == self.input_len,
            "classifier expects {} features, got {}",
            self.input_len,
            features.len(),
        );

        let tensor = Tensor::from_shape(&[1, self.input_len], features)?;
        let outputs = self
            .plan
            .run(tvec![TValue::from_const(Arc::new(tensor))])?;
        log::trace!("classifier outputs: {:?}", outputs);

        let scores = outputs[0].to_array_view::<f32>()?;
        Ok(scores.iter().copied().collect())
    }
}
