//! Class label tables.
//!
//! A label table maps classifier output indices to label strings. It is
//! loaded once at process start and stays immutable for the process lifetime.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context};

/// Ordered, index-aligned class labels for a classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelTable {
    labels: Vec<String>,
}

impl LabelTable {
    /// Creates a table from an already ordered list of labels.
    pub fn from_labels(labels: Vec<String>) -> Self {
        Self { labels }
    }

    /// Loads a table from a JSON object mapping stringified indices to labels,
    /// e.g. `{"0": "a", "1": "b", ...}`.
    ///
    /// The indices must form a gap-free range starting at 0.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        Self::from_json_file_impl(path.as_ref())
    }

    fn from_json_file_impl(path: &Path) -> anyhow::Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read label file '{}'", path.display()))?;
        Self::from_json(&json)
            .with_context(|| format!("malformed label file '{}'", path.display()))
    }

    /// Parses a table from the JSON index-to-label object format.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let map: HashMap<String, String> = serde_json::from_str(json)?;

        let mut labels = Vec::with_capacity(map.len());
        for i in 0..map.len() {
            match map.get(&i.to_string()) {
                Some(label) => labels.push(label.clone()),
                None => bail!("label table is missing index {i} (have {} entries)", map.len()),
            }
        }
        Ok(Self { labels })
    }

    /// Generates the default alphabet for a classifier with `num_classes`
    /// outputs, for when no label file is configured.
    ///
    /// - 26 classes: `a`..`z`.
    /// - 27 classes: `a`..`z` plus `space`.
    /// - 25 classes: `a`..`z` without `j` and `z`, the two letters that
    ///   require motion and can't be classified from a single hand shape.
    pub fn fallback(num_classes: usize) -> anyhow::Result<Self> {
        let letters = || ('a'..='z').map(String::from);
        let labels: Vec<String> = match num_classes {
            25 => letters().filter(|l| l != "j" && l != "z").collect(),
            26 => letters().collect(),
            27 => letters().chain(["space".to_string()]).collect(),
            _ => bail!("no default label table for {num_classes} classes"),
        };
        Ok(Self { labels })
    }

    /// Returns the label for class index `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of range; the caller is expected to have validated
    /// score/label cardinality already.
    pub fn get(&self, i: usize) -> &str {
        &self.labels[i]
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Read-only view of all labels, in class index order.
    pub fn as_slice(&self) -> &[String] {
        &self.labels
    }
}
