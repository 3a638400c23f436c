//! Domain types for diabrisk-io.

use serde::{Deserialize, Serialize};

/// Patient rows read from the training CSV.
///
/// Produced by [`PatientCsvReader`](crate::PatientCsvReader). Rows and labels
/// are parallel: `labels[i]` is the class of `rows[i]`. Cells are `None` where
/// the CSV had a missing marker.
#[derive(Debug, Clone)]
pub struct PatientDataset {
    feature_names: Vec<String>,
    rows: Vec<Vec<Option<f64>>>,
    labels: Vec<usize>,
}

impl PatientDataset {
    pub(crate) fn new(
        feature_names: Vec<String>,
        rows: Vec<Vec<Option<f64>>>,
        labels: Vec<usize>,
    ) -> Self {
        debug_assert_eq!(rows.len(), labels.len());
        Self {
            feature_names,
            rows,
            labels,
        }
    }

    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Feature cells: `rows[sample_index][feature_index]`.
    #[must_use]
    pub fn rows(&self) -> &[Vec<Option<f64>>] {
        &self.rows
    }

    #[must_use]
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Number of `None` cells across all rows.
    #[must_use]
    pub fn n_missing(&self) -> usize {
        self.rows.iter().flatten().filter(|c| c.is_none()).count()
    }

    /// Rows per class, indexed by class.
    #[must_use]
    pub fn class_counts(&self) -> Vec<usize> {
        class_counts(&self.labels)
    }
}

/// Rows per class for labels in `0..=max(labels)`.
#[must_use]
pub fn class_counts(labels: &[usize]) -> Vec<usize> {
    let n_classes = labels.iter().max().map_or(0, |m| m + 1);
    let mut counts = vec![0; n_classes];
    for &label in labels {
        counts[label] += 1;
    }
    counts
}

/// Summary of one training run, written as `training_report.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub dataset: String,
    pub seed: u64,
    pub n_samples: usize,
    pub n_train: usize,
    pub n_test: usize,
    pub n_trees: usize,
    pub max_depth: Option<usize>,
    pub max_features: usize,
    pub k_neighbors: usize,
    /// Rows per class in the full dataset.
    pub class_counts: Vec<usize>,
    /// Rows per class in the training split before oversampling.
    pub train_class_counts: Vec<usize>,
    /// Rows per class after oversampling.
    pub balanced_class_counts: Vec<usize>,
    pub accuracy: f64,
    pub classes: Vec<ClassEntry>,
    pub macro_avg: ClassEntry,
    pub weighted_avg: ClassEntry,
    /// `confusion_matrix[true][predicted]` on the test split.
    pub confusion_matrix: Vec<Vec<usize>>,
    pub feature_importances: Vec<FeatureEntry>,
}

/// One row of the classification report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassEntry {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureEntry {
    pub name: String,
    pub importance: f64,
    pub rank: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_and_missing() {
        let ds = PatientDataset::new(
            vec!["a".into(), "b".into()],
            vec![vec![Some(1.0), None], vec![None, None], vec![Some(2.0), Some(3.0)]],
            vec![0, 1, 0],
        );
        assert_eq!(ds.n_samples(), 3);
        assert_eq!(ds.n_features(), 2);
        assert_eq!(ds.n_missing(), 3);
        assert_eq!(ds.class_counts(), vec![2, 1]);
    }

    #[test]
    fn class_counts_of_empty_labels() {
        assert!(class_counts(&[]).is_empty());
        assert_eq!(class_counts(&[1, 1]), vec![0, 2]);
    }
}
