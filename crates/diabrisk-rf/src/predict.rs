//! Probability averaging and class prediction for [`RandomForest`].

use rayon::prelude::*;

use crate::error::RfError;
use crate::forest::RandomForest;

/// Index of the largest entry; ties go to the lower index.
pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

/// Averaged class probabilities for one row.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassProbabilities(Vec<f64>);

impl ClassProbabilities {
    /// Probability of `class`, or 0.0 if the model never saw that class.
    #[must_use]
    pub fn of(&self, class: usize) -> f64 {
        self.0.get(class).copied().unwrap_or(0.0)
    }

    /// Most probable class.
    #[must_use]
    pub fn predicted_class(&self) -> usize {
        argmax(&self.0)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

impl RandomForest {
    /// Mean of the leaf distributions reached in every tree.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] if `row` has the wrong length.
    pub fn predict_proba(&self, row: &[f64]) -> Result<ClassProbabilities, RfError> {
        if row.len() != self.n_features {
            return Err(RfError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: row.len(),
            });
        }
        let mut sum = vec![0.0; self.n_classes];
        for tree in &self.trees {
            // Leaves carry one entry per class seen in training, never more.
            for (acc, p) in sum.iter_mut().zip(tree.leaf_proba(row)) {
                *acc += p;
            }
        }
        let n = self.trees.len() as f64;
        sum.iter_mut().for_each(|p| *p /= n);
        Ok(ClassProbabilities(sum))
    }

    /// Class with the highest averaged probability.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] if `row` has the wrong length.
    pub fn predict(&self, row: &[f64]) -> Result<usize, RfError> {
        Ok(self.predict_proba(row)?.predicted_class())
    }

    /// [`RandomForest::predict`] over many rows in parallel.
    ///
    /// # Errors
    ///
    /// Returns the first [`RfError::PredictionFeatureMismatch`] encountered.
    pub fn predict_batch(&self, rows: &[Vec<f64>]) -> Result<Vec<usize>, RfError> {
        rows.par_iter().map(|row| self.predict(row)).collect()
    }

    /// [`RandomForest::predict_proba`] over many rows in parallel.
    ///
    /// # Errors
    ///
    /// Returns the first [`RfError::PredictionFeatureMismatch`] encountered.
    pub fn predict_proba_batch(&self, rows: &[Vec<f64>]) -> Result<Vec<ClassProbabilities>, RfError> {
        rows.par_iter().map(|row| self.predict_proba(row)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ForestConfig;

    fn fitted() -> (RandomForest, Vec<Vec<f64>>) {
        let features: Vec<Vec<f64>> = (0..30)
            .map(|i| vec![i as f64, (i % 4) as f64])
            .collect();
        let labels: Vec<usize> = (0..30).map(|i| usize::from(i >= 15)).collect();
        let names = vec!["a".to_string(), "b".to_string()];
        let forest = ForestConfig::new(25)
            .unwrap()
            .fit(&features, &labels, &names)
            .unwrap()
            .into_forest();
        (forest, features)
    }

    #[test]
    fn argmax_breaks_ties_low() {
        assert_eq!(argmax(&[0.5, 0.5]), 0);
        assert_eq!(argmax(&[0.2, 0.3, 0.5]), 2);
    }

    #[test]
    fn probabilities_sum_to_one() {
        let (forest, features) = fitted();
        for row in &features {
            let proba = forest.predict_proba(row).unwrap();
            assert!((proba.as_slice().iter().sum::<f64>() - 1.0).abs() < 1e-9);
            assert!((0.0..=1.0).contains(&proba.of(1)));
        }
    }

    #[test]
    fn unknown_class_probability_is_zero() {
        let (forest, features) = fitted();
        assert_eq!(forest.predict_proba(&features[0]).unwrap().of(7), 0.0);
    }

    #[test]
    fn batch_matches_single_rows() {
        let (forest, features) = fitted();
        let batch = forest.predict_proba_batch(&features).unwrap();
        for (row, from_batch) in features.iter().zip(&batch) {
            assert_eq!(&forest.predict_proba(row).unwrap(), from_batch);
        }
    }

    #[test]
    fn wrong_row_length_rejected() {
        let (forest, _) = fitted();
        assert!(matches!(
            forest.predict_proba(&[1.0, 2.0, 3.0]),
            Err(RfError::PredictionFeatureMismatch { expected: 2, got: 3 })
        ));
    }
}
