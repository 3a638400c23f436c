//! SMOTE oversampling.
//!
//! Every class smaller than the largest one is topped up with synthetic rows
//! placed on the segment between a member and one of its `k` nearest
//! same-class neighbours. Original rows are kept and come first in the output.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::{debug, info, instrument, warn};

use crate::error::PrepError;

/// Configuration for [`SmoteConfig::fit_resample`].
#[derive(Debug, Clone)]
pub struct SmoteConfig {
    k_neighbors: usize,
    seed: u64,
}

/// Balanced output of [`SmoteConfig::fit_resample`].
#[derive(Debug, Clone, PartialEq)]
pub struct Resampled {
    pub features: Vec<Vec<f64>>,
    pub labels: Vec<usize>,
    /// Rows appended after the originals.
    pub n_synthetic: usize,
}

impl Default for SmoteConfig {
    fn default() -> Self {
        Self {
            k_neighbors: 5,
            seed: 42,
        }
    }
}

impl SmoteConfig {
    /// # Errors
    ///
    /// Returns [`PrepError::InvalidNeighborCount`] if `k_neighbors == 0`.
    pub fn new(k_neighbors: usize) -> Result<Self, PrepError> {
        if k_neighbors == 0 {
            return Err(PrepError::InvalidNeighborCount { k_neighbors });
        }
        Ok(Self {
            k_neighbors,
            ..Self::default()
        })
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn k_neighbors(&self) -> usize {
        self.k_neighbors
    }

    /// Oversample until every present class matches the largest class count.
    ///
    /// A class with one row has no neighbours, so that row is duplicated.
    /// A class with `count <= k_neighbors` uses `count - 1` neighbours.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`PrepError::EmptyDataset`] | no rows |
    /// | [`PrepError::LabelCountMismatch`] | `labels.len() != features.len()` |
    /// | [`PrepError::RaggedRow`] | rows differ in length |
    /// | [`PrepError::NonFiniteValue`] | a value is NaN or infinite |
    #[instrument(skip_all, fields(n_samples = features.len(), k = self.k_neighbors))]
    pub fn fit_resample(
        &self,
        features: &[Vec<f64>],
        labels: &[usize],
    ) -> Result<Resampled, PrepError> {
        validate(features, labels)?;

        let n_classes = labels.iter().max().map_or(0, |m| m + 1);
        let mut members: Vec<Vec<usize>> = vec![Vec::new(); n_classes];
        for (i, &label) in labels.iter().enumerate() {
            members[label].push(i);
        }
        let target = members.iter().map(Vec::len).max().unwrap_or(0);

        let mut out_features = features.to_vec();
        let mut out_labels = labels.to_vec();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        for (class, rows) in members.iter().enumerate() {
            let count = rows.len();
            if count == 0 || count == target {
                continue;
            }
            let need = target - count;
            let class_rows: Vec<&[f64]> = rows.iter().map(|&i| features[i].as_slice()).collect();

            if count == 1 {
                warn!(class, need, "single-row class; duplicating instead of interpolating");
                out_features.extend(std::iter::repeat_n(class_rows[0].to_vec(), need));
                out_labels.extend(std::iter::repeat_n(class, need));
                continue;
            }

            let k = self.k_neighbors.min(count - 1);
            if k < self.k_neighbors {
                warn!(class, count, k, "class smaller than k_neighbors; using fewer neighbours");
            }
            let neighbours = nearest_neighbours(&class_rows, k);

            for _ in 0..need {
                let i = rng.gen_range(0..count);
                let j = neighbours[i][rng.gen_range(0..k)];
                let gap: f64 = rng.r#gen();
                out_features.push(interpolate(class_rows[i], class_rows[j], gap));
            }
            out_labels.extend(std::iter::repeat_n(class, need));
            debug!(class, before = count, after = target, "class oversampled");
        }

        let n_synthetic = out_labels.len() - labels.len();
        info!(n_synthetic, per_class = target, "resampling complete");
        Ok(Resampled {
            features: out_features,
            labels: out_labels,
            n_synthetic,
        })
    }
}

fn validate(features: &[Vec<f64>], labels: &[usize]) -> Result<(), PrepError> {
    let n_features = features.first().ok_or(PrepError::EmptyDataset)?.len();
    if labels.len() != features.len() {
        return Err(PrepError::LabelCountMismatch {
            n_samples: features.len(),
            n_labels: labels.len(),
        });
    }
    for (row_index, row) in features.iter().enumerate() {
        if row.len() != n_features {
            return Err(PrepError::RaggedRow {
                row_index,
                expected: n_features,
                got: row.len(),
            });
        }
        if let Some(column) = row.iter().position(|v| !v.is_finite()) {
            return Err(PrepError::NonFiniteValue { row_index, column });
        }
    }
    Ok(())
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

/// For each row, the positions of its `k` closest other rows (ties by position).
fn nearest_neighbours(rows: &[&[f64]], k: usize) -> Vec<Vec<usize>> {
    rows.par_iter()
        .enumerate()
        .map(|(i, row)| {
            let mut dists: Vec<(f64, usize)> = rows
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(j, other)| (squared_distance(row, other), j))
                .collect();
            dists.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            dists.into_iter().take(k).map(|(_, j)| j).collect()
        })
        .collect()
}

fn interpolate(from: &[f64], to: &[f64], gap: f64) -> Vec<f64> {
    from.iter().zip(to).map(|(a, b)| a + gap * (b - a)).collect()
}
