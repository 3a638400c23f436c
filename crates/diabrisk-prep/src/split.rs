//! Stratified train/test split.
//!
//! The test set holds `ceil(fraction * n)` rows. Each class contributes in
//! proportion to its size, with leftover slots handed out by largest
//! fractional remainder. Every class keeps at least one row on each side.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument};

use crate::error::PrepError;

/// Configuration for [`StratifiedSplit::split`].
#[derive(Debug, Clone)]
pub struct StratifiedSplit {
    test_fraction: f64,
    seed: u64,
}

/// Row indices on each side of a split, both in ascending order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

impl TrainTestSplit {
    /// Copy the rows at `indices` out of `items`.
    #[must_use]
    pub fn select<T: Clone>(items: &[T], indices: &[usize]) -> Vec<T> {
        indices.iter().map(|&i| items[i].clone()).collect()
    }
}

impl StratifiedSplit {
    /// # Errors
    ///
    /// Returns [`PrepError::InvalidTestFraction`] unless `0 < test_fraction < 1`.
    pub fn new(test_fraction: f64) -> Result<Self, PrepError> {
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(PrepError::InvalidTestFraction {
                fraction: test_fraction,
            });
        }
        Ok(Self {
            test_fraction,
            seed: 42,
        })
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn test_fraction(&self) -> f64 {
        self.test_fraction
    }

    /// Partition row indices `0..labels.len()` by class.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`PrepError::EmptyDataset`] | no labels |
    /// | [`PrepError::TooFewClassMembers`] | a present class has a single row |
    /// | [`PrepError::TrainSetTooSmall`] | fewer training rows than classes would remain |
    #[instrument(skip_all, fields(n_samples = labels.len(), test_fraction = self.test_fraction))]
    pub fn split(&self, labels: &[usize]) -> Result<TrainTestSplit, PrepError> {
        if labels.is_empty() {
            return Err(PrepError::EmptyDataset);
        }
        let n = labels.len();
        let n_classes = labels.iter().max().map_or(0, |m| m + 1);

        let mut members: Vec<Vec<usize>> = vec![Vec::new(); n_classes];
        for (i, &label) in labels.iter().enumerate() {
            members[label].push(i);
        }
        let present: Vec<usize> = (0..n_classes).filter(|&c| !members[c].is_empty()).collect();
        if let Some(&class) = present.iter().find(|&&c| members[c].len() < 2) {
            return Err(PrepError::TooFewClassMembers { class, count: 1 });
        }

        let n_test = (self.test_fraction * n as f64).ceil() as usize;
        let n_train = n - n_test;
        if n_train < present.len() || n_test < present.len() {
            return Err(PrepError::TrainSetTooSmall {
                fraction: self.test_fraction,
                n_train,
                n_classes: present.len(),
            });
        }

        let counts: Vec<usize> = members.iter().map(Vec::len).collect();
        let quotas = allocate(&counts, n_test);

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut train = Vec::with_capacity(n_train);
        let mut test = Vec::with_capacity(n_test);
        for (class, rows) in members.iter_mut().enumerate() {
            rows.shuffle(&mut rng);
            let (to_test, to_train) = rows.split_at(quotas[class]);
            test.extend_from_slice(to_test);
            train.extend_from_slice(to_train);
            debug!(class, n_train = to_train.len(), n_test = to_test.len(), "class allocated");
        }
        train.sort_unstable();
        test.sort_unstable();
        Ok(TrainTestSplit { train, test })
    }
}

/// Per-class test counts summing to `n_test`, each in `1..count` for present classes.
fn allocate(counts: &[usize], n_test: usize) -> Vec<usize> {
    let n: usize = counts.iter().sum();
    let exact: Vec<f64> = counts
        .iter()
        .map(|&c| c as f64 * n_test as f64 / n as f64)
        .collect();

    let mut quotas: Vec<usize> = counts
        .iter()
        .zip(&exact)
        .map(|(&c, &e)| if c == 0 { 0 } else { (e.floor() as usize).clamp(1, c - 1) })
        .collect();

    let mut order: Vec<usize> = (0..counts.len()).collect();
    // Largest remainder first; ties go to the lower class index.
    order.sort_by(|&a, &b| {
        let ra = exact[a] - exact[a].floor();
        let rb = exact[b] - exact[b].floor();
        rb.total_cmp(&ra).then(a.cmp(&b))
    });

    let mut assigned: usize = quotas.iter().sum();
    while assigned < n_test {
        let mut progressed = false;
        for &c in &order {
            if assigned == n_test {
                break;
            }
            if counts[c] > 0 && quotas[c] < counts[c] - 1 {
                quotas[c] += 1;
                assigned += 1;
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
    }
    while assigned > n_test {
        let mut progressed = false;
        for &c in order.iter().rev() {
            if assigned == n_test {
                break;
            }
            if quotas[c] > 1 {
                quotas[c] -= 1;
                assigned -= 1;
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
    }
    quotas
}
