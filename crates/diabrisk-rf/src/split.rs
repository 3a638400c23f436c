use rand::Rng;

/// Gini impurity `1 - Σ p²` of a node with the given per-class counts.
///
/// An empty node is pure (0.0).
pub(crate) fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let n = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}

/// Threshold between two adjacent sorted values, `value < next`.
///
/// The midpoint rounds up to `next` when the two are neighbouring doubles;
/// `value` is used then so that `next` still falls on the right.
fn boundary(value: f64, next: f64) -> f64 {
    let mid = value / 2.0 + next / 2.0;
    if mid.is_finite() && mid < next { mid } else { value }
}

/// Count labels of the selected rows per class.
pub(crate) fn class_counts(labels: &[usize], rows: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0usize; n_classes];
    for &r in rows {
        counts[labels[r]] += 1;
    }
    counts
}

/// The winning split for one node.
#[derive(Debug, Clone)]
pub(crate) struct Split {
    pub(crate) feature: usize,
    pub(crate) threshold: f64,
    pub(crate) gain: f64,
    pub(crate) left: Vec<usize>,
    pub(crate) right: Vec<usize>,
}

/// Exhaustive threshold search over a random subset of columns.
///
/// `columns` is column-major: `columns[feature][row]`.
pub(crate) struct SplitSearch<'a> {
    pub(crate) columns: &'a [Vec<f64>],
    pub(crate) labels: &'a [usize],
    pub(crate) n_classes: usize,
    pub(crate) min_samples_leaf: usize,
}

impl SplitSearch<'_> {
    /// Find the split with the largest weighted impurity decrease.
    ///
    /// Draws `max_features` distinct columns, sorts the node's rows along
    /// each, and sweeps the boundary left to right with running class
    /// counts. Returns `None` when every candidate column is constant over
    /// `rows` or every boundary violates `min_samples_leaf`.
    pub(crate) fn best(
        &self,
        rows: &[usize],
        max_features: usize,
        rng: &mut impl Rng,
    ) -> Option<Split> {
        let n = rows.len();
        let n_features = self.columns.len();
        if n < 2 || n_features == 0 {
            return None;
        }

        let parent = class_counts(self.labels, rows, self.n_classes);
        let parent_impurity = gini(&parent, n);

        // Partial Fisher-Yates over the column indices.
        let mut candidates: Vec<usize> = (0..n_features).collect();
        let take = max_features.min(n_features);
        for i in 0..take {
            let j = rng.gen_range(i..n_features);
            candidates.swap(i, j);
        }

        let mut best: Option<(usize, f64, f64)> = None;
        let mut sorted: Vec<(f64, usize)> = Vec::with_capacity(n);

        for &feature in &candidates[..take] {
            let column = &self.columns[feature];
            sorted.clear();
            sorted.extend(rows.iter().map(|&r| (column[r], self.labels[r])));
            sorted.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

            let mut left = vec![0usize; self.n_classes];
            let mut right = parent.clone();

            for i in 0..n - 1 {
                let (value, label) = sorted[i];
                left[label] += 1;
                right[label] -= 1;

                let next = sorted[i + 1].0;
                if value == next {
                    continue;
                }
                let n_left = i + 1;
                let n_right = n - n_left;
                if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                    continue;
                }

                let gain = n as f64 * parent_impurity
                    - n_left as f64 * gini(&left, n_left)
                    - n_right as f64 * gini(&right, n_right);

                if best.is_none_or(|(_, _, g)| gain > g) {
                    best = Some((feature, boundary(value, next), gain));
                }
            }
        }

        let (feature, threshold, gain) = best?;
        let column = &self.columns[feature];
        let (left, right): (Vec<usize>, Vec<usize>) =
            rows.iter().partition(|&&r| column[r] <= threshold);
        if left.is_empty() || right.is_empty() {
            return None;
        }

        Some(Split {
            feature,
            threshold,
            gain,
            left,
            right,
        })
    }
}
