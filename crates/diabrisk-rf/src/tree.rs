use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{instrument, trace};

use crate::error::RfError;
use crate::node::{Node, NodeId};
use crate::split::{SplitSearch, class_counts};

/// Hyperparameters for growing one CART tree.
///
/// | Parameter           | Default           |
/// |---------------------|-------------------|
/// | `max_depth`         | `None`            |
/// | `min_samples_split` | 2                 |
/// | `min_samples_leaf`  | 1                 |
/// | `max_features`      | `None` (all)      |
/// | `seed`              | 42                |
#[derive(Debug, Clone)]
pub struct TreeConfig {
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_split: usize,
    pub(crate) min_samples_leaf: usize,
    pub(crate) max_features: Option<usize>,
    pub(crate) seed: u64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            seed: 42,
        }
    }
}

impl TreeConfig {
    /// Create a config with the defaults listed above.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit depth; the root is depth 0, so `Some(1)` allows a single split.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    #[must_use]
    pub fn with_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf;
        self
    }

    /// Number of columns drawn at each node. `None` draws all of them.
    #[must_use]
    pub fn with_max_features(mut self, max_features: Option<usize>) -> Self {
        self.max_features = max_features;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Grow a tree on row-major `features` with zero-based `labels`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::EmptyDataset`] | no rows |
    /// | [`RfError::ZeroFeatures`] | rows have no columns |
    /// | [`RfError::LabelCountMismatch`] | `labels.len() != features.len()` |
    /// | [`RfError::FeatureCountMismatch`] | ragged rows |
    /// | [`RfError::NonFiniteValue`] | NaN or infinite cell |
    /// | [`RfError::InvalidMaxDepth`] | `max_depth == Some(0)` |
    /// | [`RfError::InvalidMinSamplesSplit`] | `min_samples_split < 2` |
    /// | [`RfError::InvalidMinSamplesLeaf`] | `min_samples_leaf == 0` |
    /// | [`RfError::InvalidMaxFeatures`] | `max_features` outside `[1, n_features]` |
    #[instrument(skip_all, fields(n_samples = features.len()))]
    pub fn fit(&self, features: &[Vec<f64>], labels: &[usize]) -> Result<DecisionTree, RfError> {
        let n_features = crate::forest::validate_training_data(features, labels)?;
        self.validate(n_features)?;
        let n_classes = labels.iter().max().map_or(1, |&m| m + 1);

        let columns: Vec<Vec<f64>> = (0..n_features)
            .map(|f| features.iter().map(|row| row[f]).collect())
            .collect();
        let rows: Vec<usize> = (0..features.len()).collect();
        Ok(self.grow(&columns, labels, &rows, n_classes))
    }

    pub(crate) fn validate(&self, n_features: usize) -> Result<(), RfError> {
        if self.max_depth == Some(0) {
            return Err(RfError::InvalidMaxDepth { max_depth: 0 });
        }
        if self.min_samples_split < 2 {
            return Err(RfError::InvalidMinSamplesSplit {
                min_samples_split: self.min_samples_split,
            });
        }
        if self.min_samples_leaf == 0 {
            return Err(RfError::InvalidMinSamplesLeaf { min_samples_leaf: 0 });
        }
        let max_features = self.max_features.unwrap_or(n_features);
        if max_features == 0 || max_features > n_features {
            return Err(RfError::InvalidMaxFeatures {
                max_features,
                n_features,
            });
        }
        Ok(())
    }

    /// Grow on pre-validated column-major data restricted to `rows`.
    ///
    /// `rows` may repeat indices, which is how bootstrap samples are passed.
    pub(crate) fn grow(
        &self,
        columns: &[Vec<f64>],
        labels: &[usize],
        rows: &[usize],
        n_classes: usize,
    ) -> DecisionTree {
        let n_features = columns.len();
        let mut grower = Grower {
            config: self,
            search: SplitSearch {
                columns,
                labels,
                n_classes,
                min_samples_leaf: self.min_samples_leaf,
            },
            max_features: self.max_features.unwrap_or(n_features),
            rng: ChaCha8Rng::seed_from_u64(self.seed),
            nodes: Vec::new(),
        };
        grower.node(rows, 0);
        trace!(n_nodes = grower.nodes.len(), "tree grown");

        DecisionTree {
            nodes: grower.nodes,
            n_features,
            n_classes,
        }
    }
}

struct Grower<'a> {
    config: &'a TreeConfig,
    search: SplitSearch<'a>,
    max_features: usize,
    rng: ChaCha8Rng,
    nodes: Vec<Node>,
}

impl Grower<'_> {
    fn node(&mut self, rows: &[usize], depth: usize) -> NodeId {
        let n = rows.len();
        let counts = class_counts(self.search.labels, rows, self.search.n_classes);
        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        let at_depth_limit = self.config.max_depth.is_some_and(|d| depth >= d);

        let split = if pure || at_depth_limit || n < self.config.min_samples_split {
            None
        } else {
            self.search.best(rows, self.max_features, &mut self.rng)
        };

        let Some(split) = split else {
            let proba = counts.iter().map(|&c| c as f64 / n as f64).collect();
            self.nodes.push(Node::Leaf { proba, n_samples: n });
            return NodeId::new(self.nodes.len() - 1);
        };

        // Reserve this node's slot before the children so the root stays at 0.
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(Node::Leaf {
            proba: Vec::new(),
            n_samples: n,
        });
        let left = self.node(&split.left, depth + 1);
        let right = self.node(&split.right, depth + 1);
        self.nodes[id.index()] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
            n_samples: n,
            gain: split.gain,
        };
        id
    }
}

/// A fitted CART classification tree stored as a node arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) n_features: usize,
    pub(crate) n_classes: usize,
}

impl DecisionTree {
    /// Class probabilities of the leaf that `row` falls into.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] if `row` has the wrong length.
    pub fn predict_proba(&self, row: &[f64]) -> Result<&[f64], RfError> {
        if row.len() != self.n_features {
            return Err(RfError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: row.len(),
            });
        }
        Ok(self.leaf_proba(row))
    }

    /// Most probable class for `row`; ties go to the lower class index.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] if `row` has the wrong length.
    pub fn predict(&self, row: &[f64]) -> Result<usize, RfError> {
        Ok(crate::predict::argmax(self.predict_proba(row)?))
    }

    pub(crate) fn leaf_proba(&self, row: &[f64]) -> &[f64] {
        let mut id = NodeId::ROOT;
        loop {
            match &self.nodes[id.index()] {
                Node::Leaf { proba, .. } => return proba,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    id = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    /// Mean-decrease-in-impurity importance per feature, normalized to sum to 1.
    ///
    /// A tree that is a single leaf reports all zeros.
    #[must_use]
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut totals = vec![0.0; self.n_features];
        for node in &self.nodes {
            if let Node::Split { feature, gain, .. } = node {
                totals[*feature] += gain;
            }
        }
        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            totals.iter_mut().for_each(|t| *t /= sum);
        }
        totals
    }

    /// Depth of the deepest leaf; a lone root leaf has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(NodeId::ROOT, 0usize)];
        while let Some((id, d)) = stack.pop() {
            match &self.nodes[id.index()] {
                Node::Leaf { .. } => deepest = deepest.max(d),
                Node::Split { left, right, .. } => {
                    stack.push((*left, d + 1));
                    stack.push((*right, d + 1));
                }
            }
        }
        deepest
    }

    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// The node arena; index 0 is the root.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_blobs() -> (Vec<Vec<f64>>, Vec<usize>) {
        let features = vec![
            vec![1.0, 0.0],
            vec![2.0, 0.0],
            vec![3.0, 0.0],
            vec![10.0, 0.0],
            vec![11.0, 0.0],
            vec![12.0, 0.0],
        ];
        (features, vec![0, 0, 0, 1, 1, 1])
    }

    #[test]
    fn single_class_gives_one_leaf() {
        let features = vec![vec![1.0], vec![2.0], vec![3.0]];
        let tree = TreeConfig::new().fit(&features, &[0, 0, 0]).unwrap();
        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.predict_proba(&[9.0]).unwrap(), &[1.0]);
    }

    #[test]
    fn separates_two_blobs() {
        let (features, labels) = two_blobs();
        let tree = TreeConfig::new().fit(&features, &labels).unwrap();
        assert_eq!(tree.predict(&[2.5, 0.0]).unwrap(), 0);
        assert_eq!(tree.predict(&[10.5, 0.0]).unwrap(), 1);
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.n_leaves(), 2);
    }

    #[test]
    fn xor_needs_two_levels() {
        let features = vec![vec![0.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 1.0]];
        let labels = vec![0, 1, 1, 0];
        let tree = TreeConfig::new().fit(&features, &labels).unwrap();
        assert!(tree.depth() >= 2);
        for (row, &label) in features.iter().zip(&labels) {
            assert_eq!(tree.predict(row).unwrap(), label);
        }
    }

    #[test]
    fn depth_limit_yields_mixed_leaves() {
        let features = vec![vec![0.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 1.0]];
        let labels = vec![0, 1, 1, 0];
        let tree = TreeConfig::new()
            .with_max_depth(Some(1))
            .fit(&features, &labels)
            .unwrap();
        assert!(tree.depth() <= 1);
        let proba = tree.predict_proba(&[0.0, 0.0]).unwrap();
        assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn importances_are_normalized() {
        let (features, labels) = two_blobs();
        let tree = TreeConfig::new().fit(&features, &labels).unwrap();
        let imp = tree.feature_importances();
        assert!((imp.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert_eq!(imp[1], 0.0);
    }

    #[test]
    fn neighbouring_doubles_grow_finite_leaves_without_depth_limit() {
        let features = vec![vec![1.0 + f64::EPSILON], vec![1.0 + 2.0 * f64::EPSILON]];
        let tree = TreeConfig::new().fit(&features, &[0, 1]).unwrap();
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.n_leaves(), 2);
        assert_eq!(tree.predict_proba(&features[0]).unwrap(), &[1.0, 0.0]);
        assert_eq!(tree.predict_proba(&features[1]).unwrap(), &[0.0, 1.0]);
        assert_eq!(tree.predict_proba(&[2.0]).unwrap(), &[0.0, 1.0]);
        for node in tree.nodes() {
            if let Node::Leaf { proba, n_samples } = node {
                assert!(*n_samples > 0);
                assert!(proba.iter().all(|p| p.is_finite()));
            }
        }
    }

    #[test]
    fn rejects_wrong_row_length_at_prediction() {
        let (features, labels) = two_blobs();
        let tree = TreeConfig::new().fit(&features, &labels).unwrap();
        let err = tree.predict(&[1.0]).unwrap_err();
        assert!(matches!(
            err,
            RfError::PredictionFeatureMismatch { expected: 2, got: 1 }
        ));
    }

    #[test]
    fn rejects_bad_config_and_data() {
        let (features, labels) = two_blobs();
        assert!(matches!(
            TreeConfig::new().with_max_depth(Some(0)).fit(&features, &labels),
            Err(RfError::InvalidMaxDepth { .. })
        ));
        assert!(matches!(
            TreeConfig::new().with_min_samples_split(1).fit(&features, &labels),
            Err(RfError::InvalidMinSamplesSplit { .. })
        ));
        assert!(matches!(
            TreeConfig::new().with_max_features(Some(3)).fit(&features, &labels),
            Err(RfError::InvalidMaxFeatures { .. })
        ));
        assert!(matches!(
            TreeConfig::new().fit(&[vec![f64::NAN]], &[0]),
            Err(RfError::NonFiniteValue { .. })
        ));
        assert!(matches!(
            TreeConfig::new().fit(&[], &[]),
            Err(RfError::EmptyDataset)
        ));
    }
}
