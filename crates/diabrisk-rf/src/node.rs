use std::fmt;

use serde::{Deserialize, Serialize};

/// Position of a node inside a tree's node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    /// The root of every tree lives at arena slot 0.
    pub const ROOT: NodeId = NodeId(0);

    pub(crate) fn new(index: usize) -> Self {
        debug_assert!(u32::try_from(index).is_ok(), "node arena overflow");
        Self(index as u32)
    }

    /// Return the arena slot as a `usize`.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One node of a fitted decision tree.
///
/// Children are referenced by [`NodeId`] into the owning tree's arena, so a
/// whole tree serializes as a flat `Vec<Node>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// Interior node: rows with `row[feature] <= threshold` go left.
    Split {
        /// Column tested at this node.
        feature: usize,
        /// Midpoint between the two neighbouring training values.
        threshold: f64,
        /// Child for `row[feature] <= threshold`.
        left: NodeId,
        /// Child for `row[feature] > threshold`.
        right: NodeId,
        /// Training rows that reached this node.
        n_samples: usize,
        /// Weighted impurity decrease, `n · I(parent) - n_l · I(l) - n_r · I(r)`.
        gain: f64,
    },
    /// Terminal node holding the class frequencies of its training rows.
    Leaf {
        /// Class probabilities, one entry per class, summing to 1.
        proba: Vec<f64>,
        /// Training rows that reached this leaf.
        n_samples: usize,
    },
}

impl Node {
    /// Return `true` for leaves.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    /// Number of training rows that reached this node.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        match self {
            Node::Split { n_samples, .. } | Node::Leaf { n_samples, .. } => *n_samples,
        }
    }
}
