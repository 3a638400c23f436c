//! Random forest classification: train, predict, evaluate, persist.
//!
//! CART trees with Gini splits, grown in parallel with rayon on
//! bootstrap samples, averaged leaf probabilities for prediction, and a
//! versioned bincode model format.

mod config;
mod error;
mod forest;
mod importance;
mod metrics;
mod node;
mod predict;
mod serialize;
mod split;
mod tree;

pub use config::{ForestConfig, MaxFeatures};
pub use error::RfError;
pub use forest::{RandomForest, TrainedForest};
pub use importance::RankedFeature;
pub use metrics::{ClassMetrics, ClassificationReport, ConfusionMatrix};
pub use node::{Node, NodeId};
pub use predict::ClassProbabilities;
pub use tree::{DecisionTree, TreeConfig};
