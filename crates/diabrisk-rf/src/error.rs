use std::path::PathBuf;

/// Errors from forest configuration, training, prediction and model files.
#[derive(Debug, thiserror::Error)]
pub enum RfError {
    /// Returned when the forest is configured with zero trees.
    #[error("a forest needs at least one tree, got {n_trees}")]
    InvalidTreeCount {
        /// The rejected tree count.
        n_trees: usize,
    },

    /// Returned when `max_depth` is `Some(0)`.
    #[error("max_depth must be at least 1 when set, got {max_depth}")]
    InvalidMaxDepth {
        /// The rejected depth limit.
        max_depth: usize,
    },

    /// Returned when `min_samples_split` is below 2.
    #[error("min_samples_split must be at least 2, got {min_samples_split}")]
    InvalidMinSamplesSplit {
        /// The rejected value.
        min_samples_split: usize,
    },

    /// Returned when `min_samples_leaf` is zero.
    #[error("min_samples_leaf must be at least 1, got {min_samples_leaf}")]
    InvalidMinSamplesLeaf {
        /// The rejected value.
        min_samples_leaf: usize,
    },

    /// Returned when the feature subsample size resolves outside `[1, n_features]`.
    #[error("max_features resolved to {max_features}, must be in [1, {n_features}]")]
    InvalidMaxFeatures {
        /// The resolved subsample size.
        max_features: usize,
        /// Number of feature columns in the training data.
        n_features: usize,
    },

    /// Returned when training data has no rows.
    #[error("training dataset has zero samples")]
    EmptyDataset,

    /// Returned when training rows have no columns.
    #[error("training dataset has zero feature columns")]
    ZeroFeatures,

    /// Returned when the label vector and the feature matrix disagree in length.
    #[error("got {n_labels} labels for {n_samples} samples")]
    LabelCountMismatch {
        /// Number of feature rows.
        n_samples: usize,
        /// Number of labels.
        n_labels: usize,
    },

    /// Returned when the feature-name list does not cover every column.
    #[error("got {n_names} feature names for {n_features} feature columns")]
    FeatureNameMismatch {
        /// Number of feature columns.
        n_features: usize,
        /// Number of names supplied.
        n_names: usize,
    },

    /// Returned when a training row is shorter or longer than the first row.
    #[error("sample {sample_index} has {got} features, expected {expected}")]
    FeatureCountMismatch {
        /// Column count of the first row.
        expected: usize,
        /// Column count of the offending row.
        got: usize,
        /// Zero-based index of the offending row.
        sample_index: usize,
    },

    /// Returned when a prediction input has the wrong number of features.
    #[error("prediction input has {got} features, model expects {expected}")]
    PredictionFeatureMismatch {
        /// Feature count the model was trained on.
        expected: usize,
        /// Feature count of the input.
        got: usize,
    },

    /// Returned when a training value is NaN or infinite.
    #[error("non-finite value at sample {sample_index}, feature {feature_index}")]
    NonFiniteValue {
        /// Zero-based row index.
        sample_index: usize,
        /// Zero-based column index.
        feature_index: usize,
    },

    /// Returned when predicted and true label vectors have different lengths.
    #[error("got {n_predicted} predictions for {n_true} true labels")]
    PredictionCountMismatch {
        /// Number of true labels.
        n_true: usize,
        /// Number of predictions.
        n_predicted: usize,
    },

    /// Returned when a label is outside `[0, n_classes)` in metric computation.
    #[error("label {label} is out of range for {n_classes} classes")]
    LabelOutOfRange {
        /// The offending label.
        label: usize,
        /// Number of classes of the metric.
        n_classes: usize,
    },

    /// Returned when encoding the model fails.
    #[error("failed to serialize model")]
    SerializeModel {
        /// Underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when decoding the model file fails.
    #[error("failed to deserialize model from {path}")]
    DeserializeModel {
        /// Path of the model file.
        path: PathBuf,
        /// Underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when the model file cannot be written.
    #[error("failed to write model to {path}")]
    WriteModel {
        /// Destination path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the model file cannot be read.
    #[error("failed to read model from {path}")]
    ReadModel {
        /// Source path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the model file was written by an incompatible format version.
    #[error("incompatible model version in {path}: expected {expected}, found {found}")]
    IncompatibleModelVersion {
        /// Version this build reads.
        expected: u32,
        /// Version found in the file.
        found: u32,
        /// Path of the model file.
        path: PathBuf,
    },
}
