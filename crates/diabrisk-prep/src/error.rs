use std::path::PathBuf;

/// Errors from preprocessing steps and scaler files.
#[derive(Debug, thiserror::Error)]
pub enum PrepError {
    /// Returned when an input matrix has no rows.
    #[error("dataset has zero samples")]
    EmptyDataset,

    /// Returned when a row's length differs from the first row's.
    #[error("row {row_index} has {got} columns, expected {expected}")]
    RaggedRow {
        /// Zero-based row index.
        row_index: usize,
        /// Column count of the first row.
        expected: usize,
        /// Column count of the offending row.
        got: usize,
    },

    /// Returned when a column has no observed value to take a mean from.
    #[error("column {column} has no observed values")]
    AllMissingColumn {
        /// Zero-based column index.
        column: usize,
    },

    /// Returned when a value that must be finite is NaN or infinite.
    #[error("non-finite value at row {row_index}, column {column}")]
    NonFiniteValue {
        /// Zero-based row index.
        row_index: usize,
        /// Zero-based column index.
        column: usize,
    },

    /// Returned when features and labels disagree in length.
    #[error("got {n_labels} labels for {n_samples} samples")]
    LabelCountMismatch {
        /// Number of feature rows.
        n_samples: usize,
        /// Number of labels.
        n_labels: usize,
    },

    /// Returned when the test fraction is not strictly between 0 and 1.
    #[error("test fraction must be in (0, 1), got {fraction}")]
    InvalidTestFraction {
        /// The rejected fraction.
        fraction: f64,
    },

    /// Returned when a class is too small to appear on both sides of a split.
    #[error("class {class} has only {count} member(s); stratified splitting needs at least 2")]
    TooFewClassMembers {
        /// The undersized class.
        class: usize,
        /// Its row count.
        count: usize,
    },

    /// Returned when the split would leave fewer training rows than classes.
    #[error("test fraction {fraction} leaves {n_train} training rows for {n_classes} classes")]
    TrainSetTooSmall {
        /// Requested test fraction.
        fraction: f64,
        /// Training rows that would remain.
        n_train: usize,
        /// Number of classes present.
        n_classes: usize,
    },

    /// Returned when SMOTE is configured with zero neighbours.
    #[error("k_neighbors must be at least 1, got {k_neighbors}")]
    InvalidNeighborCount {
        /// The rejected neighbour count.
        k_neighbors: usize,
    },

    /// Returned when a row passed to a fitted scaler has the wrong length.
    #[error("scaler was fit on {expected} features, got {got}")]
    DimensionMismatch {
        /// Feature count at fit time.
        expected: usize,
        /// Feature count of the input.
        got: usize,
    },

    /// Returned when the feature-name list does not cover every column.
    #[error("got {n_names} feature names for {n_features} columns")]
    FeatureNameMismatch {
        /// Number of columns.
        n_features: usize,
        /// Number of names supplied.
        n_names: usize,
    },

    /// Returned when encoding the scaler fails.
    #[error("failed to serialize scaler")]
    SerializeScaler {
        /// Underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when decoding the scaler file fails.
    #[error("failed to deserialize scaler from {path}")]
    DeserializeScaler {
        /// Path of the scaler file.
        path: PathBuf,
        /// Underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when the scaler file cannot be written.
    #[error("failed to write scaler to {path}")]
    WriteScaler {
        /// Destination path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the scaler file cannot be read.
    #[error("failed to read scaler from {path}")]
    ReadScaler {
        /// Source path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the scaler file was written by an incompatible format version.
    #[error("incompatible scaler version in {path}: expected {expected}, found {found}")]
    IncompatibleScalerVersion {
        /// Version this build reads.
        expected: u32,
        /// Version found in the file.
        found: u32,
        /// Path of the scaler file.
        path: PathBuf,
    },
}
