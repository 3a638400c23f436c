//! Preprocessing for tabular classification data.
//!
//! Column-mean imputation, a seeded stratified train/test split, standard
//! scaling with a persisted scaler, and SMOTE oversampling of minority classes.

mod error;
mod impute;
mod scaler;
mod smote;
mod split;

pub use error::PrepError;
pub use impute::{MeanImputer, fill_with_column_means};
pub use scaler::StandardScaler;
pub use smote::{Resampled, SmoteConfig};
pub use split::{StratifiedSplit, TrainTestSplit};
