//! Patient CSV schema and reader, artifact paths, and the training report.

mod domain;
mod error;
mod reader;
pub mod schema;
mod writer;

pub use domain::{ClassEntry, FeatureEntry, PatientDataset, TrainingReport, class_counts};
pub use error::IoError;
pub use reader::PatientCsvReader;
pub use writer::ArtifactWriter;
