//! Output directory layout and the JSON training report.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::TrainingReport;
use crate::schema::{MODEL_FILE, REPORT_FILE, SCALER_FILE};

/// Owns the directory a training run writes into.
///
/// Creates the output directory on construction if it does not exist. The
/// model and scaler are written by their own crates; this type only hands
/// out their paths and writes the report.
pub struct ArtifactWriter {
    output_dir: PathBuf,
}

impl ArtifactWriter {
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display()))]
    pub fn new(output_dir: &Path) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
        })
    }

    /// `{output_dir}/diabetes_random_forest_balanced.bin`
    #[must_use]
    pub fn model_path(&self) -> PathBuf {
        self.output_dir.join(MODEL_FILE)
    }

    /// `{output_dir}/scaler.bin`
    #[must_use]
    pub fn scaler_path(&self) -> PathBuf {
        self.output_dir.join(SCALER_FILE)
    }

    #[must_use]
    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(REPORT_FILE)
    }

    /// Write `report` as pretty-printed JSON to `{output_dir}/training_report.json`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::SerializeReport`] | JSON encoding failed |
    /// | [`IoError::WriteFile`] | file write failed |
    #[instrument(skip_all)]
    pub fn write_report(&self, report: &TrainingReport) -> Result<PathBuf, IoError> {
        let path = self.report_path();
        let json = serde_json::to_string_pretty(report)
            .map_err(|source| IoError::SerializeReport { source })?;
        fs::write(&path, &json).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;
        info!(path = %path.display(), "training report written");
        Ok(path)
    }
}
