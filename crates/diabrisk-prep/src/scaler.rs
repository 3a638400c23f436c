//! Per-feature standardisation and its on-disk form.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::PrepError;

/// Bump when the serialized layout of [`StandardScaler`] changes.
const FORMAT_VERSION: u32 = 1;

/// Maps each feature to `(x - mean) / scale`.
///
/// `scale` is the population standard deviation of the training column, or
/// 1.0 when that column is constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    feature_names: Vec<String>,
    means: Vec<f64>,
    scales: Vec<f64>,
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    format_version: u32,
    scaler: &'a StandardScaler,
}

#[derive(Deserialize)]
struct Envelope {
    format_version: u32,
    scaler: StandardScaler,
}

#[derive(Deserialize)]
struct VersionProbe {
    format_version: u32,
}

impl StandardScaler {
    /// Learn column means and standard deviations from `features`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`PrepError::EmptyDataset`] | no rows |
    /// | [`PrepError::FeatureNameMismatch`] | `feature_names.len()` differs from the column count |
    /// | [`PrepError::RaggedRow`] | rows differ in length |
    /// | [`PrepError::NonFiniteValue`] | a value is NaN or infinite |
    #[instrument(skip_all, fields(n_rows = features.len()))]
    pub fn fit(features: &[Vec<f64>], feature_names: &[String]) -> Result<Self, PrepError> {
        let n_features = features.first().ok_or(PrepError::EmptyDataset)?.len();
        if feature_names.len() != n_features {
            return Err(PrepError::FeatureNameMismatch {
                n_features,
                n_names: feature_names.len(),
            });
        }
        for (row_index, row) in features.iter().enumerate() {
            if row.len() != n_features {
                return Err(PrepError::RaggedRow {
                    row_index,
                    expected: n_features,
                    got: row.len(),
                });
            }
            if let Some(column) = row.iter().position(|v| !v.is_finite()) {
                return Err(PrepError::NonFiniteValue { row_index, column });
            }
        }

        let n = features.len() as f64;
        let mut means = vec![0.0; n_features];
        for row in features {
            for (m, v) in means.iter_mut().zip(row) {
                *m += v;
            }
        }
        means.iter_mut().for_each(|m| *m /= n);

        let mut variances = vec![0.0; n_features];
        for row in features {
            for ((var, v), m) in variances.iter_mut().zip(row).zip(&means) {
                *var += (v - m).powi(2);
            }
        }
        let scales: Vec<f64> = variances
            .iter()
            .map(|var| {
                let std = (var / n).sqrt();
                if std > 0.0 { std } else { 1.0 }
            })
            .collect();

        debug!(
            n_constant = variances.iter().filter(|&&v| v == 0.0).count(),
            "scaler fitted"
        );
        Ok(Self {
            feature_names: feature_names.to_vec(),
            means,
            scales,
        })
    }

    /// Standardise one row.
    ///
    /// # Errors
    ///
    /// Returns [`PrepError::DimensionMismatch`] if `row` has the wrong length.
    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>, PrepError> {
        if row.len() != self.means.len() {
            return Err(PrepError::DimensionMismatch {
                expected: self.means.len(),
                got: row.len(),
            });
        }
        Ok(row
            .iter()
            .zip(self.means.iter().zip(&self.scales))
            .map(|(x, (m, s))| (x - m) / s)
            .collect())
    }

    /// Standardise every row.
    ///
    /// # Errors
    ///
    /// Returns [`PrepError::DimensionMismatch`] for the first row of the wrong length.
    pub fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, PrepError> {
        rows.iter().map(|row| self.transform_row(row)).collect()
    }

    #[must_use]
    pub fn n_features(&self) -> usize {
        self.means.len()
    }

    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    #[must_use]
    pub fn means(&self) -> &[f64] {
        &self.means
    }

    #[must_use]
    pub fn scales(&self) -> &[f64] {
        &self.scales
    }

    /// Write the scaler to `path`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`PrepError::SerializeScaler`] | bincode encoding failed |
    /// | [`PrepError::WriteScaler`] | file write failed |
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PrepError> {
        let path = path.as_ref();
        let bytes = bincode::serialize(&EnvelopeRef {
            format_version: FORMAT_VERSION,
            scaler: self,
        })
        .map_err(|source| PrepError::SerializeScaler { source })?;
        std::fs::write(path, &bytes).map_err(|source| PrepError::WriteScaler {
            path: path.to_path_buf(),
            source,
        })?;
        info!(size_bytes = bytes.len(), "scaler saved");
        Ok(())
    }

    /// Read a scaler written by [`StandardScaler::save`].
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`PrepError::ReadScaler`] | file read failed |
    /// | [`PrepError::IncompatibleScalerVersion`] | written by another format version |
    /// | [`PrepError::DeserializeScaler`] | bytes are not a scaler |
    #[instrument(fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PrepError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| PrepError::ReadScaler {
            path: path.to_path_buf(),
            source,
        })?;
        let decode_err = |source: Box<bincode::ErrorKind>| PrepError::DeserializeScaler {
            path: path.to_path_buf(),
            source,
        };

        let probe: VersionProbe = bincode::deserialize(&bytes).map_err(decode_err)?;
        if probe.format_version != FORMAT_VERSION {
            return Err(PrepError::IncompatibleScalerVersion {
                expected: FORMAT_VERSION,
                found: probe.format_version,
                path: path.to_path_buf(),
            });
        }
        let envelope: Envelope = bincode::deserialize(&bytes).map_err(decode_err)?;
        debug!(n_features = envelope.scaler.n_features(), "scaler loaded");
        Ok(envelope.scaler)
    }
}
