//! Versioned bincode model files.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::RfError;
use crate::forest::RandomForest;

/// Bump when the serialized layout of [`RandomForest`] changes.
const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    format_version: u32,
    forest: &'a RandomForest,
}

#[derive(Deserialize)]
struct Envelope {
    format_version: u32,
    forest: RandomForest,
}

/// Only the leading version field; read first so a layout change yields a
/// version error instead of a decode error.
#[derive(Deserialize)]
struct VersionProbe {
    format_version: u32,
}

impl RandomForest {
    /// Write the forest to `path`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::SerializeModel`] | bincode encoding failed |
    /// | [`RfError::WriteModel`] | file write failed |
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), RfError> {
        let path = path.as_ref();
        let bytes = bincode::serialize(&EnvelopeRef {
            format_version: FORMAT_VERSION,
            forest: self,
        })
        .map_err(|source| RfError::SerializeModel { source })?;

        std::fs::write(path, &bytes).map_err(|source| RfError::WriteModel {
            path: path.to_path_buf(),
            source,
        })?;
        info!(size_bytes = bytes.len(), n_trees = self.n_trees(), "model saved");
        Ok(())
    }

    /// Read a forest written by [`RandomForest::save`].
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::ReadModel`] | file read failed |
    /// | [`RfError::IncompatibleModelVersion`] | written by another format version |
    /// | [`RfError::DeserializeModel`] | bytes are not a model |
    #[instrument(fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RfError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| RfError::ReadModel {
            path: path.to_path_buf(),
            source,
        })?;

        let probe: VersionProbe =
            bincode::deserialize(&bytes).map_err(|source| RfError::DeserializeModel {
                path: path.to_path_buf(),
                source,
            })?;
        if probe.format_version != FORMAT_VERSION {
            return Err(RfError::IncompatibleModelVersion {
                expected: FORMAT_VERSION,
                found: probe.format_version,
                path: path.to_path_buf(),
            });
        }

        let envelope: Envelope =
            bincode::deserialize(&bytes).map_err(|source| RfError::DeserializeModel {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(
            n_trees = envelope.forest.n_trees(),
            n_features = envelope.forest.n_features(),
            n_classes = envelope.forest.n_classes(),
            "model loaded"
        );
        Ok(envelope.forest)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::config::ForestConfig;

    fn small_forest() -> RandomForest {
        let features = vec![
            vec![1.0, 0.0],
            vec![2.0, 1.0],
            vec![3.0, 0.0],
            vec![10.0, 1.0],
            vec![11.0, 0.0],
            vec![12.0, 1.0],
        ];
        let names = vec!["x".to_string(), "y".to_string()];
        ForestConfig::new(5)
            .unwrap()
            .fit(&features, &[0, 0, 0, 1, 1, 1], &names)
            .unwrap()
            .into_forest()
    }

    #[test]
    fn save_then_load_is_identical() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.bin");
        let forest = small_forest();
        forest.save(&path).unwrap();

        let loaded = RandomForest::load(&path).unwrap();
        assert_eq!(loaded, forest);
        assert_eq!(loaded.feature_names(), &["x", "y"]);
        assert_eq!(
            loaded.predict_proba(&[2.5, 0.0]).unwrap(),
            forest.predict_proba(&[2.5, 0.0]).unwrap()
        );
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = TempDir::new().unwrap();
        let err = RandomForest::load(dir.path().join("absent.bin")).unwrap_err();
        assert!(matches!(err, RfError::ReadModel { .. }));
    }

    #[test]
    fn garbage_is_decode_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("garbage.bin");
        std::fs::write(&path, b"xy").unwrap();
        assert!(matches!(
            RandomForest::load(&path),
            Err(RfError::DeserializeModel { .. })
        ));
    }

    #[test]
    fn other_version_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("future.bin");
        std::fs::write(&path, bincode::serialize(&(FORMAT_VERSION + 1)).unwrap()).unwrap();
        assert!(matches!(
            RandomForest::load(&path),
            Err(RfError::IncompatibleModelVersion { found: 2, .. })
        ));
    }
}
