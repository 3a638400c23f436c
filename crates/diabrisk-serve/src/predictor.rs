//! Scaler + forest inference with the decision threshold.

use std::path::Path;

use diabrisk_io::schema::{self, CLASS_NAMES, POSITIVE_CLASS};
use diabrisk_prep::StandardScaler;
use diabrisk_rf::RandomForest;
use tracing::{info, instrument};

use crate::error::ServeError;

/// Probability at or above which a patient is classified positive.
pub const DECISION_THRESHOLD: f64 = 0.35;

/// Outcome of one [`RiskPredictor::assess`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskAssessment {
    /// Unrounded positive-class probability.
    pub probability: f64,
    pub positive: bool,
}

impl RiskAssessment {
    /// Apply [`DECISION_THRESHOLD`] to a probability in `[0, 1]`.
    ///
    /// # Errors
    ///
    /// [`ServeError::InvalidProbability`] for NaN, infinities and values outside `[0, 1]`.
    pub fn from_probability(probability: f64) -> Result<Self, ServeError> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(ServeError::InvalidProbability { probability });
        }
        Ok(Self {
            probability,
            positive: probability >= DECISION_THRESHOLD,
        })
    }

    /// `"Yes"` or `"No"`.
    #[must_use]
    pub fn label(&self) -> &'static str {
        CLASS_NAMES[usize::from(self.positive)]
    }

    #[must_use]
    pub fn rounded_probability(&self) -> f64 {
        round2(self.probability)
    }
}

/// Round half away from zero to 2 decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Immutable pair of fitted artifacts, checked against the feature schema.
#[derive(Debug, Clone)]
pub struct RiskPredictor {
    scaler: StandardScaler,
    forest: RandomForest,
}

impl RiskPredictor {
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ServeError::FeatureSchemaMismatch`] | scaler or forest fit on other features |
    /// | [`ServeError::NotBinary`] | forest does not have exactly two classes |
    /// | [`ServeError::EmptyForest`] | forest has no trees |
    pub fn new(scaler: StandardScaler, forest: RandomForest) -> Result<Self, ServeError> {
        let expected = schema::feature_names();
        if scaler.feature_names() != expected.as_slice() {
            return Err(ServeError::FeatureSchemaMismatch {
                artifact: "scaler",
                expected,
                found: scaler.feature_names().to_vec(),
            });
        }
        if forest.feature_names() != expected.as_slice() {
            return Err(ServeError::FeatureSchemaMismatch {
                artifact: "model",
                expected,
                found: forest.feature_names().to_vec(),
            });
        }
        if forest.n_classes() != 2 {
            return Err(ServeError::NotBinary {
                n_classes: forest.n_classes(),
            });
        }
        if forest.n_trees() == 0 {
            return Err(ServeError::EmptyForest);
        }
        Ok(Self { scaler, forest })
    }

    /// Load both artifacts from disk and check them.
    ///
    /// # Errors
    ///
    /// [`ServeError::LoadModel`] or [`ServeError::LoadScaler`] when a file
    /// cannot be read, plus every error of [`RiskPredictor::new`].
    #[instrument(fields(model = %model_path.display(), scaler = %scaler_path.display()))]
    pub fn load(model_path: &Path, scaler_path: &Path) -> Result<Self, ServeError> {
        let scaler =
            StandardScaler::load(scaler_path).map_err(|source| ServeError::LoadScaler { source })?;
        let forest =
            RandomForest::load(model_path).map_err(|source| ServeError::LoadModel { source })?;
        let predictor = Self::new(scaler, forest)?;
        info!(
            n_trees = predictor.forest.n_trees(),
            threshold = DECISION_THRESHOLD,
            "predictor ready"
        );
        Ok(predictor)
    }

    /// Scale `row`, average the forest's positive-class probability, apply the threshold.
    ///
    /// # Errors
    ///
    /// [`ServeError::Transform`] or [`ServeError::Predict`] if `row` has the wrong length,
    /// [`ServeError::InvalidProbability`] if the forest yields NaN or a value outside `[0, 1]`.
    pub fn assess(&self, row: &[f64]) -> Result<RiskAssessment, ServeError> {
        let scaled = self
            .scaler
            .transform_row(row)
            .map_err(|source| ServeError::Transform { source })?;
        let probability = self
            .forest
            .predict_proba(&scaled)
            .map_err(|source| ServeError::Predict { source })?
            .of(POSITIVE_CLASS);
        RiskAssessment::from_probability(probability)
    }

    #[must_use]
    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }

    #[must_use]
    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }
}
