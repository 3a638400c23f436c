//! Startup errors and HTTP error responses.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use diabrisk_prep::PrepError;
use diabrisk_rf::RfError;
use serde_json::json;

pub type AppResult<T> = Result<T, AppError>;

/// Errors that stop the server from starting or keep a prediction from completing.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("failed to load model")]
    LoadModel {
        #[source]
        source: RfError,
    },

    #[error("failed to load scaler")]
    LoadScaler {
        #[source]
        source: PrepError,
    },

    /// Returned when an artifact was fit on other features or another order.
    #[error("{artifact} was fit on {found:?}, expected {expected:?}")]
    FeatureSchemaMismatch {
        /// `"model"` or `"scaler"`.
        artifact: &'static str,
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// Returned when the model does not separate exactly two classes.
    #[error("model has {n_classes} classes, expected 2")]
    NotBinary { n_classes: usize },

    /// Returned when the model file holds no trees.
    #[error("model has no trees")]
    EmptyForest,

    #[error("failed to scale features")]
    Transform {
        #[source]
        source: PrepError,
    },

    #[error("failed to run the model")]
    Predict {
        #[source]
        source: RfError,
    },

    /// Returned when the averaged probability is NaN or outside `[0, 1]`.
    #[error("model produced an invalid probability {probability}")]
    InvalidProbability { probability: f64 },

    #[error("cannot bind {addr}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server stopped with an error")]
    Server {
        #[source]
        source: std::io::Error,
    },
}

/// Errors returned to HTTP clients as `{"error": ..., "status": ...}`.
#[derive(Debug)]
pub enum AppError {
    /// Malformed body, missing field or wrong type.
    Validation(String),
    /// Inference failed; details are logged, not returned.
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.as_str()),
            AppError::Internal(msg) => {
                tracing::error!("Inference error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<ServeError> for AppError {
    fn from(err: ServeError) -> Self {
        let mut msg = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            msg.push_str(": ");
            msg.push_str(&cause.to_string());
            source = cause.source();
        }
        AppError::Internal(msg)
    }
}
