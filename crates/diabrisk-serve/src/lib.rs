//! HTTP prediction service.
//!
//! Loads a fitted scaler and random forest once, then answers `POST /predict`
//! with a Yes/No diabetes risk label and its probability.
//!
//! | Method | Path       | Body                                    |
//! |--------|------------|-----------------------------------------|
//! | GET    | `/`        | `{"message": ...}`                      |
//! | POST   | `/predict` | 14-field patient record → label + score |

mod config;
mod error;
mod handlers;
mod predictor;
mod record;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

pub use config::ServeConfig;
pub use error::{AppError, AppResult, ServeError};
pub use predictor::{DECISION_THRESHOLD, RiskAssessment, RiskPredictor, round2};
pub use record::{PatientRecord, PredictResponse, StatusMessage};

/// Shared application state
pub struct AppState {
    pub predictor: RiskPredictor,
}

impl AppState {
    #[must_use]
    pub fn new(predictor: RiskPredictor) -> Arc<Self> {
        Arc::new(Self { predictor })
    }
}

/// Routes with open CORS and request tracing.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route("/predict", post(handlers::predict))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Load the artifacts, bind, and serve until Ctrl-C.
///
/// # Errors
///
/// Any [`ServeError`] from loading, binding, or the server loop.
pub async fn serve(config: ServeConfig) -> Result<(), ServeError> {
    let predictor = RiskPredictor::load(config.model_path(), config.scaler_path())?;
    let app = router(AppState::new(predictor));

    let listener = tokio::net::TcpListener::bind((config.host(), config.port()))
        .await
        .map_err(|source| ServeError::Bind {
            addr: config.addr(),
            source,
        })?;
    let local = listener.local_addr().map_err(|source| ServeError::Bind {
        addr: config.addr(),
        source,
    })?;
    info!(addr = %local, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|source| ServeError::Server { source })?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for Ctrl-C; running until killed");
        std::future::pending::<()>().await;
    }
}
