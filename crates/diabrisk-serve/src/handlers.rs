//! HTTP request handlers

use std::sync::Arc;

use axum::{Json, extract::FromRequest, extract::State};
use tracing::debug;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::record::{PatientRecord, PredictResponse, StatusMessage};

/// `axum::Json` whose rejections become 422 [`AppError::Validation`] bodies.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ValidatedJson<T>(pub T);

/// `GET /`
pub async fn home() -> Json<StatusMessage> {
    Json(StatusMessage {
        message: "Diabetes Prediction API is running".to_string(),
    })
}

/// `POST /predict`
pub async fn predict(
    State(state): State<Arc<AppState>>,
    ValidatedJson(record): ValidatedJson<PatientRecord>,
) -> AppResult<Json<PredictResponse>> {
    let assessment = state.predictor.assess(&record.to_feature_row())?;
    debug!(
        probability = assessment.probability,
        positive = assessment.positive,
        "prediction"
    );
    Ok(Json(PredictResponse {
        diabetes: assessment.label().to_string(),
        risk_probability: assessment.rounded_probability(),
    }))
}
