//! Router tests: requests go through the full axum stack via `oneshot`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use diabrisk_io::schema::{self, FEATURE_NAMES};
use diabrisk_prep::StandardScaler;
use diabrisk_rf::ForestConfig;
use diabrisk_serve::{AppState, DECISION_THRESHOLD, RiskPredictor, router};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

/// Synthetic patients: positives have high glucose, high BMI and risk flags.
fn synthetic_patients() -> (Vec<Vec<f64>>, Vec<usize>) {
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let mut features = Vec::new();
    let mut labels = Vec::new();
    for i in 0..300 {
        let positive = i % 3 == 0;
        let flag = |rng: &mut ChaCha8Rng, p: f64| f64::from(u8::from(rng.gen_bool(p)));
        let row = vec![
            if positive { rng.gen_range(45.0..80.0_f64).round() } else { rng.gen_range(20.0..60.0_f64).round() },
            flag(&mut rng, 0.5),
            rng.gen_range(60.0..100.0_f64).round(),
            if positive { rng.gen_range(130.0..170.0_f64).round() } else { rng.gen_range(100.0..135.0_f64).round() },
            if positive { rng.gen_range(80.0..100.0_f64).round() } else { rng.gen_range(60.0..85.0_f64).round() },
            if positive { rng.gen_range(9.0..18.0) } else { rng.gen_range(4.0..7.5) },
            rng.gen_range(1.5..1.9),
            rng.gen_range(50.0..110.0),
            if positive { rng.gen_range(28.0..40.0) } else { rng.gen_range(18.0..27.0) },
            flag(&mut rng, if positive { 0.7 } else { 0.1 }),
            flag(&mut rng, if positive { 0.6 } else { 0.1 }),
            flag(&mut rng, 0.3),
            flag(&mut rng, if positive { 0.2 } else { 0.02 }),
            flag(&mut rng, if positive { 0.1 } else { 0.01 }),
        ];
        features.push(row);
        labels.push(usize::from(positive));
    }
    (features, labels)
}

fn test_predictor() -> RiskPredictor {
    let (features, labels) = synthetic_patients();
    let names = schema::feature_names();
    let scaler = StandardScaler::fit(&features, &names).unwrap();
    let scaled = scaler.transform(&features).unwrap();
    let forest = ForestConfig::new(40)
        .unwrap()
        .with_max_depth(Some(12))
        .fit(&scaled, &labels, &names)
        .unwrap()
        .into_forest();
    RiskPredictor::new(scaler, forest).unwrap()
}

fn test_state() -> Arc<AppState> {
    AppState::new(test_predictor())
}

/// Helper: parse a JSON response body into a `serde_json::Value`.
async fn json_body(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn predict_request(body: &Value) -> Request<Body> {
    Request::post("/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn low_risk() -> Value {
    json!({
        "age": 25, "gender": 0, "pulse_rate": 70, "systolic_bp": 110, "diastolic_bp": 70,
        "glucose": 5.0, "height": 1.75, "weight": 70.0, "bmi": 22.0,
        "family_diabetes": 0, "hypertensive": 0, "family_hypertension": 0,
        "cardiovascular_disease": 0, "stroke": 0
    })
}

fn high_risk() -> Value {
    json!({
        "age": 65, "gender": 1, "pulse_rate": 90, "systolic_bp": 160, "diastolic_bp": 95,
        "glucose": 15.0, "height": 1.6, "weight": 95.0, "bmi": 37.1,
        "family_diabetes": 1, "hypertensive": 1, "family_hypertension": 1,
        "cardiovascular_disease": 1, "stroke": 0
    })
}

// ---------------------------------------------------------------------------
// GET /
// ---------------------------------------------------------------------------

#[tokio::test]
async fn home_reports_running() {
    let app = router(test_state());
    let req = Request::get("/").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["message"], "Diabetes Prediction API is running");
}

// ---------------------------------------------------------------------------
// POST /predict
// ---------------------------------------------------------------------------

#[tokio::test]
async fn low_risk_patient_is_no() {
    let app = router(test_state());
    let resp = app.oneshot(predict_request(&low_risk())).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = json_body(resp).await;
    assert_eq!(body["diabetes"], "No");
    let p = body["risk_probability"].as_f64().unwrap();
    assert!(p < DECISION_THRESHOLD, "p = {p}");
}

#[tokio::test]
async fn high_risk_patient_scores_higher() {
    let state = test_state();
    let low = json_body(router(state.clone()).oneshot(predict_request(&low_risk())).await.unwrap()).await;
    let high = json_body(router(state).oneshot(predict_request(&high_risk())).await.unwrap()).await;

    let p_low = low["risk_probability"].as_f64().unwrap();
    let p_high = high["risk_probability"].as_f64().unwrap();
    assert!(p_high > p_low, "high {p_high} <= low {p_low}");
    assert_eq!(high["diabetes"], "Yes");
}

#[tokio::test]
async fn label_agrees_with_threshold_and_probability_is_rounded() {
    let state = test_state();
    let (features, _) = synthetic_patients();
    for row in features.iter().step_by(15) {
        let body: Value = FEATURE_NAMES
            .iter()
            .zip(row)
            .map(|(name, &v)| {
                let value = if matches!(*name, "glucose" | "height" | "weight" | "bmi") {
                    json!(v)
                } else {
                    json!(v as i64)
                };
                ((*name).to_string(), value)
            })
            .collect::<serde_json::Map<_, _>>()
            .into();

        let resp = router(state.clone()).oneshot(predict_request(&body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let out = json_body(resp).await;

        let p = out["risk_probability"].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&p));
        assert!(((p * 100.0).round() - p * 100.0).abs() < 1e-9, "not 2 decimals: {p}");

        let exact = state
            .predictor
            .assess(&row.iter().enumerate().map(|(c, &v)| {
                if matches!(FEATURE_NAMES[c], "glucose" | "height" | "weight" | "bmi") { v } else { (v as i64) as f64 }
            }).collect::<Vec<_>>())
            .unwrap();
        let expected = if exact.probability >= DECISION_THRESHOLD { "Yes" } else { "No" };
        assert_eq!(out["diabetes"], expected);
    }
}

#[tokio::test]
async fn identical_requests_identical_responses() {
    let state = test_state();
    let a = json_body(router(state.clone()).oneshot(predict_request(&high_risk())).await.unwrap()).await;
    let b = json_body(router(state).oneshot(predict_request(&high_risk())).await.unwrap()).await;
    assert_eq!(a, b);
}

#[tokio::test]
async fn unknown_fields_are_ignored() {
    let mut body = low_risk();
    body["patient_name"] = json!("anonymous");
    let resp = router(test_state()).oneshot(predict_request(&body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Validation errors
// ---------------------------------------------------------------------------

async fn assert_validation_error(body: Request<Body>, needle: &str) {
    let resp = router(test_state()).oneshot(body).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(resp).await;
    assert_eq!(body["status"], 422);
    let msg = body["error"].as_str().unwrap();
    assert!(msg.contains(needle), "{msg:?} lacks {needle:?}");
}

#[tokio::test]
async fn missing_field_is_422() {
    let mut body = low_risk();
    body.as_object_mut().unwrap().remove("glucose");
    assert_validation_error(predict_request(&body), "glucose").await;
}

#[tokio::test]
async fn non_numeric_field_is_422() {
    let mut body = low_risk();
    body["bmi"] = json!("twenty");
    assert_validation_error(predict_request(&body), "invalid type").await;
}

#[tokio::test]
async fn fractional_integer_field_is_422() {
    let mut body = low_risk();
    body["age"] = json!(41.5);
    assert_validation_error(predict_request(&body), "invalid type").await;
}

#[tokio::test]
async fn malformed_json_is_422() {
    let req = Request::post("/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"age\": "))
        .unwrap();
    assert_validation_error(req, "JSON").await;
}

#[tokio::test]
async fn missing_content_type_is_422() {
    let req = Request::post("/predict")
        .body(Body::from(low_risk().to_string()))
        .unwrap();
    assert_validation_error(req, "Content-Type").await;
}

// ---------------------------------------------------------------------------
// CORS and artifact loading
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cors_allows_any_origin() {
    let req = Request::get("/")
        .header(header::ORIGIN, "http://localhost:5173")
        .body(Body::empty())
        .unwrap();
    let resp = router(test_state()).oneshot(req).await.unwrap();
    assert_eq!(
        resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
}

#[tokio::test]
async fn predictor_loaded_from_disk_answers_identically() {
    let predictor = test_predictor();
    let dir = TempDir::new().unwrap();
    let model = dir.path().join("model.bin");
    let scaler = dir.path().join("scaler.bin");
    predictor.forest().save(&model).unwrap();
    predictor.scaler().save(&scaler).unwrap();

    let loaded = RiskPredictor::load(&model, &scaler).unwrap();
    let a = json_body(router(AppState::new(predictor)).oneshot(predict_request(&high_risk())).await.unwrap()).await;
    let b = json_body(router(AppState::new(loaded)).oneshot(predict_request(&high_risk())).await.unwrap()).await;
    assert_eq!(a, b);
}
