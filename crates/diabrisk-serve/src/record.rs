//! Request and response bodies of the prediction API.

use serde::{Deserialize, Serialize};

/// One patient, as posted to `/predict`.
///
/// Integer fields reject fractional and string values. Fields not listed here
/// are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub age: i64,
    /// 0 = male, 1 = female.
    pub gender: i64,
    pub pulse_rate: i64,
    pub systolic_bp: i64,
    pub diastolic_bp: i64,
    pub glucose: f64,
    pub height: f64,
    pub weight: f64,
    pub bmi: f64,
    pub family_diabetes: i64,
    pub hypertensive: i64,
    pub family_hypertension: i64,
    pub cardiovascular_disease: i64,
    pub stroke: i64,
}

impl PatientRecord {
    /// Field values in [`FEATURE_NAMES`](diabrisk_io::schema::FEATURE_NAMES) order.
    #[must_use]
    pub fn to_feature_row(&self) -> [f64; 14] {
        [
            self.age as f64,
            self.gender as f64,
            self.pulse_rate as f64,
            self.systolic_bp as f64,
            self.diastolic_bp as f64,
            self.glucose,
            self.height,
            self.weight,
            self.bmi,
            self.family_diabetes as f64,
            self.hypertensive as f64,
            self.family_hypertension as f64,
            self.cardiovascular_disease as f64,
            self.stroke as f64,
        ]
    }
}

/// Body of a successful `/predict` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    /// `"Yes"` or `"No"`.
    pub diabetes: String,
    /// Positive-class probability rounded to 2 decimals.
    pub risk_probability: f64,
}

/// Body of `GET /`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use diabrisk_io::schema::FEATURE_NAMES;
    use serde_json::json;

    use super::*;

    fn sample() -> serde_json::Value {
        json!({
            "age": 1, "gender": 2, "pulse_rate": 3, "systolic_bp": 4, "diastolic_bp": 5,
            "glucose": 6.5, "height": 7.5, "weight": 8.5, "bmi": 9.5,
            "family_diabetes": 10, "hypertensive": 11, "family_hypertension": 12,
            "cardiovascular_disease": 13, "stroke": 14
        })
    }

    #[test]
    fn feature_row_follows_schema_order() {
        let record: PatientRecord = serde_json::from_value(sample()).unwrap();
        let row = record.to_feature_row();
        let as_json = serde_json::to_value(&record).unwrap();
        for (name, value) in FEATURE_NAMES.iter().zip(row) {
            assert_eq!(as_json[name].as_f64().unwrap(), value, "field {name}");
        }
    }

    #[test]
    fn float_fields_accept_integers() {
        let mut body = sample();
        body["glucose"] = json!(6);
        let record: PatientRecord = serde_json::from_value(body).unwrap();
        assert_eq!(record.glucose, 6.0);
    }

    #[test]
    fn integer_fields_reject_fractions_and_strings() {
        let mut body = sample();
        body["age"] = json!(41.5);
        assert!(serde_json::from_value::<PatientRecord>(body).is_err());
        let mut body = sample();
        body["stroke"] = json!("0");
        assert!(serde_json::from_value::<PatientRecord>(body).is_err());
    }

    #[test]
    fn unknown_fields_ignored_missing_fields_rejected() {
        let mut body = sample();
        body["notes"] = json!("extra");
        assert!(serde_json::from_value::<PatientRecord>(body).is_ok());
        let mut body = sample();
        body.as_object_mut().unwrap().remove("bmi");
        let err = serde_json::from_value::<PatientRecord>(body).unwrap_err();
        assert!(err.to_string().contains("bmi"));
    }
}
