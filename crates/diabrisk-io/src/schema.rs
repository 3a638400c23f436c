//! Column names, value encodings and artifact file names shared by training and serving.

/// The 14 model inputs in the order the scaler and forest expect them.
pub const FEATURE_NAMES: [&str; 14] = [
    "age",
    "gender",
    "pulse_rate",
    "systolic_bp",
    "diastolic_bp",
    "glucose",
    "height",
    "weight",
    "bmi",
    "family_diabetes",
    "hypertensive",
    "family_hypertension",
    "cardiovascular_disease",
    "stroke",
];

/// Label column of the training CSV.
pub const TARGET_COLUMN: &str = "diabetic";

/// The only column given as text rather than a number.
pub const GENDER_COLUMN: &str = "gender";

/// Class index of a positive (`Yes`) diagnosis.
pub const POSITIVE_CLASS: usize = 1;

/// Display names indexed by class.
pub const CLASS_NAMES: [&str; 2] = ["No", "Yes"];

pub const MODEL_FILE: &str = "diabetes_random_forest_balanced.bin";
pub const SCALER_FILE: &str = "scaler.bin";
pub const REPORT_FILE: &str = "training_report.json";

/// [`FEATURE_NAMES`] as owned strings.
#[must_use]
pub fn feature_names() -> Vec<String> {
    FEATURE_NAMES.iter().map(|s| (*s).to_string()).collect()
}

/// `Male` → 0, `Female` → 1, case-insensitive and trimmed.
#[must_use]
pub fn encode_gender(raw: &str) -> Option<f64> {
    let value = raw.trim();
    if value.eq_ignore_ascii_case("male") {
        Some(0.0)
    } else if value.eq_ignore_ascii_case("female") {
        Some(1.0)
    } else {
        None
    }
}

/// `Yes`/`1` → 1, `No`/`0` → 0, case-insensitive and trimmed.
#[must_use]
pub fn parse_target(raw: &str) -> Option<usize> {
    match raw.trim() {
        v if v.eq_ignore_ascii_case("yes") || v == "1" => Some(1),
        v if v.eq_ignore_ascii_case("no") || v == "0" => Some(0),
        _ => None,
    }
}

/// Whether a cell denotes a missing value: empty, `NA`, `N/A`, `NaN`, `null` or `None`.
#[must_use]
pub fn is_missing(raw: &str) -> bool {
    let value = raw.trim();
    value.is_empty()
        || ["na", "n/a", "nan", "null", "none"]
            .iter()
            .any(|marker| value.eq_ignore_ascii_case(marker))
}
