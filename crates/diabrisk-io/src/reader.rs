//! Patient CSV reader with full input validation.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::IoError;
use crate::domain::PatientDataset;
use crate::schema::{self, FEATURE_NAMES, GENDER_COLUMN, TARGET_COLUMN};

/// Reads the training dataset from a CSV file.
///
/// Expected CSV format:
/// - Header row required; columns are matched by name, in any order
/// - Every name in [`FEATURE_NAMES`] plus [`TARGET_COLUMN`] must be present
/// - `gender` holds `Male`/`Female`; the target holds `Yes`/`No` or `1`/`0`
/// - Other numeric cells are numbers or missing markers (see [`schema::is_missing`])
///
/// Extra columns are ignored with a warning.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::MissingColumn`] | A required column is absent from the header |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::InvalidNumber`] | Cell is not a finite number or missing marker |
/// | [`IoError::InvalidGender`] | Gender is neither `Male` nor `Female` |
/// | [`IoError::InvalidTarget`] | Target is not `Yes`/`No`/`1`/`0` |
pub struct PatientCsvReader {
    path: PathBuf,
}

impl PatientCsvReader {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Read and validate the CSV file, returning a [`PatientDataset`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<PatientDataset, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) lets the row-length check below report the row.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| self.csv_error(e))?.clone();
        let expected_cols = header.len();
        let position = |name: &str| {
            header
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| IoError::MissingColumn {
                    path: self.path.clone(),
                    column: name.to_string(),
                })
        };
        let feature_cols = FEATURE_NAMES
            .iter()
            .map(|&name| position(name))
            .collect::<Result<Vec<_>, _>>()?;
        let target_col = position(TARGET_COLUMN)?;

        let ignored: Vec<&str> = header
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != target_col && !feature_cols.contains(i))
            .map(|(_, h)| h)
            .collect();
        if !ignored.is_empty() {
            warn!(columns = ?ignored, "ignoring extra columns");
        }
        debug!(expected_cols, "read CSV header");

        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.csv_error(e))?;
            if record.len() != expected_cols {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    expected: expected_cols,
                    got: record.len(),
                });
            }

            let raw_target = record.get(target_col).unwrap_or("");
            let label = schema::parse_target(raw_target).ok_or_else(|| IoError::InvalidTarget {
                path: self.path.clone(),
                row_index,
                raw: raw_target.to_string(),
            })?;

            let row = FEATURE_NAMES
                .iter()
                .zip(&feature_cols)
                .map(|(&name, &col)| self.parse_cell(name, record.get(col).unwrap_or(""), row_index))
                .collect::<Result<Vec<_>, _>>()?;

            rows.push(row);
            labels.push(label);
        }

        if rows.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        let dataset = PatientDataset::new(schema::feature_names(), rows, labels);
        info!(
            n_samples = dataset.n_samples(),
            n_missing = dataset.n_missing(),
            class_counts = ?dataset.class_counts(),
            "patient dataset loaded"
        );
        Ok(dataset)
    }

    fn parse_cell(&self, column: &str, raw: &str, row_index: usize) -> Result<Option<f64>, IoError> {
        if schema::is_missing(raw) {
            return Ok(None);
        }
        if column == GENDER_COLUMN {
            return schema::encode_gender(raw)
                .map(Some)
                .ok_or_else(|| IoError::InvalidGender {
                    path: self.path.clone(),
                    row_index,
                    raw: raw.to_string(),
                });
        }
        match raw.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(Some(value)),
            _ => Err(IoError::InvalidNumber {
                path: self.path.clone(),
                row_index,
                column: column.to_string(),
                raw: raw.to_string(),
            }),
        }
    }

    fn csv_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "age,gender,pulse_rate,systolic_bp,diastolic_bp,glucose,height,weight,bmi,family_diabetes,hypertensive,family_hypertension,cardiovascular_disease,stroke,diabetic";

    fn write_csv(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    fn read(content: &str) -> Result<PatientDataset, IoError> {
        let f = write_csv(content);
        PatientCsvReader::new(f.path()).read()
    }

    #[test]
    fn read_valid_patients() {
        let csv = format!(
            "{HEADER}\n42,Male,72,120,80,5.5,1.7,70,24.2,0,0,0,0,0,No\n61,Female,88,150,95,11.0,1.6,85,33.2,1,1,1,0,0,Yes\n"
        );
        let ds = read(&csv).unwrap();
        assert_eq!(ds.n_samples(), 2);
        assert_eq!(ds.n_features(), 14);
        assert_eq!(ds.labels(), &[0, 1]);
        assert_eq!(ds.rows()[0][1], Some(0.0));
        assert_eq!(ds.rows()[1][1], Some(1.0));
        assert_eq!(ds.rows()[1][5], Some(11.0));
        assert_eq!(ds.n_missing(), 0);
    }

    #[test]
    fn columns_matched_by_name_and_extras_ignored() {
        let csv = "diabetic,id,stroke,cardiovascular_disease,family_hypertension,hypertensive,family_diabetes,bmi,weight,height,glucose,diastolic_bp,systolic_bp,pulse_rate,gender,age\n\
                   yes,P1,1,0,0,0,0,30.0,90,1.75,9.5,90,140,80,female,55\n";
        let ds = read(csv).unwrap();
        assert_eq!(ds.labels(), &[1]);
        assert_eq!(ds.rows()[0][0], Some(55.0));
        assert_eq!(ds.rows()[0][1], Some(1.0));
        assert_eq!(ds.rows()[0][13], Some(1.0));
    }

    #[test]
    fn missing_markers_become_none() {
        let csv = format!("{HEADER}\n42,,72,NA,80,NaN,1.7,70,,0,0,0,0,0,1\n");
        let ds = read(&csv).unwrap();
        let row = &ds.rows()[0];
        assert_eq!(row[1], None);
        assert_eq!(row[3], None);
        assert_eq!(row[5], None);
        assert_eq!(row[8], None);
        assert_eq!(ds.n_missing(), 4);
    }

    #[test]
    fn missing_column_error() {
        let csv = "age,gender,diabetic\n1,Male,No\n";
        let err = read(csv).unwrap_err();
        assert!(matches!(err, IoError::MissingColumn { column, .. } if column == "pulse_rate"));
    }

    #[test]
    fn empty_dataset_error() {
        let err = read(&format!("{HEADER}\n")).unwrap_err();
        assert!(matches!(err, IoError::EmptyDataset { .. }));
    }

    #[test]
    fn inconsistent_row_length_error() {
        let err = read(&format!("{HEADER}\n42,Male,72\n")).unwrap_err();
        assert!(matches!(err, IoError::InconsistentRowLength { row_index: 0, .. }));
    }

    #[test]
    fn unknown_gender_error() {
        let csv = format!("{HEADER}\n42,X,72,120,80,5.5,1.7,70,24.2,0,0,0,0,0,No\n");
        assert!(matches!(read(&csv).unwrap_err(), IoError::InvalidGender { .. }));
    }

    #[test]
    fn unknown_target_error() {
        let csv = format!("{HEADER}\n42,Male,72,120,80,5.5,1.7,70,24.2,0,0,0,0,0,Maybe\n");
        assert!(matches!(read(&csv).unwrap_err(), IoError::InvalidTarget { .. }));
        let csv = format!("{HEADER}\n42,Male,72,120,80,5.5,1.7,70,24.2,0,0,0,0,0,\n");
        assert!(matches!(read(&csv).unwrap_err(), IoError::InvalidTarget { .. }));
    }

    #[test]
    fn unparseable_number_error() {
        let csv = format!("{HEADER}\nabc,Male,72,120,80,5.5,1.7,70,24.2,0,0,0,0,0,No\n");
        let err = read(&csv).unwrap_err();
        assert!(matches!(err, IoError::InvalidNumber { column, .. } if column == "age"));
        let csv = format!("{HEADER}\ninf,Male,72,120,80,5.5,1.7,70,24.2,0,0,0,0,0,No\n");
        assert!(matches!(read(&csv).unwrap_err(), IoError::InvalidNumber { .. }));
    }

    #[test]
    fn file_not_found_error() {
        let err = PatientCsvReader::new(Path::new("/nonexistent/patients.csv"))
            .read()
            .unwrap_err();
        assert!(matches!(err, IoError::FileNotFound { .. }));
    }
}
