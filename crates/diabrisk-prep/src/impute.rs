//! Column-mean imputation of missing cells.

use tracing::{debug, instrument};

use crate::error::PrepError;

/// Per-column means used to fill missing cells.
#[derive(Debug, Clone, PartialEq)]
pub struct MeanImputer {
    means: Vec<f64>,
}

impl MeanImputer {
    /// Compute each column's mean over its observed (`Some`) cells.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`PrepError::EmptyDataset`] | no rows |
    /// | [`PrepError::RaggedRow`] | rows differ in length |
    /// | [`PrepError::NonFiniteValue`] | an observed cell is NaN or infinite |
    /// | [`PrepError::AllMissingColumn`] | a column has no observed cell |
    #[instrument(skip_all, fields(n_rows = rows.len()))]
    pub fn fit(rows: &[Vec<Option<f64>>]) -> Result<Self, PrepError> {
        let n_columns = rows.first().ok_or(PrepError::EmptyDataset)?.len();
        let mut sums = vec![0.0; n_columns];
        let mut seen = vec![0usize; n_columns];

        for (row_index, row) in rows.iter().enumerate() {
            if row.len() != n_columns {
                return Err(PrepError::RaggedRow {
                    row_index,
                    expected: n_columns,
                    got: row.len(),
                });
            }
            for (column, cell) in row.iter().enumerate() {
                if let Some(value) = cell {
                    if !value.is_finite() {
                        return Err(PrepError::NonFiniteValue { row_index, column });
                    }
                    sums[column] += value;
                    seen[column] += 1;
                }
            }
        }

        let means = sums
            .iter()
            .zip(&seen)
            .enumerate()
            .map(|(column, (&sum, &n))| {
                if n == 0 {
                    Err(PrepError::AllMissingColumn { column })
                } else {
                    Ok(sum / n as f64)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        let n_missing: usize = seen.iter().map(|&n| rows.len() - n).sum();
        debug!(n_columns, n_missing, "column means computed");
        Ok(Self { means })
    }

    /// Replace every `None` with its column mean.
    ///
    /// # Errors
    ///
    /// Returns [`PrepError::RaggedRow`] if a row's length differs from the fitted width.
    pub fn transform(&self, rows: &[Vec<Option<f64>>]) -> Result<Vec<Vec<f64>>, PrepError> {
        rows.iter()
            .enumerate()
            .map(|(row_index, row)| {
                if row.len() != self.means.len() {
                    return Err(PrepError::RaggedRow {
                        row_index,
                        expected: self.means.len(),
                        got: row.len(),
                    });
                }
                Ok(row
                    .iter()
                    .zip(&self.means)
                    .map(|(cell, &mean)| cell.unwrap_or(mean))
                    .collect())
            })
            .collect()
    }

    #[must_use]
    pub fn means(&self) -> &[f64] {
        &self.means
    }
}

/// Fit a [`MeanImputer`] on `rows` and fill them in one step.
///
/// # Errors
///
/// Any error of [`MeanImputer::fit`].
pub fn fill_with_column_means(
    rows: &[Vec<Option<f64>>],
) -> Result<(Vec<Vec<f64>>, MeanImputer), PrepError> {
    let imputer = MeanImputer::fit(rows)?;
    let filled = imputer.transform(rows)?;
    Ok((filled, imputer))
}
