//! Confusion matrix and per-class classification report.

use std::fmt;

use serde::Serialize;

use crate::error::RfError;

/// `counts[true_class][predicted_class]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    counts: Vec<Vec<usize>>,
}

/// Precision, recall, F1 and support of one class, or of an average row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    /// Class index as a string, or `"macro avg"` / `"weighted avg"`.
    pub label: String,
    /// TP / (TP + FP); 0.0 when the class is never predicted.
    pub precision: f64,
    /// TP / (TP + FN); 0.0 when the class never occurs.
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class metrics plus accuracy and macro/weighted averages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

impl ConfusionMatrix {
    /// Tally true against predicted labels.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::EmptyDataset`] | no labels |
    /// | [`RfError::PredictionCountMismatch`] | slices differ in length |
    /// | [`RfError::LabelOutOfRange`] | a label is `>= n_classes` |
    pub fn from_labels(
        truth: &[usize],
        predicted: &[usize],
        n_classes: usize,
    ) -> Result<Self, RfError> {
        if truth.is_empty() {
            return Err(RfError::EmptyDataset);
        }
        if truth.len() != predicted.len() {
            return Err(RfError::PredictionCountMismatch {
                n_true: truth.len(),
                n_predicted: predicted.len(),
            });
        }
        let mut counts = vec![vec![0usize; n_classes]; n_classes];
        for (&t, &p) in truth.iter().zip(predicted) {
            let label = t.max(p);
            if label >= n_classes {
                return Err(RfError::LabelOutOfRange { label, n_classes });
            }
            counts[t][p] += 1;
        }
        Ok(Self { counts })
    }

    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.counts.len()
    }

    #[must_use]
    pub fn as_rows(&self) -> &[Vec<usize>] {
        &self.counts
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// Fraction of rows on the diagonal.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        let correct: usize = (0..self.n_classes()).map(|c| self.counts[c][c]).sum();
        match self.total() {
            0 => 0.0,
            total => correct as f64 / total as f64,
        }
    }

    fn class_metrics(&self, class: usize) -> ClassMetrics {
        let tp = self.counts[class][class];
        let predicted: usize = self.counts.iter().map(|row| row[class]).sum();
        let support: usize = self.counts[class].iter().sum();
        let precision = ratio(tp, predicted);
        let recall = ratio(tp, support);
        ClassMetrics {
            label: class.to_string(),
            precision,
            recall,
            f1: f1(precision, recall),
            support,
        }
    }

    /// Build the per-class report with macro and support-weighted averages.
    #[must_use]
    pub fn report(&self) -> ClassificationReport {
        let classes: Vec<ClassMetrics> =
            (0..self.n_classes()).map(|c| self.class_metrics(c)).collect();
        let total = self.total();
        let k = classes.len().max(1) as f64;

        let mean = |pick: fn(&ClassMetrics) -> f64| classes.iter().map(pick).sum::<f64>() / k;
        let weighted = |pick: fn(&ClassMetrics) -> f64| {
            if total == 0 {
                return 0.0;
            }
            classes
                .iter()
                .map(|m| pick(m) * m.support as f64)
                .sum::<f64>()
                / total as f64
        };

        let macro_avg = ClassMetrics {
            label: "macro avg".to_string(),
            precision: mean(|m| m.precision),
            recall: mean(|m| m.recall),
            f1: mean(|m| m.f1),
            support: total,
        };
        let weighted_avg = ClassMetrics {
            label: "weighted avg".to_string(),
            precision: weighted(|m| m.precision),
            recall: weighted(|m| m.recall),
            f1: weighted(|m| m.f1),
            support: total,
        };

        ClassificationReport {
            accuracy: self.accuracy(),
            classes,
            macro_avg,
            weighted_avg,
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>10}", "")?;
        for c in 0..self.n_classes() {
            write!(f, " {:>8}", format!("pred {c}"))?;
        }
        writeln!(f)?;
        for (c, row) in self.counts.iter().enumerate() {
            write!(f, "{:>10}", format!("true {c}"))?;
            for n in row {
                write!(f, " {n:>8}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>12} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for m in &self.classes {
            write_metrics_row(f, m)?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>12} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        write_metrics_row(f, &self.macro_avg)?;
        write_metrics_row(f, &self.weighted_avg)
    }
}

fn write_metrics_row(f: &mut fmt::Formatter<'_>, m: &ClassMetrics) -> fmt::Result {
    writeln!(
        f,
        "{:>12} {:>9.2} {:>9.2} {:>9.2} {:>9}",
        m.label, m.precision, m.recall, m.f1, m.support
    )
}
