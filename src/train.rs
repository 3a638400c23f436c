//! The `train` subcommand: CSV to fitted scaler, forest, and report.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use tracing::{info, instrument};

use diabrisk_io::schema::CLASS_NAMES;
use diabrisk_io::{
    ArtifactWriter, ClassEntry, FeatureEntry, PatientCsvReader, TrainingReport, class_counts,
};
use diabrisk_prep::{
    SmoteConfig, StandardScaler, StratifiedSplit, TrainTestSplit, fill_with_column_means,
};
use diabrisk_rf::{ClassMetrics, ClassificationReport, ConfusionMatrix, ForestConfig};

/// Inputs of one training run.
#[derive(Debug, Clone)]
pub struct TrainOptions {
    pub data: PathBuf,
    pub output_dir: PathBuf,
    pub n_trees: usize,
    pub max_depth: Option<usize>,
    pub test_size: f64,
    pub k_neighbors: usize,
    pub seed: u64,
}

/// Everything a run produced, for printing.
#[derive(Debug)]
pub struct TrainOutcome {
    pub report: TrainingReport,
    pub classification: ClassificationReport,
    pub confusion: ConfusionMatrix,
    pub model_path: PathBuf,
    pub scaler_path: PathBuf,
    pub report_path: PathBuf,
}

/// Read, impute, split, scale, oversample, fit, evaluate, persist.
#[instrument(skip_all, fields(data = %opts.data.display()))]
pub fn run(opts: &TrainOptions) -> Result<TrainOutcome> {
    // 1. Read and impute
    let dataset = PatientCsvReader::new(&opts.data)
        .read()
        .context("failed to read training CSV")?;
    let counts = dataset.class_counts();
    ensure!(
        counts.len() == 2 && counts.iter().all(|&n| n > 0),
        "training data needs both classes, found counts {counts:?}"
    );
    let (features, _) =
        fill_with_column_means(dataset.rows()).context("failed to impute missing values")?;
    let labels = dataset.labels();

    // 2. Stratified split
    let split = StratifiedSplit::new(opts.test_size)?
        .with_seed(opts.seed)
        .split(labels)
        .context("failed to split dataset")?;
    let x_train = TrainTestSplit::select(&features, &split.train);
    let y_train = TrainTestSplit::select(labels, &split.train);
    let x_test = TrainTestSplit::select(&features, &split.test);
    let y_test = TrainTestSplit::select(labels, &split.test);
    info!(
        n_train = y_train.len(),
        n_test = y_test.len(),
        train_class_counts = ?class_counts(&y_train),
        "split complete"
    );

    // 3. Scale on the training side only
    let scaler = StandardScaler::fit(&x_train, dataset.feature_names())
        .context("failed to fit scaler")?;
    let x_train = scaler.transform(&x_train)?;
    let x_test = scaler.transform(&x_test)?;

    // 4. Balance the training side
    let balanced = SmoteConfig::new(opts.k_neighbors)?
        .with_seed(opts.seed)
        .fit_resample(&x_train, &y_train)
        .context("oversampling failed")?;
    let balanced_counts = class_counts(&balanced.labels);
    info!(class_counts = ?balanced_counts, "training classes balanced");

    // 5. Fit the forest
    let config = ForestConfig::new(opts.n_trees)?
        .with_max_depth(opts.max_depth)
        .with_seed(opts.seed);
    let trained = config
        .fit(&balanced.features, &balanced.labels, dataset.feature_names())
        .context("forest training failed")?;

    // 6. Evaluate on the untouched test rows
    let predicted = trained.forest().predict_batch(&x_test)?;
    let confusion = ConfusionMatrix::from_labels(&y_test, &predicted, CLASS_NAMES.len())?;
    let mut classification = confusion.report();
    for (metrics, name) in classification.classes.iter_mut().zip(CLASS_NAMES) {
        metrics.label = name.to_string();
    }
    info!(accuracy = classification.accuracy, "evaluation complete");

    // 7. Persist
    let writer = ArtifactWriter::new(&opts.output_dir)?;
    let model_path = writer.model_path();
    let scaler_path = writer.scaler_path();
    trained
        .forest()
        .save(&model_path)
        .context("failed to save model")?;
    scaler
        .save(&scaler_path)
        .context("failed to save scaler")?;

    let report = TrainingReport {
        dataset: display_name(&opts.data),
        seed: opts.seed,
        n_samples: dataset.n_samples(),
        n_train: split.train.len(),
        n_test: split.test.len(),
        n_trees: config.n_trees(),
        max_depth: config.max_depth(),
        max_features: trained.max_features(),
        k_neighbors: opts.k_neighbors,
        class_counts: counts,
        train_class_counts: class_counts(&y_train),
        balanced_class_counts: balanced_counts,
        accuracy: classification.accuracy,
        classes: classification.classes.iter().map(class_entry).collect(),
        macro_avg: class_entry(&classification.macro_avg),
        weighted_avg: class_entry(&classification.weighted_avg),
        confusion_matrix: confusion.as_rows().to_vec(),
        feature_importances: trained
            .importances()
            .iter()
            .map(|f| FeatureEntry {
                name: f.name.clone(),
                importance: f.importance,
                rank: f.rank,
            })
            .collect(),
    };
    let report_path = writer.write_report(&report)?;

    Ok(TrainOutcome {
        report,
        classification,
        confusion,
        model_path,
        scaler_path,
        report_path,
    })
}

fn class_entry(m: &ClassMetrics) -> ClassEntry {
    ClassEntry {
        label: m.label.clone(),
        precision: m.precision,
        recall: m.recall,
        f1: m.f1,
        support: m.support,
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}
