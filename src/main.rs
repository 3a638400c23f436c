mod train;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use diabrisk_io::schema::{MODEL_FILE, SCALER_FILE};
use diabrisk_serve::ServeConfig;

#[derive(Parser)]
#[command(name = "diabrisk")]
#[command(about = "Diabetes risk classifier: training pipeline and prediction server")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for reproducibility
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

#[derive(Subcommand)]
enum Command {
    /// Fit the scaler and random forest on a patient CSV and evaluate on a held-out split
    Train {
        /// Path to the input CSV file
        #[arg(long, default_value = "../diabd.csv")]
        data: PathBuf,

        /// Output directory for the model, scaler and report
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        /// Number of trees in the Random Forest
        #[arg(long, default_value_t = 300)]
        n_trees: usize,

        /// Maximum tree depth (0 = unlimited)
        #[arg(long, default_value_t = 12)]
        max_depth: usize,

        /// Fraction of rows held out for evaluation
        #[arg(long, default_value_t = 0.2)]
        test_size: f64,

        /// Same-class neighbours considered when synthesizing minority rows
        #[arg(long, default_value_t = 5)]
        k_neighbors: usize,
    },

    /// Serve predictions over HTTP
    Serve {
        /// Interface to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind
        #[arg(long, default_value_t = 8000)]
        port: u16,

        /// Path to the trained model binary
        #[arg(long, default_value = MODEL_FILE)]
        model: PathBuf,

        /// Path to the fitted scaler binary
        #[arg(long, default_value = SCALER_FILE)]
        scaler: PathBuf,
    },
}

// --- JSON stdout output struct ---

#[derive(Serialize)]
struct TrainOutput {
    accuracy: f64,
    n_train: usize,
    n_test: usize,
    model: PathBuf,
    scaler: PathBuf,
    report: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Configure Rayon thread pool
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Train {
            data,
            output_dir,
            n_trees,
            max_depth,
            test_size,
            k_neighbors,
        } => {
            let opts = train::TrainOptions {
                data,
                output_dir,
                n_trees,
                max_depth: (max_depth > 0).then_some(max_depth),
                test_size,
                k_neighbors,
                seed: cli.seed,
            };
            let outcome = train::run(&opts)?;

            if !cli.quiet {
                println!("Accuracy: {:.4}\n", outcome.classification.accuracy);
                println!("Classification Report:\n{}", outcome.classification);
                println!("Confusion Matrix:\n{}", outcome.confusion);
            }

            let output = TrainOutput {
                accuracy: outcome.report.accuracy,
                n_train: outcome.report.n_train,
                n_test: outcome.report.n_test,
                model: outcome.model_path,
                scaler: outcome.scaler_path,
                report: outcome.report_path,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Serve {
            host,
            port,
            model,
            scaler,
        } => {
            let config = ServeConfig::default()
                .with_host(host)
                .with_port(port)
                .with_model_path(model)
                .with_scaler_path(scaler);
            let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
            runtime
                .block_on(diabrisk_serve::serve(config))
                .context("prediction server failed")?;
        }
    }

    Ok(())
}
