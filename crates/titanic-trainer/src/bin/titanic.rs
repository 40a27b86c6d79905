//! Command line for training, evaluating and running the survival model.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use titanic_core::{DEFAULT_FEATURES, DEFAULT_LABEL, DEFAULT_N_TREES, DEFAULT_SEED};
use titanic_trainer::{
    run_evaluation, run_prediction, run_training, write_predictions, EvaluateConfig,
    PredictConfig, TrainConfig,
};
use tracing_subscriber::EnvFilter;

/// CLI arguments
#[derive(Parser)]
#[command(name = "titanic")]
#[command(about = "Train, evaluate and run the Titanic survival model")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit a model on a labeled dataset and save it
    Train {
        /// Labeled dataset (.csv or .json)
        dataset: PathBuf,
        /// Where to write the model artifact
        model: PathBuf,
        /// Number of trees in the ensemble
        #[arg(short = 'n', long, default_value_t = DEFAULT_N_TREES)]
        n_trees: usize,
        /// Seed for bootstrap sampling
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,
        /// Feature columns, comma separated
        #[arg(short, long, value_delimiter = ',', default_values_t = default_features())]
        features: Vec<String>,
        /// Label column
        #[arg(short, long, default_value = DEFAULT_LABEL)]
        label: String,
    },
    /// Score a saved model against a labeled dataset
    Evaluate {
        /// Labeled dataset (.csv or .json)
        dataset: PathBuf,
        /// Model artifact written by `train`
        model: PathBuf,
        /// Label column
        #[arg(short, long, default_value = DEFAULT_LABEL)]
        label: String,
        /// Cross-validate the model's parameters over this many folds
        /// instead of scoring the saved fit
        #[arg(long, value_name = "FOLDS")]
        cv: Option<usize>,
        /// Print metrics as a JSON object
        #[arg(long)]
        json: bool,
    },
    /// Predict labels for every record of a dataset
    Predict {
        /// Dataset (.csv or .json); a label column is ignored if present
        dataset: PathBuf,
        /// Model artifact written by `train`
        model: PathBuf,
        /// Write predictions here instead of stdout
        output: Option<PathBuf>,
        /// Label column to ignore
        #[arg(short, long, default_value = DEFAULT_LABEL)]
        label: String,
    },
}

fn default_features() -> Vec<String> {
    DEFAULT_FEATURES.iter().map(|s| s.to_string()).collect()
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Train {
            dataset,
            model,
            n_trees,
            seed,
            features,
            label,
        } => {
            let config = TrainConfig {
                dataset,
                model,
                n_trees,
                seed,
                features,
                label,
            };
            run_training(&config)?;
            println!("Model saved to {}", config.model.display());
        }
        Commands::Evaluate {
            dataset,
            model,
            label,
            cv,
            json,
        } => {
            let config = EvaluateConfig {
                dataset,
                model,
                label,
                folds: cv,
            };
            let metrics = run_evaluation(&config)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&metrics)?);
            } else {
                println!("{metrics}");
            }
        }
        Commands::Predict {
            dataset,
            model,
            output,
            label,
        } => {
            let to_stdout = output.is_none();
            let config = PredictConfig {
                dataset,
                model,
                output,
                label,
            };
            let predictions = run_prediction(&config)?;
            if to_stdout {
                let stdout = io::stdout();
                let mut lock = stdout.lock();
                write_predictions(&mut lock, &predictions)?;
                lock.flush()?;
            }
        }
    }
    Ok(())
}

fn main() {
    // Logs go to stderr so predictions on stdout stay machine readable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
