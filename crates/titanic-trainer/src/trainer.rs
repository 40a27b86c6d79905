//! The train / evaluate / predict commands.
//!
//! Every path and setting is passed in explicitly through a config struct,
//! so the commands can run side by side in tests without touching any
//! process-wide defaults.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use titanic_core::{
    ColumnSelector, Metrics, ModelParams, TitanicModel, DEFAULT_FEATURES, DEFAULT_LABEL,
    DEFAULT_N_TREES, DEFAULT_SEED,
};
use tracing::info;

use crate::data::load_dataset;

/// Settings for [`run_training`].
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub dataset: PathBuf,
    pub model: PathBuf,
    pub n_trees: usize,
    pub seed: u64,
    pub features: Vec<String>,
    pub label: String,
}

impl TrainConfig {
    /// Default hyperparameters and columns for the given paths.
    pub fn new(dataset: impl Into<PathBuf>, model: impl Into<PathBuf>) -> Self {
        Self {
            dataset: dataset.into(),
            model: model.into(),
            n_trees: DEFAULT_N_TREES,
            seed: DEFAULT_SEED,
            features: DEFAULT_FEATURES.iter().map(|s| s.to_string()).collect(),
            label: DEFAULT_LABEL.to_string(),
        }
    }

    pub fn with_n_trees(mut self, n_trees: usize) -> Self {
        self.n_trees = n_trees;
        self
    }
}

/// Settings for [`run_evaluation`].
#[derive(Debug, Clone)]
pub struct EvaluateConfig {
    pub dataset: PathBuf,
    pub model: PathBuf,
    pub label: String,
    /// Cross-validate the model's configuration over this many folds
    /// instead of scoring the saved fit.
    pub folds: Option<usize>,
}

impl EvaluateConfig {
    pub fn new(dataset: impl Into<PathBuf>, model: impl Into<PathBuf>) -> Self {
        Self {
            dataset: dataset.into(),
            model: model.into(),
            label: DEFAULT_LABEL.to_string(),
            folds: None,
        }
    }

    pub fn with_folds(mut self, folds: usize) -> Self {
        self.folds = Some(folds);
        self
    }
}

/// Settings for [`run_prediction`].
#[derive(Debug, Clone)]
pub struct PredictConfig {
    pub dataset: PathBuf,
    pub model: PathBuf,
    /// Where to write predictions, one per line. `None` leaves output to the caller.
    pub output: Option<PathBuf>,
    /// Dropped from the input if present, so labeled files can be reused.
    pub label: String,
}

impl PredictConfig {
    pub fn new(dataset: impl Into<PathBuf>, model: impl Into<PathBuf>) -> Self {
        Self {
            dataset: dataset.into(),
            model: model.into(),
            output: None,
            label: DEFAULT_LABEL.to_string(),
        }
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }
}

/// Reads a labeled dataset, fits a model on it and saves the artifact.
pub fn run_training(config: &TrainConfig) -> anyhow::Result<TitanicModel> {
    let dataset = load_dataset(&config.dataset)
        .with_context(|| format!("failed to read dataset {}", config.dataset.display()))?;
    let (features, labels) = dataset
        .split_label(&config.label)
        .context("training data has no usable label column")?;

    let params = ModelParams::new(config.n_trees).with_seed(config.seed);
    let selector = ColumnSelector::new(config.features.iter().cloned());
    let mut model = TitanicModel::new(params, selector)?;

    info!(
        records = features.len(),
        n_trees = config.n_trees,
        "starting training"
    );
    model.fit(&features, &labels).context("training failed")?;

    let training_metrics = model.evaluate(&features, &labels)?;
    info!(
        accuracy = training_metrics.get("accuracy").unwrap_or_default(),
        "training accuracy"
    );

    model
        .save(&config.model)
        .with_context(|| format!("failed to save model to {}", config.model.display()))?;
    Ok(model)
}

/// Loads a model and scores it against a labeled dataset, either directly
/// or by cross-validating its parameters when `config.folds` is set.
pub fn run_evaluation(config: &EvaluateConfig) -> anyhow::Result<Metrics> {
    let model = TitanicModel::load(&config.model)
        .with_context(|| format!("failed to load model {}", config.model.display()))?;
    let dataset = load_dataset(&config.dataset)
        .with_context(|| format!("failed to read dataset {}", config.dataset.display()))?;
    let (features, labels) = dataset
        .split_label(&config.label)
        .context("evaluation data has no usable label column")?;

    let metrics = match config.folds {
        Some(folds) => model
            .cross_validate(&features, &labels, folds)
            .with_context(|| format!("{folds}-fold cross-validation failed"))?,
        None => model.evaluate(&features, &labels)?,
    };
    info!(records = features.len(), folds = ?config.folds, "evaluation complete");
    Ok(metrics)
}

/// Loads a model and predicts a label for every record of the dataset.
///
/// When `config.output` is set the predictions are also written there.
pub fn run_prediction(config: &PredictConfig) -> anyhow::Result<Vec<u8>> {
    let model = TitanicModel::load(&config.model)
        .with_context(|| format!("failed to load model {}", config.model.display()))?;
    let dataset = load_dataset(&config.dataset)
        .with_context(|| format!("failed to read dataset {}", config.dataset.display()))?;
    let features = dataset.without_column(&config.label);

    let predictions = model.predict(&features)?;
    info!(records = predictions.len(), "prediction complete");

    if let Some(output) = &config.output {
        let file = File::create(output)
            .with_context(|| format!("failed to create {}", output.display()))?;
        let mut writer = BufWriter::new(file);
        write_predictions(&mut writer, &predictions)?;
        writer.flush()?;
    }
    Ok(predictions)
}

/// Writes one prediction per line.
pub fn write_predictions<W: Write>(writer: &mut W, predictions: &[u8]) -> std::io::Result<()> {
    for p in predictions {
        writeln!(writer, "{p}")?;
    }
    Ok(())
}
