//! # Titanic Trainer
//!
//! Reads tabular datasets from disk and drives the model through the
//! `train`, `evaluate` and `predict` commands exposed by the `titanic`
//! binary.

pub mod data;
pub mod trainer;

pub use data::{load_dataset, read_csv, read_json, DatasetFormat};
pub use trainer::{
    run_evaluation, run_prediction, run_training, write_predictions, EvaluateConfig,
    PredictConfig, TrainConfig,
};
