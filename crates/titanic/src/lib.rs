//! Umbrella crate for the survival classifier.
//!
//! - [`core`]: dataset model, feature encoding, the forest and persistence
//! - [`trainer`]: dataset readers and the train/evaluate/predict workflows
//! - [`serve`]: the HTTP prediction endpoint

pub use titanic_core as core;
pub use titanic_serve as serve;
pub use titanic_trainer as trainer;

pub use titanic_core::{
    Dataset, Labels, Metrics, ModelParams, Record, Result, TitanicError, TitanicModel, Value,
};
