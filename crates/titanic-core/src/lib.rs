//! # Titanic Core
//!
//! Model lifecycle for the survival classifier: column selection, feature
//! encoding, a bagged decision-tree ensemble, evaluation metrics and the
//! binary artifact format used to persist fitted models.
//!
//! ## Quick Start
//!
//! ```rust
//! use titanic_core::{Dataset, ModelParams, TitanicModel};
//!
//! let train: Dataset = serde_json::from_str(r#"[
//!     {"Pclass": 3, "Sex": "male",   "Survived": 0},
//!     {"Pclass": 1, "Sex": "female", "Survived": 1},
//!     {"Pclass": 3, "Sex": "male",   "Survived": 0},
//!     {"Pclass": 2, "Sex": "female", "Survived": 1}
//! ]"#).unwrap();
//! let (features, labels) = train.split_label("Survived").unwrap();
//!
//! let mut model = TitanicModel::with_defaults(ModelParams::new(10)).unwrap();
//! model.fit(&features, &labels).unwrap();
//!
//! let predictions = model.predict(&features).unwrap();
//! assert_eq!(predictions.len(), 4);
//! ```
pub mod error;
pub mod features;
pub mod forest;
pub mod metrics;
pub mod model;
pub mod persist;
pub mod types;

// Re-export primary API
pub use error::{Result, TitanicError};
pub use features::{ColumnEncoding, ColumnSelector, FeatureEncoder, FeatureFrame};
pub use forest::{DecisionTree, ForestConfig, RandomForest};
pub use metrics::Metrics;
pub use model::{
    ModelParams, TitanicModel, DEFAULT_FEATURES, DEFAULT_FOLDS, DEFAULT_LABEL, DEFAULT_N_TREES,
    DEFAULT_SEED,
};
pub use types::{Dataset, Labels, Record, Value};
