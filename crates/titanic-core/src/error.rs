use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while preparing data, fitting, or persisting a model.
#[derive(Debug, Error)]
pub enum TitanicError {
    /// One or more required feature columns are absent from the input.
    #[error("the dataset does not include the columns: {columns:?}")]
    MissingColumn {
        /// Every requested column that was not found, in selector order.
        columns: Vec<String>,
    },

    /// Training data has mismatched lengths or a degenerate label set.
    #[error("invalid training data: {0}")]
    InvalidTrainingData(String),

    /// `predict`, `evaluate` or `save` was called before `fit` or `load`.
    #[error("model has not yet been fit")]
    ModelNotFitted,

    /// No artifact exists at the given path.
    #[error("model artifact not found: {}", path.display())]
    ArtifactNotFound {
        /// The path that did not resolve.
        path: PathBuf,
    },

    /// The artifact exists but could not be decoded.
    #[error("model artifact is corrupt: {0}")]
    ArtifactCorrupt(String),

    /// Hyperparameters were rejected at construction time.
    #[error("invalid model parameters: {0}")]
    InvalidParams(String),

    /// The dataset itself is malformed (ragged records, unreadable values).
    #[error("invalid dataset: {0}")]
    InvalidDataset(String),

    /// A label value was neither 0 nor 1.
    #[error("invalid label at row {row}: {value}")]
    InvalidLabel {
        /// Zero-based record index.
        row: usize,
        /// The offending value, rendered for display.
        value: String,
    },

    /// A categorical value was not seen while fitting.
    #[error("unknown category {value:?} in column {column:?}")]
    UnknownCategory {
        /// Column holding the value.
        column: String,
        /// The unseen value.
        value: String,
    },

    /// Underlying filesystem failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TitanicError {
    /// Stable, machine-readable reason code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingColumn { .. } => "missing_column",
            Self::InvalidTrainingData(_) => "invalid_training_data",
            Self::ModelNotFitted => "model_not_fitted",
            Self::ArtifactNotFound { .. } => "artifact_not_found",
            Self::ArtifactCorrupt(_) => "artifact_corrupt",
            Self::InvalidParams(_) => "invalid_params",
            Self::InvalidDataset(_) => "invalid_dataset",
            Self::InvalidLabel { .. } => "invalid_label",
            Self::UnknownCategory { .. } => "unknown_category",
            Self::Io(_) => "io_error",
        }
    }

    /// Returns `true` when the fault lies with the caller's input rather
    /// than with the model or the environment.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingColumn { .. }
                | Self::InvalidTrainingData(_)
                | Self::InvalidDataset(_)
                | Self::InvalidLabel { .. }
                | Self::UnknownCategory { .. }
        )
    }
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, TitanicError>;
