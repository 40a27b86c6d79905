//! The model shared by all request handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use titanic_core::{Result, TitanicModel};
use tracing::{info, warn};

use crate::error::ApiError;

/// What the endpoint currently has loaded.
#[derive(Debug)]
pub enum ModelState {
    /// A fitted model is available for prediction.
    Ready(Arc<TitanicModel>),
    /// Loading failed; the reason is reported to prediction callers.
    Failed(String),
}

/// Holds the current [`ModelState`] behind a swappable reference.
///
/// Readers clone the inner `Arc` and drop the lock before predicting, so a
/// reload only waits for the pointer swap, never for in-flight predictions.
#[derive(Debug)]
pub struct ModelSlot {
    path: PathBuf,
    state: RwLock<Arc<ModelState>>,
}

impl ModelSlot {
    /// Loads the artifact at `path`. Never fails: a load error leaves the
    /// slot in [`ModelState::Failed`].
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = match TitanicModel::load(&path) {
            Ok(model) => ModelState::Ready(Arc::new(model)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "model failed to load");
                ModelState::Failed(e.to_string())
            }
        };
        Self {
            path,
            state: RwLock::new(Arc::new(state)),
        }
    }

    /// A slot that is ready with an already fitted model. `path` is used by
    /// later reloads.
    pub fn with_model(path: impl Into<PathBuf>, model: TitanicModel) -> Self {
        Self {
            path: path.into(),
            state: RwLock::new(Arc::new(ModelState::Ready(Arc::new(model)))),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn current(&self) -> Arc<ModelState> {
        Arc::clone(&self.state.read())
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(*self.current(), ModelState::Ready(_))
    }

    /// The loaded model, or a 503 error when loading failed.
    pub fn model(&self) -> std::result::Result<Arc<TitanicModel>, ApiError> {
        match &*self.current() {
            ModelState::Ready(model) => Ok(Arc::clone(model)),
            ModelState::Failed(reason) => Err(ApiError::unavailable(format!(
                "model is not loaded: {reason}"
            ))),
        }
    }

    /// Re-reads the artifact and swaps it in. The new model is fully decoded
    /// before the swap; on error the previous state is kept.
    pub fn reload(&self) -> Result<()> {
        let model = TitanicModel::load(&self.path)?;
        *self.state.write() = Arc::new(ModelState::Ready(Arc::new(model)));
        info!(path = %self.path.display(), "model reloaded");
        Ok(())
    }
}
