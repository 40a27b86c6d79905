use serde::{Deserialize, Serialize};

use crate::error::{Result, TitanicError};
use crate::forest::ForestConfig;

/// Default ensemble size.
pub const DEFAULT_N_TREES: usize = 200;
/// Default PRNG seed for bootstrap sampling and feature subsets.
pub const DEFAULT_SEED: u64 = 42;

/// Hyperparameters fixed when a model is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelParams {
    /// Number of trees in the ensemble.
    pub n_trees: usize,
    /// Seed making repeated fits on the same data identical.
    pub seed: u64,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            n_trees: DEFAULT_N_TREES,
            seed: DEFAULT_SEED,
        }
    }
}

impl ModelParams {
    #[must_use]
    pub fn new(n_trees: usize) -> Self {
        Self {
            n_trees,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_trees == 0 {
            return Err(TitanicError::InvalidParams(
                "ensemble size must be a positive integer".into(),
            ));
        }
        Ok(())
    }

    pub(crate) fn forest_config(&self) -> ForestConfig {
        ForestConfig {
            n_trees: self.n_trees,
            seed: self.seed,
            ..ForestConfig::default()
        }
    }
}
