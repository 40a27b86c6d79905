//! Bagged ensemble of decision trees.

use oorandom::Rand64;
use serde::{Deserialize, Serialize};

use super::tree::{DecisionTree, TreeConfig};
use crate::error::{Result, TitanicError};

/// Training settings for [`RandomForest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub seed: u64,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 200,
            seed: 42,
            max_depth: None,
            min_samples_split: 2,
        }
    }
}

/// Trees fitted on bootstrap samples with random feature subsets,
/// combined by averaging their leaf probabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_features: usize,
}

impl RandomForest {
    /// Fits `config.n_trees` trees. The caller guarantees `rows` is
    /// rectangular, non-empty, and as long as `labels`.
    pub fn fit(rows: &[Vec<f64>], labels: &[u8], config: &ForestConfig) -> Self {
        let n_samples = rows.len();
        let n_features = rows.first().map_or(0, Vec::len);
        let tree_config = TreeConfig {
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            max_features: max_features(n_features),
        };

        let mut seeder = Rand64::new(u128::from(config.seed));
        let mut trees = Vec::with_capacity(config.n_trees);

        for t in 0..config.n_trees {
            let mut rng = Rand64::new(u128::from(seeder.rand_u64()));
            let bootstrap: Vec<usize> = (0..n_samples)
                .map(|_| rng.rand_range(0..n_samples as u64) as usize)
                .collect();

            let tree = DecisionTree::fit(rows, labels, &bootstrap, tree_config, &mut rng);
            tracing::trace!(tree = t, nodes = tree.nodes().len(), depth = tree.depth(), "grew tree");
            trees.push(tree);
        }

        Self { trees, n_features }
    }

    /// Mean positive-class probability over all trees.
    #[must_use]
    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.trees.iter().map(|t| t.predict_proba(row)).sum();
        sum / self.trees.len() as f64
    }

    /// Class 1 iff the ensemble probability exceeds one half.
    #[must_use]
    pub fn predict(&self, row: &[f64]) -> u8 {
        u8::from(self.predict_proba(row) > 0.5)
    }

    #[cfg(test)]
    pub(crate) fn from_trees(trees: Vec<DecisionTree>, n_features: usize) -> Self {
        Self { trees, n_features }
    }

    /// Validates every tree against the forest's feature width.
    pub fn validate(&self) -> Result<()> {
        if self.trees.is_empty() {
            return Err(TitanicError::ArtifactCorrupt("forest has no trees".into()));
        }
        for (t, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features).map_err(|e| match e {
                TitanicError::ArtifactCorrupt(msg) => {
                    TitanicError::ArtifactCorrupt(format!("tree {t}: {msg}"))
                }
                other => other,
            })?;
        }
        Ok(())
    }

    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }
}

/// `floor(sqrt(n))`, at least one.
fn max_features(n_features: usize) -> usize {
    ((n_features as f64).sqrt().floor() as usize).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> (Vec<Vec<f64>>, Vec<u8>) {
        let rows = vec![
            vec![3.0, 1.0],
            vec![1.0, 0.0],
            vec![3.0, 1.0],
            vec![1.0, 0.0],
            vec![2.0, 0.0],
            vec![2.0, 1.0],
        ];
        let labels = vec![0, 1, 0, 1, 1, 0];
        (rows, labels)
    }

    #[test]
    fn fits_requested_number_of_trees() {
        let (rows, labels) = data();
        let config = ForestConfig {
            n_trees: 10,
            ..Default::default()
        };
        let forest = RandomForest::fit(&rows, &labels, &config);
        assert_eq!(forest.n_trees(), 10);
        assert_eq!(forest.n_features(), 2);
    }

    #[test]
    fn same_seed_is_reproducible() {
        let (rows, labels) = data();
        let config = ForestConfig {
            n_trees: 15,
            seed: 9,
            ..Default::default()
        };
        let a = RandomForest::fit(&rows, &labels, &config);
        let b = RandomForest::fit(&rows, &labels, &config);
        assert_eq!(a, b);
    }

    #[test]
    fn learns_simple_rule() {
        let (rows, labels) = data();
        let forest = RandomForest::fit(&rows, &labels, &ForestConfig::default());

        assert_eq!(forest.predict(&[1.0, 0.0]), 1);
        assert_eq!(forest.predict(&[3.0, 1.0]), 0);
        let p = forest.predict_proba(&[1.0, 0.0]);
        assert!((0.0..=1.0).contains(&p));
    }

    #[test]
    fn validate_names_the_broken_tree() {
        let (rows, labels) = data();
        let forest = RandomForest::fit(&rows, &labels, &ForestConfig::default());
        forest.validate().unwrap();

        let mut trees = forest.trees.clone();
        trees.push(DecisionTree::from_nodes(Vec::new()));
        let broken = RandomForest::from_trees(trees, 2);
        match broken.validate() {
            Err(TitanicError::ArtifactCorrupt(msg)) => assert!(msg.starts_with("tree 200:"), "{msg}"),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(RandomForest::from_trees(Vec::new(), 2).validate().is_err());
    }

    #[test]
    fn max_features_is_sqrt() {
        assert_eq!(max_features(1), 1);
        assert_eq!(max_features(2), 1);
        assert_eq!(max_features(9), 3);
        assert_eq!(max_features(0), 1);
    }
}
