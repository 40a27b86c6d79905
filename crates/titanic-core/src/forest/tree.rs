//! Binary classification tree grown on Gini impurity.

use oorandom::Rand64;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TitanicError};

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeConfig {
    /// Maximum depth; `None` grows until leaves are pure.
    pub max_depth: Option<usize>,
    /// Nodes with fewer samples than this become leaves.
    pub min_samples_split: usize,
    /// Features sampled as split candidates at each node.
    pub max_features: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        positive: u32,
        total: u32,
    },
}

/// A fitted tree stored as a flat node arena; node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

struct Grower<'a> {
    rows: &'a [Vec<f64>],
    labels: &'a [u8],
    n_features: usize,
    config: TreeConfig,
    rng: &'a mut Rand64,
    nodes: Vec<Node>,
}

impl DecisionTree {
    /// Grows a tree on the samples named by `indices`. Indices may repeat,
    /// which is how bootstrap samples are expressed.
    pub fn fit(
        rows: &[Vec<f64>],
        labels: &[u8],
        indices: &[usize],
        config: TreeConfig,
        rng: &mut Rand64,
    ) -> Self {
        let n_features = rows.first().map_or(0, Vec::len);
        let mut grower = Grower {
            rows,
            labels,
            n_features,
            config,
            rng,
            nodes: Vec::new(),
        };
        grower.grow(indices, 0);
        Self {
            nodes: grower.nodes,
        }
    }

    /// Fraction of positive training samples in the leaf `row` falls into.
    #[must_use]
    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { positive, total } => {
                    return if *total == 0 {
                        0.0
                    } else {
                        f64::from(*positive) / f64::from(*total)
                    };
                }
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn from_nodes(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Checks the arena is walkable for rows of width `n_features`.
    ///
    /// Children must sit after their parent and inside the arena, which also
    /// rules out cycles. Fails with [`TitanicError::ArtifactCorrupt`].
    pub fn validate(&self, n_features: usize) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(TitanicError::ArtifactCorrupt("tree has no nodes".into()));
        }
        let len = self.nodes.len();
        for (idx, node) in self.nodes.iter().enumerate() {
            match *node {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature >= n_features {
                        return Err(TitanicError::ArtifactCorrupt(format!(
                            "node {idx} splits on feature {feature} of {n_features}"
                        )));
                    }
                    if threshold.is_nan() {
                        return Err(TitanicError::ArtifactCorrupt(format!(
                            "node {idx} has a NaN threshold"
                        )));
                    }
                    for child in [left, right] {
                        if child <= idx || child >= len {
                            return Err(TitanicError::ArtifactCorrupt(format!(
                                "node {idx} links to child {child} in an arena of {len}"
                            )));
                        }
                    }
                }
                Node::Leaf { positive, total } => {
                    if positive > total {
                        return Err(TitanicError::ArtifactCorrupt(format!(
                            "leaf {idx} counts {positive} positives of {total}"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Longest root-to-leaf path, counted in edges.
    #[must_use]
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match &nodes[idx] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() { 0 } else { walk(&self.nodes, 0) }
    }
}

impl Grower<'_> {
    fn grow(&mut self, indices: &[usize], depth: usize) -> usize {
        let total = indices.len();
        let positive = indices.iter().filter(|&&i| self.labels[i] == 1).count();

        let depth_reached = self.config.max_depth.is_some_and(|d| depth >= d);
        let pure = positive == 0 || positive == total;
        if depth_reached || pure || total < self.config.min_samples_split.max(2) {
            return self.leaf(positive, total);
        }

        let Some((feature, threshold)) = self.best_split(indices) else {
            return self.leaf(positive, total);
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .copied()
            .partition(|&i| self.rows[i][feature] <= threshold);

        let node = self.nodes.len();
        // placeholder, replaced once both children exist
        self.nodes.push(Node::Leaf {
            positive: 0,
            total: 0,
        });
        let left = self.grow(&left_idx, depth + 1);
        let right = self.grow(&right_idx, depth + 1);
        self.nodes[node] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        node
    }

    fn leaf(&mut self, positive: usize, total: usize) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(Node::Leaf {
            positive: positive as u32,
            total: total as u32,
        });
        idx
    }

    /// Visits features in random order. The first `max_features` are always
    /// evaluated; further features are only tried while no valid split has
    /// been found (all sampled features constant in this node).
    fn best_split(&mut self, indices: &[usize]) -> Option<(usize, f64)> {
        let mut order: Vec<usize> = (0..self.n_features).collect();
        for i in (1..order.len()).rev() {
            let j = self.rng.rand_range(0..(i as u64 + 1)) as usize;
            order.swap(i, j);
        }

        let mut best: Option<(usize, f64, f64)> = None;
        for (visited, &feature) in order.iter().enumerate() {
            if visited >= self.config.max_features && best.is_some() {
                break;
            }
            if let Some((threshold, impurity)) = self.best_threshold(indices, feature) {
                if best.is_none_or(|(_, _, b)| impurity < b) {
                    best = Some((feature, threshold, impurity));
                }
            }
        }
        best.map(|(f, t, _)| (f, t))
    }

    /// Best threshold on one feature as `(threshold, weighted gini)`.
    fn best_threshold(&self, indices: &[usize], feature: usize) -> Option<(f64, f64)> {
        let mut pairs: Vec<(f64, u8)> = indices
            .iter()
            .map(|&i| (self.rows[i][feature], self.labels[i]))
            .collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let n = pairs.len();
        let total_pos = pairs.iter().filter(|p| p.1 == 1).count();
        let mut left_pos = 0usize;
        let mut best: Option<(f64, f64)> = None;

        for i in 0..n - 1 {
            if pairs[i].1 == 1 {
                left_pos += 1;
            }
            if pairs[i].0 == pairs[i + 1].0 {
                continue;
            }
            let left_n = i + 1;
            let right_n = n - left_n;
            let impurity = left_n as f64 * gini(left_pos, left_n)
                + right_n as f64 * gini(total_pos - left_pos, right_n);

            if best.is_none_or(|(_, b)| impurity < b) {
                let threshold = (pairs[i].0 + pairs[i + 1].0) / 2.0;
                best = Some((threshold, impurity));
            }
        }
        best
    }
}

fn gini(positive: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let p = positive as f64 / total as f64;
    2.0 * p * (1.0 - p)
}
