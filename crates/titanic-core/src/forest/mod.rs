pub mod ensemble;
pub mod tree;

pub use ensemble::{ForestConfig, RandomForest};
pub use tree::{DecisionTree, Node, TreeConfig};
