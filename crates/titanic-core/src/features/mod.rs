pub mod encoder;
pub mod selector;

pub use encoder::{ColumnEncoding, FeatureEncoder};
pub use selector::{ColumnSelector, FeatureFrame};
