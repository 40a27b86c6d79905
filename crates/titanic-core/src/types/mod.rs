pub mod dataset;
pub mod value;

pub use dataset::{Dataset, Labels, Record};
pub use value::Value;
