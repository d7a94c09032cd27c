pub mod dataset;
pub mod types;
pub mod value;
