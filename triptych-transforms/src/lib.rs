pub mod aggregate;
pub mod bin;
pub mod error;
pub mod pipeline;
pub mod timeunit;
