//! Declarative multimodal specifications: field definitions, channel
//! encodings, resolution, inference, compilation, and the export codec.

pub mod channel;
pub mod codec;
pub mod compile;
pub mod defaults;
pub mod describe;
pub mod error;
pub mod field;
pub mod infer;
pub mod predicate;
pub mod resolve;
pub mod unit;
