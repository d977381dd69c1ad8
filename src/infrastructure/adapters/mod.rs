//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod extractor;
pub mod generation;

pub use extractor::*;
pub use generation::*;
