//! Invoice normalization and financial summaries

pub mod normalize;
pub mod summary;

pub use normalize::*;
pub use summary::*;
