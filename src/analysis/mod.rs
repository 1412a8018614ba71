//! Analysis modules.
//!
//! Normalization of API responses and the statistics computed from them.

pub mod aggregator;

pub use aggregator::*;
