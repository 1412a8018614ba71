//! USAspending API access.
//!
//! This module provides the HTTP source, the year-range and breakdown
//! fetchers, and the memoizing service the CLI talks to.

pub mod fetcher;
pub mod service;
pub mod source;

#[cfg(test)]
pub mod stub;

pub use fetcher::FetchMode;
pub use service::{spending_in, ServiceSettings, SpendingService};
pub use source::{HttpSource, DEFAULT_BASE_URL};
