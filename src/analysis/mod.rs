//! Analysis modules.
//!
//! Aggregation over settled agent results for reporting and exit codes.

pub mod aggregator;

pub use aggregator::*;
