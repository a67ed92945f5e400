//! Analysis modules.
//!
//! Turns parsed setup records into the output table and summary statistics.

pub mod aggregator;

pub use aggregator::*;
