//! Report output: the delimited table and the run summary.

pub mod generator;
pub mod writer;

pub use generator::render_summary;
pub use writer::{write_atomic, write_table};
