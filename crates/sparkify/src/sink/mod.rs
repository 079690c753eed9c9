//! Sink components for writing output tables.

#[cfg(test)]
pub(crate) mod memory;
mod parquet;
mod traits;

pub use parquet::{ParquetTableSink, SUCCESS_MARKER};
pub use traits::{TableSink, TableWriteStats};
