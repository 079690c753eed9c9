//! Traits for table sinks.
//!
//! Transforms hand finished frames to a [`TableSink`]; the sink decides where
//! and how they are persisted.

use std::collections::BTreeSet;
use std::fmt;

use async_trait::async_trait;
use deltalake::datafusion::prelude::DataFrame;

use crate::error::EtlError;
use crate::tables::TableSpec;

/// Outcome of writing one table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableWriteStats {
    pub table: String,
    /// Rows written.
    pub rows: u64,
    /// Data files present after the write.
    pub files: usize,
    /// Partition directories present after the write, e.g. `year=2018/month=11`.
    pub partitions: BTreeSet<String>,
}

impl fmt::Display for TableWriteStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} rows in {} files",
            self.table, self.rows, self.files
        )?;
        if !self.partitions.is_empty() {
            write!(f, " across {} partitions", self.partitions.len())?;
        }
        Ok(())
    }
}

/// Destination for finished tables.
///
/// Every write replaces whatever the table held before.
#[async_trait]
pub trait TableSink: Send + Sync {
    async fn write_table(
        &self,
        table: &TableSpec,
        frame: DataFrame,
    ) -> Result<TableWriteStats, EtlError>;
}
