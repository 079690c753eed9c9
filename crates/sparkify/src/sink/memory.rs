//! In-memory sink for transform tests.

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use deltalake::arrow::record_batch::RecordBatch;
use deltalake::arrow::util::display::array_value_to_string;
use deltalake::datafusion::prelude::DataFrame;
use snafu::prelude::*;

use crate::error::{EngineSnafu, EtlError};
use crate::tables::TableSpec;

use super::parquet::fill_null_partitions;
use super::traits::{TableSink, TableWriteStats};

/// Collects every written table as record batches, replacing earlier writes
/// of the same table.
#[derive(Debug, Default)]
pub struct MemorySink {
    tables: Mutex<HashMap<String, Vec<RecordBatch>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Batches of a written table, if any.
    pub fn batches(&self, table: &str) -> Option<Vec<RecordBatch>> {
        self.tables.lock().unwrap().get(table).cloned()
    }

    /// Rows of a written table, each rendered as display strings.
    pub fn rows(&self, table: &str) -> Vec<Vec<String>> {
        let mut rows = Vec::new();
        for batch in self.batches(table).unwrap_or_default() {
            for row in 0..batch.num_rows() {
                rows.push(
                    batch
                        .columns()
                        .iter()
                        .map(|column| array_value_to_string(column, row).unwrap())
                        .collect(),
                );
            }
        }
        rows.sort();
        rows
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.batches(table)
            .unwrap_or_default()
            .iter()
            .map(RecordBatch::num_rows)
            .sum()
    }

    pub fn column_names(&self, table: &str) -> Vec<String> {
        self.batches(table)
            .and_then(|batches| batches.first().cloned())
            .map(|batch| {
                batch
                    .schema()
                    .fields()
                    .iter()
                    .map(|f| f.name().clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn partition_dirs(table: &TableSpec, batches: &[RecordBatch]) -> BTreeSet<String> {
    let mut dirs = BTreeSet::new();
    if !table.is_partitioned() {
        return dirs;
    }

    for batch in batches {
        for row in 0..batch.num_rows() {
            let segments: Vec<String> = table
                .partition_by
                .iter()
                .map(|name| {
                    let column = batch.column_by_name(name).unwrap();
                    let value = array_value_to_string(column, row).unwrap();
                    format!("{name}={value}")
                })
                .collect();
            dirs.insert(segments.join("/"));
        }
    }
    dirs
}

#[async_trait]
impl TableSink for MemorySink {
    async fn write_table(
        &self,
        table: &TableSpec,
        frame: DataFrame,
    ) -> Result<TableWriteStats, EtlError> {
        let batches = fill_null_partitions(frame, table)
            .context(EngineSnafu {
                stage: format!("prepare {table} partitions"),
            })?
            .collect()
            .await
            .context(EngineSnafu {
                stage: format!("collect {table}"),
            })?;

        let stats = TableWriteStats {
            table: table.name.to_string(),
            rows: batches.iter().map(|b| b.num_rows() as u64).sum(),
            files: 1,
            partitions: partition_dirs(table, &batches),
        };

        self.tables
            .lock()
            .unwrap()
            .insert(table.name.to_string(), batches);
        Ok(stats)
    }
}
