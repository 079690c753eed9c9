//! Partitioned Parquet output.
//!
//! Each table is written below `<output>/<name>/<name>.parquet/` in overwrite
//! mode: the prefix is cleared, the frame is written with the engine's
//! partitioned Parquet writer, and a `_SUCCESS` marker is added last.

use bytes::Bytes;
use deltalake::arrow::array::{Array, UInt64Array};
use deltalake::arrow::datatypes::DataType;
use deltalake::arrow::record_batch::RecordBatch;
use deltalake::datafusion::config::TableParquetOptions;
use deltalake::datafusion::dataframe::DataFrameWriteOptions;
use deltalake::datafusion::error::DataFusionError;
use deltalake::datafusion::functions::expr_fn::coalesce;
use deltalake::datafusion::logical_expr::{cast, ident, lit};
use deltalake::datafusion::prelude::DataFrame;
use object_store::PutPayload;
use object_store::path::Path;
use snafu::prelude::*;
use tracing::{debug, info};

use async_trait::async_trait;
use sparkify_core::{HIVE_DEFAULT_PARTITION, ParquetCompression, PartitionExtractor};

use crate::config::EtlConfig;
use crate::error::{EngineSnafu, EtlError};
use crate::location::Location;
use crate::session::EtlSession;
use crate::tables::TableSpec;

use super::traits::{TableSink, TableWriteStats};

/// Completion marker written after a table's data files.
pub const SUCCESS_MARKER: &str = "_SUCCESS";

/// Writes tables as Hive-partitioned Parquet below an output location.
#[derive(Debug, Clone)]
pub struct ParquetTableSink {
    session: EtlSession,
    output: Location,
    compression: ParquetCompression,
    deterministic: bool,
}

impl ParquetTableSink {
    pub fn new(session: &EtlSession, config: &EtlConfig) -> Result<Self, EtlError> {
        Ok(Self {
            session: session.clone(),
            output: config.output_location()?,
            compression: config.parquet.compression,
            deterministic: config.deterministic_output,
        })
    }

    /// Location of a table's directory.
    pub fn table_location(&self, table: &TableSpec) -> Result<Location, EtlError> {
        Ok(self.output.join_dir(&table.relative_dir())?)
    }

    fn writer_options(&self) -> TableParquetOptions {
        let mut options = TableParquetOptions::default();
        options.global.compression = Some(self.compression.as_writer_option().to_string());
        options
    }
}

#[async_trait]
impl TableSink for ParquetTableSink {
    async fn write_table(
        &self,
        table: &TableSpec,
        frame: DataFrame,
    ) -> Result<TableWriteStats, EtlError> {
        let location = self.table_location(table)?;
        let storage = self.session.storage_for(&location).await?;

        let removed = storage.delete_all().await?;
        if removed > 0 {
            debug!(table = %table, objects = removed, "Cleared previous output");
        }

        let frame = fill_null_partitions(frame, table).context(EngineSnafu {
            stage: format!("prepare {table} partitions"),
        })?;

        let frame = if self.deterministic {
            sort_all_columns(frame).context(EngineSnafu {
                stage: format!("sort {table}"),
            })?
        } else {
            frame
        };

        info!(table = %table, location = %location, "Writing {table} table...");

        let write_options =
            DataFrameWriteOptions::new().with_partition_by(table.partition_columns());
        let batches = frame
            .write_parquet(location.as_str(), write_options, Some(self.writer_options()))
            .await
            .context(EngineSnafu {
                stage: format!("write {table}"),
            })?;
        let rows = written_rows(&batches);

        storage
            .put_payload(&Path::from(SUCCESS_MARKER), PutPayload::from(Bytes::new()))
            .await?;

        let listed: Vec<String> = storage
            .list_all()
            .await?
            .iter()
            .map(ToString::to_string)
            .collect();
        let extractor = PartitionExtractor::new(table.partition_columns());

        let stats = TableWriteStats {
            table: table.name.to_string(),
            rows,
            files: listed.iter().filter(|p| p.ends_with(".parquet")).count(),
            partitions: extractor.partition_dirs(listed.iter().map(String::as_str)),
        };

        info!(
            table = %table,
            rows = stats.rows,
            files = stats.files,
            partitions = stats.partitions.len(),
            "Wrote table"
        );
        Ok(stats)
    }
}

/// Render partition columns as strings, with nulls as the Hive default
/// partition value.
///
/// The engine's partitioned writer reads a null slot's raw value, so a null
/// `year` would otherwise land in `year=0`.
pub(crate) fn fill_null_partitions(
    frame: DataFrame,
    table: &TableSpec,
) -> Result<DataFrame, DataFusionError> {
    table.partition_by.iter().try_fold(frame, |frame, name| {
        frame.with_column(
            name,
            coalesce(vec![
                cast(ident(*name), DataType::Utf8),
                lit(HIVE_DEFAULT_PARTITION),
            ]),
        )
    })
}

/// Order rows by every column, left to right.
fn sort_all_columns(frame: DataFrame) -> Result<DataFrame, DataFusionError> {
    let order: Vec<_> = frame
        .schema()
        .fields()
        .iter()
        .map(|field| ident(field.name()).sort(true, true))
        .collect();
    frame.sort(order)
}

/// Row count reported by the engine's write, one `count` row per batch.
fn written_rows(batches: &[RecordBatch]) -> u64 {
    batches
        .iter()
        .filter_map(|batch| batch.column_by_name("count"))
        .filter_map(|column| column.as_any().downcast_ref::<UInt64Array>())
        .flat_map(|counts| counts.iter().flatten())
        .sum()
}
