//! Run orchestration.
//!
//! A run bootstraps one session, then derives the song-catalog tables and the
//! activity-log tables, strictly in that order. The first error aborts the
//! run; tables already written stay in place with their `_SUCCESS` markers.

use std::fmt;
use std::time::{Duration, Instant};

use tracing::info;

use sparkify_core::AwsCredentials;

use crate::config::EtlConfig;
use crate::error::EtlError;
use crate::session::EtlSession;
use crate::sink::{ParquetTableSink, TableSink, TableWriteStats};
use crate::transform::{process_log_data, process_song_data};

/// Statistics for a completed run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub tables: Vec<TableWriteStats>,
    pub elapsed: Duration,
}

impl RunSummary {
    /// Stats of one table, by name.
    pub fn table(&self, name: &str) -> Option<&TableWriteStats> {
        self.tables.iter().find(|stats| stats.table == name)
    }

    pub fn total_rows(&self) -> u64 {
        self.tables.iter().map(|stats| stats.rows).sum()
    }

    /// Emit one log line per table and a closing total.
    pub fn log(&self) {
        for stats in &self.tables {
            info!(
                table = %stats.table,
                rows = stats.rows,
                files = stats.files,
                partitions = stats.partitions.len(),
                "  {stats}"
            );
        }
        info!(
            tables = self.tables.len(),
            rows = self.total_rows(),
            elapsed_ms = self.elapsed.as_millis() as u64,
            "ETL complete"
        );
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} tables, {} rows in {:.1}s",
            self.tables.len(),
            self.total_rows(),
            self.elapsed.as_secs_f64()
        )
    }
}

/// Run the whole job against the configured locations.
pub async fn run_etl(
    config: &EtlConfig,
    credentials: Option<AwsCredentials>,
) -> Result<RunSummary, EtlError> {
    let session = EtlSession::bootstrap(config, credentials).await?;
    let sink = ParquetTableSink::new(&session, config)?;
    run_with_sink(&session, &sink, config).await
}

/// Run both transforms with an explicit session and sink.
pub async fn run_with_sink(
    session: &EtlSession,
    sink: &dyn TableSink,
    config: &EtlConfig,
) -> Result<RunSummary, EtlError> {
    let started = Instant::now();
    let input = config.input_location()?;

    info!(input = %input, output = %config.output_data, "Starting sparkify ETL");

    let mut tables = process_song_data(session, sink, &input, config).await?;
    tables.extend(process_log_data(session, sink, &input, config).await?);

    Ok(RunSummary {
        tables,
        elapsed: started.elapsed(),
    })
}
