//! Sparkify: song and activity-log ETL into a partitioned Parquet star schema.
//!
//! This crate handles:
//! - Discovering the raw `song_data/` and `log_data/` JSON corpora (S3 or local)
//! - Loading them with declared schemas through the DataFusion engine
//! - Deriving the `songs`, `artists`, `users`, `time` and `songplays` tables
//! - Writing each table as Hive-partitioned Parquet in overwrite mode

pub mod config;
pub mod driver;
pub mod error;
pub mod location;
pub mod session;
pub mod sink;
pub mod source;
pub mod tables;
pub mod transform;

// Re-export commonly used items
pub use config::EtlConfig;
pub use driver::{RunSummary, run_etl, run_with_sink};
pub use error::EtlError;
pub use location::Location;
pub use session::EtlSession;
pub use sink::{ParquetTableSink, TableSink, TableWriteStats};

// Re-export from sparkify-core
pub use sparkify_core::{AwsCredentials, CliArgs, ParquetCompression, init_tracing};
