//! sparkify-core: Shared building blocks for the sparkify ETL.
//!
//! - `storage/` - Object storage abstraction (S3 and S3-compatible endpoints, local)
//! - `config/` - Credentials loading, CLI arguments and environment variable interpolation
//! - `listing` - Glob-filtered object listing for input discovery
//! - `schema` - Declared-vs-inferred schema validation
//! - `partition` - Hive-style partition directory handling
//! - `error` - Common error types
//! - `tracing` - Log subscriber setup

pub mod config;
pub mod error;
pub mod listing;
pub mod partition;
pub mod schema;
pub mod storage;
pub mod tracing;

// Re-export commonly used items
pub use config::{AwsCredentials, CliArgs, ParquetCompression, interpolate, is_yaml_file};
pub use error::{ConfigError, StorageError};
pub use listing::{GlobPattern, list_matching};
pub use partition::{HIVE_DEFAULT_PARTITION, PartitionExtractor};
pub use schema::{SchemaProblem, validate_schema};
pub use storage::{BackendConfig, StorageProvider};
pub use tracing::init_tracing;
