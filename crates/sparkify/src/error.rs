//! Error types for the sparkify ETL.

use deltalake::datafusion::error::DataFusionError;
use snafu::prelude::*;

// Re-export common errors
pub use sparkify_core::error::{ConfigError, StorageError};

/// Top-level ETL errors.
///
/// Every variant is fatal: the run aborts on the first error and nothing is
/// retried.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum EtlError {
    /// Configuration or credentials error.
    #[snafu(display("Configuration error: {source}"))]
    Config { source: ConfigError },

    /// Storage error (connectivity, authentication, listing, deletes).
    #[snafu(display("Storage error: {source}"))]
    Storage { source: StorageError },

    /// Query engine error while running a named stage.
    #[snafu(display("Engine error during {stage}: {source}"))]
    Engine {
        stage: String,
        source: DataFusionError,
    },

    /// Input data does not match the declared schema.
    #[snafu(display(
        "Schema mismatch in {dataset}:\n  {}",
        problems.join("\n  ")
    ))]
    SchemaMismatch {
        dataset: String,
        problems: Vec<String>,
    },

    /// Input glob matched nothing.
    #[snafu(display("No input files matched {pattern} under {location}"))]
    NoInputFiles { location: String, pattern: String },
}

impl EtlError {
    /// Check if this error represents a "not found" condition.
    pub fn is_not_found(&self) -> bool {
        match self {
            EtlError::Storage { source } => source.is_not_found(),
            EtlError::NoInputFiles { .. } => true,
            _ => false,
        }
    }
}

impl From<StorageError> for EtlError {
    fn from(source: StorageError) -> Self {
        EtlError::Storage { source }
    }
}

impl From<ConfigError> for EtlError {
    fn from(source: ConfigError) -> Self {
        EtlError::Config { source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_mismatch_lists_every_problem() {
        let err = EtlError::SchemaMismatch {
            dataset: "log_data".to_string(),
            problems: vec!["field 'ts' missing".to_string(), "field 'page' bad".to_string()],
        };
        let message = err.to_string();
        assert!(message.contains("log_data"));
        assert!(message.contains("field 'ts' missing"));
        assert!(message.contains("field 'page' bad"));
    }

    #[test]
    fn test_engine_error_names_stage() {
        let err = EtlError::Engine {
            stage: "write songs".to_string(),
            source: DataFusionError::Plan("bad plan".to_string()),
        };
        assert!(err.to_string().starts_with("Engine error during write songs"));
    }

    #[test]
    fn test_no_input_files_is_not_found() {
        let err = EtlError::NoInputFiles {
            location: "s3://udacity-dend".to_string(),
            pattern: "log_data/*.json".to_string(),
        };
        assert!(err.is_not_found());
    }
}
