//! Common error types shared by the sparkify crates.
//!
//! Storage and configuration errors live here so that both the core helpers
//! and the ETL crate can surface them without conversion boilerplate.

use snafu::prelude::*;

// ============ Storage Errors ============

/// Errors that can occur during storage operations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum StorageError {
    /// Invalid storage URL format.
    #[snafu(display("Invalid storage URL: {url}"))]
    InvalidUrl { url: String },

    /// Object store operation failed.
    #[snafu(display("Storage operation failed: {source}"))]
    ObjectStore { source: object_store::Error },

    /// IO error during storage operations.
    #[snafu(display("IO error: {source}"))]
    Io { source: std::io::Error },

    /// S3 configuration error.
    #[snafu(display("S3 configuration error: {source}"))]
    S3Config { source: object_store::Error },
}

impl StorageError {
    /// Check if this error represents a "not found" condition (404, NoSuchKey, etc.)
    pub fn is_not_found(&self) -> bool {
        match self {
            StorageError::ObjectStore { source } => {
                matches!(source, object_store::Error::NotFound { .. })
            }
            StorageError::Io { source } => source.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

// ============ Config Errors ============

/// Errors that can occur while loading configuration and credentials.
///
/// All of these are operator errors: they are reported before any data is
/// read and are never retried.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[snafu(display("Failed to read configuration file {}: {source}", path.display()))]
    ReadFile {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[snafu(display("Failed to parse YAML: {source}"))]
    YamlParse { source: serde_yaml::Error },

    /// Environment variable interpolation failed.
    #[snafu(display("Environment variable interpolation failed:\n{message}"))]
    EnvInterpolation { message: String },

    /// Credentials file is missing or unreadable.
    #[snafu(display("Failed to read credentials file {}: {source}", path.display()))]
    ReadCredentials {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    /// Credentials file has a line that is neither a section, a pair, nor a comment.
    #[snafu(display("Malformed credentials file at line {line}: {content}"))]
    MalformedCredentials { line: usize, content: String },

    /// Credentials file lacks the required section.
    #[snafu(display("Credentials file has no [{section}] section"))]
    MissingCredentialsSection { section: String },

    /// Credentials section lacks a required key.
    #[snafu(display("Credentials section [{section}] is missing {key}"))]
    MissingCredentialsKey { section: String, key: String },

    /// Credentials key is present but empty.
    #[snafu(display("Credentials key {key} is empty"))]
    EmptyCredentialsKey { key: String },

    /// Input location is empty.
    #[snafu(display("input_data cannot be empty"))]
    EmptyInputData,

    /// Output location is empty.
    #[snafu(display("output_data cannot be empty"))]
    EmptyOutputData,

    /// Location could not be turned into a URL.
    #[snafu(display("Invalid location '{location}': {message}"))]
    InvalidLocation { location: String, message: String },

    /// A setting is outside its allowed range.
    #[snafu(display("Invalid value for {field}: {message}"))]
    InvalidValue { field: String, message: String },

    /// Schema has no fields.
    #[snafu(display("Schema for {dataset} must have at least one field"))]
    EmptySchema { dataset: String },
}
