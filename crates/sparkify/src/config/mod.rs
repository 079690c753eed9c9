//! Configuration for the sparkify ETL.
//!
//! Every setting has a default, so running with no configuration file at all
//! reproduces the canonical job: read from `s3a://udacity-dend/`, write to
//! `s3a://pk-udacity-sparkify/`, take keys from `dl.cfg`.

mod schema;

pub use schema::{FieldConfig, FieldType, SchemaConfig};

use serde::{Deserialize, Serialize};
use snafu::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::location::Location;
use crate::source::schemas;
pub use sparkify_core::config::{AwsCredentials, ParquetCompression, interpolate};
use sparkify_core::error::{ReadFileSnafu, YamlParseSnafu};

pub const DEFAULT_INPUT_DATA: &str = "s3a://udacity-dend/";
pub const DEFAULT_OUTPUT_DATA: &str = "s3a://pk-udacity-sparkify/";
pub const DEFAULT_CREDENTIALS_FILE: &str = "dl.cfg";

/// Parquet writer settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParquetConfig {
    /// Compression codec.
    #[serde(default)]
    pub compression: ParquetCompression,
}

/// How the users dimension collapses repeated users.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserDedup {
    /// Full-row distinct. A user whose level changed appears once per level.
    #[default]
    DistinctRows,
    /// One row per user, carrying the level of their most recent event.
    LatestLevel,
}

/// Users table settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UsersConfig {
    #[serde(default)]
    pub dedup: UserDedup,
}

/// Select list of the songplays join.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SongplaysProjection {
    /// Real joined columns.
    #[default]
    Columns,
    /// Quoted string constants named after each column, with null year and
    /// month. Kept for output compatibility with earlier runs of the job.
    LegacyLiterals,
}

/// Join predicate between song and log records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinKey {
    /// `song_data.artist_name = log_data.artist`
    #[default]
    ArtistName,
    /// Artist name and song title must both match.
    ArtistAndTitle,
}

/// Songplays table settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SongplaysConfig {
    #[serde(default)]
    pub projection: SongplaysProjection,
    #[serde(default)]
    pub join_key: JoinKey,
}

/// Optional overrides of the built-in input schemas.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemasConfig {
    pub song: Option<SchemaConfig>,
    pub log: Option<SchemaConfig>,
}

impl SchemasConfig {
    /// Schema used to read the song corpus.
    pub fn song(&self) -> SchemaConfig {
        self.song.clone().unwrap_or_else(schemas::song_data_v1)
    }

    /// Schema used to read the log corpus.
    pub fn log(&self) -> SchemaConfig {
        self.log.clone().unwrap_or_else(schemas::log_data_v1)
    }
}

/// Main configuration for sparkify.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EtlConfig {
    /// Base location of the raw `song_data/` and `log_data/` corpora.
    #[serde(default = "default_input_data")]
    pub input_data: String,
    /// Base location under which the five tables are written.
    #[serde(default = "default_output_data")]
    pub output_data: String,
    /// INI file with an `[AWS]` section.
    #[serde(default = "default_credentials_file")]
    pub credentials_file: PathBuf,
    /// Engine parallelism.
    #[serde(default = "default_target_partitions")]
    pub target_partitions: usize,
    /// Sort rows before writing so reruns produce identical files.
    #[serde(default = "default_true")]
    pub deterministic_output: bool,
    /// Compare declared schemas with the data before loading.
    #[serde(default = "default_true")]
    pub validate_schemas: bool,
    /// Extra object store options (region, endpoint, ...).
    #[serde(default)]
    pub storage_options: HashMap<String, String>,
    #[serde(default)]
    pub parquet: ParquetConfig,
    #[serde(default)]
    pub users: UsersConfig,
    #[serde(default)]
    pub songplays: SongplaysConfig,
    #[serde(default)]
    pub schemas: SchemasConfig,
}

fn default_input_data() -> String {
    DEFAULT_INPUT_DATA.to_string()
}

fn default_output_data() -> String {
    DEFAULT_OUTPUT_DATA.to_string()
}

fn default_credentials_file() -> PathBuf {
    PathBuf::from(DEFAULT_CREDENTIALS_FILE)
}

fn default_target_partitions() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn default_true() -> bool {
    true
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            input_data: default_input_data(),
            output_data: default_output_data(),
            credentials_file: default_credentials_file(),
            target_partitions: default_target_partitions(),
            deterministic_output: true,
            validate_schemas: true,
            storage_options: HashMap::new(),
            parquet: ParquetConfig::default(),
            users: UsersConfig::default(),
            songplays: SongplaysConfig::default(),
            schemas: SchemasConfig::default(),
        }
    }
}

impl EtlConfig {
    /// Configuration reading from `input_data` and writing to `output_data`,
    /// everything else at its default.
    pub fn with_locations(input_data: impl Into<String>, output_data: impl Into<String>) -> Self {
        Self {
            input_data: input_data.into(),
            output_data: output_data.into(),
            ..Self::default()
        }
    }

    /// Load configuration from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).context(ReadFileSnafu { path })?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        // Interpolate environment variables
        let result = interpolate(contents);
        if !result.is_ok() {
            return Err(ConfigError::EnvInterpolation {
                message: result.errors.join("\n"),
            });
        }

        // An empty document means "all defaults"
        let config: EtlConfig = if result.text.trim().is_empty() {
            EtlConfig::default()
        } else {
            serde_yaml::from_str(&result.text).context(YamlParseSnafu)?
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input_data.trim().is_empty() {
            return Err(ConfigError::EmptyInputData);
        }
        if self.output_data.trim().is_empty() {
            return Err(ConfigError::EmptyOutputData);
        }
        if self.target_partitions == 0 {
            return Err(ConfigError::InvalidValue {
                field: "target_partitions".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        self.input_location()?;
        self.output_location()?;

        if let Some(schema) = &self.schemas.song {
            schema.validate("song_data")?;
        }
        if let Some(schema) = &self.schemas.log {
            schema.validate("log_data")?;
        }
        Ok(())
    }

    pub fn input_location(&self) -> Result<Location, ConfigError> {
        Location::parse(&self.input_data)
    }

    pub fn output_location(&self) -> Result<Location, ConfigError> {
        Location::parse(&self.output_data)
    }

    /// Whether any configured location lives on S3.
    pub fn uses_object_store(&self) -> Result<bool, ConfigError> {
        Ok(self.input_location()?.is_s3() || self.output_location()?.is_s3())
    }

    /// Load credentials from `credentials_file`.
    ///
    /// The file is required when any location is on S3 or when `required` is
    /// set (an explicit `--credentials` flag). Purely local runs skip it.
    pub fn load_credentials(&self, required: bool) -> Result<Option<AwsCredentials>, ConfigError> {
        if !required && !self.uses_object_store()? {
            return Ok(None);
        }
        AwsCredentials::from_ini_file(&self.credentials_file).map(Some)
    }
}
