//! Configuration helpers shared across the workspace.

mod credentials;
mod path;
mod vars;

pub use credentials::{ACCESS_KEY_ID, AWS_SECTION, AwsCredentials, SECRET_ACCESS_KEY};
pub use path::{CliArgs, is_yaml_file};
pub use vars::{InterpolationResult, interpolate, interpolate_with};

use serde::{Deserialize, Serialize};

/// Parquet compression codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ParquetCompression {
    Uncompressed,
    #[default]
    Snappy,
    Gzip,
    Zstd,
    Lz4,
}

impl ParquetCompression {
    /// Codec string understood by the engine's parquet writer options.
    pub fn as_writer_option(self) -> &'static str {
        match self {
            ParquetCompression::Uncompressed => "uncompressed",
            ParquetCompression::Snappy => "snappy",
            ParquetCompression::Gzip => "gzip(6)",
            ParquetCompression::Zstd => "zstd(3)",
            ParquetCompression::Lz4 => "lz4_raw",
        }
    }
}
