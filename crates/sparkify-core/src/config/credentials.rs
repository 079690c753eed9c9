//! Object-store credentials loaded from an INI-style file.
//!
//! The file format is the one produced by the usual AWS tooling templates:
//!
//! ```ini
//! [AWS]
//! AWS_ACCESS_KEY_ID = AKIA...
//! AWS_SECRET_ACCESS_KEY = ...
//! ```
//!
//! Credentials are returned as a value and handed to the storage builder. They
//! are never exported to the process environment.

use regex::Regex;
use snafu::prelude::*;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use crate::error::{
    ConfigError, EmptyCredentialsKeySnafu, MalformedCredentialsSnafu,
    MissingCredentialsKeySnafu, MissingCredentialsSectionSnafu, ReadCredentialsSnafu,
};

/// Section holding the AWS keys.
pub const AWS_SECTION: &str = "AWS";
/// Access key field name.
pub const ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
/// Secret key field name.
pub const SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";

static SECTION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[\s*(?P<name>[^\]]+?)\s*\]$").expect("Invalid regex pattern"));
static PAIR_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<key>[^=:\s][^=:]*?)\s*[=:]\s*(?P<value>.*)$").expect("Invalid regex pattern")
});

/// Parsed INI document: section name -> key -> value.
type Sections = HashMap<String, HashMap<String, String>>;

/// Access key pair for S3-compatible object stores.
#[derive(Clone, PartialEq, Eq)]
pub struct AwsCredentials {
    access_key_id: String,
    secret_access_key: String,
}

impl AwsCredentials {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
        }
    }

    /// Load credentials from the `[AWS]` section of an INI file.
    pub fn from_ini_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).context(ReadCredentialsSnafu { path })?;
        Self::from_ini_str(&contents)
    }

    /// Parse credentials from INI text.
    pub fn from_ini_str(contents: &str) -> Result<Self, ConfigError> {
        let sections = parse_ini(contents)?;
        let section = sections
            .get(AWS_SECTION)
            .context(MissingCredentialsSectionSnafu {
                section: AWS_SECTION,
            })?;

        let access_key_id = required(section, ACCESS_KEY_ID)?;
        let secret_access_key = required(section, SECRET_ACCESS_KEY)?;

        Ok(Self {
            access_key_id,
            secret_access_key,
        })
    }

    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    pub fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}

fn required(section: &HashMap<String, String>, key: &str) -> Result<String, ConfigError> {
    let value = section.get(&key.to_ascii_lowercase()).context(MissingCredentialsKeySnafu {
        section: AWS_SECTION,
        key,
    })?;
    ensure!(!value.is_empty(), EmptyCredentialsKeySnafu { key });
    Ok(value.clone())
}

/// Parse INI text into sections.
///
/// Keys outside of any section are rejected, as are lines that are not a
/// section header, a `key = value` / `key: value` pair, or a comment. Keys
/// are case-insensitive and stored lowercased; section names and values are
/// kept verbatim.
fn parse_ini(contents: &str) -> Result<Sections, ConfigError> {
    let mut sections = Sections::new();
    let mut current: Option<String> = None;

    for (idx, raw) in contents.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(caps) = SECTION_LINE.captures(line) {
            let name = caps["name"].to_string();
            sections.entry(name.clone()).or_default();
            current = Some(name);
            continue;
        }

        let malformed = || MalformedCredentialsSnafu {
            line: idx + 1,
            content: raw.to_string(),
        };

        let caps = PAIR_LINE.captures(line).with_context(malformed)?;
        let section = current.as_ref().with_context(malformed)?;
        sections
            .entry(section.clone())
            .or_default()
            .insert(
                caps["key"].trim().to_ascii_lowercase(),
                caps["value"].trim().to_string(),
            );
    }

    Ok(sections)
}
