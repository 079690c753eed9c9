//! Input and output locations.
//!
//! A location is a directory-like URL that the engine can address:
//! `s3://bucket/prefix/` or `file:///abs/path/`. `s3a://` and `s3n://`
//! are accepted and normalized to `s3://`; plain filesystem paths become
//! `file://` URLs.

use std::fmt;

use url::Url;

use crate::error::ConfigError;

/// A normalized directory URL, always ending in `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    url: Url,
}

impl Location {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let raw = raw.trim();
        let invalid = |message: &str| ConfigError::InvalidLocation {
            location: raw.to_string(),
            message: message.to_string(),
        };

        let url = match Url::parse(raw) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let path = std::path::absolute(raw)
                    .map_err(|e| invalid(&format!("cannot resolve path: {e}")))?;
                Url::from_directory_path(&path)
                    .map_err(|()| invalid("not an absolute filesystem path"))?
            }
            Err(e) => return Err(invalid(&e.to_string())),
        };

        let mut url = match url.scheme() {
            "s3" | "file" => url,
            "s3a" | "s3n" => {
                let rest = &url.as_str()[url.scheme().len()..];
                Url::parse(&format!("s3{rest}")).map_err(|e| invalid(&e.to_string()))?
            }
            other => return Err(invalid(&format!("unsupported scheme '{other}'"))),
        };

        if url.scheme() == "s3" && url.host_str().is_none_or(str::is_empty) {
            return Err(invalid("missing bucket name"));
        }

        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(Self { url })
    }

    pub fn as_url(&self) -> &Url {
        &self.url
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    pub fn is_s3(&self) -> bool {
        self.url.scheme() == "s3"
    }

    /// `s3://bucket` for S3 locations.
    pub fn bucket_url(&self) -> Option<Url> {
        if !self.is_s3() {
            return None;
        }
        let bucket = self.url.host_str()?;
        Url::parse(&format!("s3://{bucket}")).ok()
    }

    /// Location of a subdirectory.
    pub fn join_dir(&self, relative: &str) -> Result<Location, ConfigError> {
        let relative = relative.trim_matches('/');
        Location::parse(self.join(&format!("{relative}/"))?.as_str())
    }

    /// URL of an object below this location.
    pub fn join(&self, relative: &str) -> Result<Url, ConfigError> {
        self.url
            .join(relative.trim_start_matches('/'))
            .map_err(|e| ConfigError::InvalidLocation {
                location: format!("{}{relative}", self.url),
                message: e.to_string(),
            })
    }

    /// URL or path understood by `StorageProvider::for_url`.
    pub fn storage_url(&self) -> String {
        match self.url.to_file_path() {
            Ok(path) if self.url.scheme() == "file" => path.to_string_lossy().into_owned(),
            _ => self.url.to_string(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}
