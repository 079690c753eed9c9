//! S3 storage backend implementation.

use object_store::aws::AmazonS3Builder;
use object_store::path::Path;
use object_store::{ObjectStore, RetryConfig};
use snafu::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::config::AwsCredentials;
use crate::error::{S3ConfigSnafu, StorageError};

use super::{BackendConfig, StorageProvider};

/// S3 storage configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Config {
    pub endpoint: Option<String>,
    pub region: Option<String>,
    pub bucket: String,
    pub key: Option<Path>,
}

impl S3Config {
    /// URL under which the bucket-rooted store is registered with the query engine.
    pub fn bucket_url(&self) -> String {
        format!("s3://{}", self.bucket)
    }
}

/// Requests fail on the first error.
fn no_retry() -> RetryConfig {
    RetryConfig {
        max_retries: 0,
        ..RetryConfig::default()
    }
}

impl StorageProvider {
    pub(super) fn construct_s3(
        config: S3Config,
        options: &HashMap<String, String>,
        credentials: Option<&AwsCredentials>,
    ) -> Result<Self, StorageError> {
        let mut builder = AmazonS3Builder::from_env().with_bucket_name(&config.bucket);

        for (key, value) in options {
            builder = builder.with_config(key.parse().context(S3ConfigSnafu)?, value.clone());
        }

        if let Some(credentials) = credentials {
            debug!(bucket = %config.bucket, "Using explicit S3 credentials");
            builder = builder
                .with_access_key_id(credentials.access_key_id())
                .with_secret_access_key(credentials.secret_access_key());
        }

        builder = builder.with_retry(no_retry());

        if let Some(region) = &config.region {
            builder = builder.with_region(region);
        }

        if let Some(endpoint) = &config.endpoint {
            builder = builder
                .with_endpoint(endpoint)
                .with_virtual_hosted_style_request(false)
                .with_allow_http(true);
        }

        let canonical_url = match &config.key {
            Some(key) => format!("s3://{}/{}", config.bucket, key),
            None => format!("s3://{}", config.bucket),
        };

        let object_store: Arc<dyn ObjectStore> =
            Arc::new(builder.build().context(S3ConfigSnafu)?);

        Ok(Self {
            config: BackendConfig::S3(config),
            object_store,
            canonical_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(bucket: &str) -> S3Config {
        S3Config {
            endpoint: Some("http://localhost:9000".to_string()),
            region: Some("us-west-2".to_string()),
            bucket: bucket.to_string(),
            key: Some(Path::from("songs/songs.parquet")),
        }
    }

    #[test]
    fn test_construct_with_explicit_credentials() {
        let creds = AwsCredentials::new("AKIAEXAMPLE", "secret");
        let provider =
            StorageProvider::construct_s3(config("sparkify"), &HashMap::new(), Some(&creds))
                .unwrap();

        assert_eq!(provider.canonical_url(), "s3://sparkify/songs/songs.parquet");
        assert_eq!(config("sparkify").bucket_url(), "s3://sparkify");
    }

    #[test]
    fn test_requests_are_not_retried() {
        assert_eq!(no_retry().max_retries, 0);
    }

    #[test]
    fn test_unknown_option_is_rejected() {
        let mut options = HashMap::new();
        options.insert("not_a_real_option".to_string(), "x".to_string());

        let result = StorageProvider::construct_s3(config("sparkify"), &options, None);
        assert!(matches!(result, Err(StorageError::S3Config { .. })));
    }
}
