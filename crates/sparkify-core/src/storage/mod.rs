//! Object storage abstraction.
//!
//! Provides a unified interface for working with S3 (and S3-compatible
//! endpoints) and the local filesystem.

mod local;
mod s3;
mod url_parser;

pub use local::LocalConfig;
pub use s3::S3Config;
pub use url_parser::BackendConfig;

use futures::{StreamExt, TryStreamExt};
use object_store::path::Path;
use object_store::{ObjectStore, PutPayload};
use snafu::prelude::*;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::config::AwsCredentials;
use crate::error::{IoSnafu, ObjectStoreSnafu, StorageError};

/// Storage provider rooted at a URL prefix.
///
/// Paths passed to and returned from the provider are relative to the
/// configured key prefix.
#[derive(Clone)]
pub struct StorageProvider {
    pub(crate) config: BackendConfig,
    pub(crate) object_store: Arc<dyn ObjectStore>,
    pub(crate) canonical_url: String,
}

impl std::fmt::Debug for StorageProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StorageProvider<{}>", self.canonical_url)
    }
}

impl StorageProvider {
    /// Create a storage provider for the given URL.
    ///
    /// `options` are passed through to the backend builder (region, endpoint,
    /// ...). When `credentials` are given they take precedence over any key
    /// material found in the environment.
    pub async fn for_url(
        url: &str,
        options: &HashMap<String, String>,
        credentials: Option<&AwsCredentials>,
    ) -> Result<Self, StorageError> {
        let config = BackendConfig::parse_url(url)?;

        match config {
            BackendConfig::S3(config) => Self::construct_s3(config, options, credentials),
            BackendConfig::Local(config) => Self::construct_local(config).await,
        }
    }

    /// The underlying object store, rooted at the bucket (S3) or directory (local).
    pub fn object_store(&self) -> Arc<dyn ObjectStore> {
        Arc::clone(&self.object_store)
    }

    /// Get the backend configuration.
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Canonical URL of the storage location, for logging.
    pub fn canonical_url(&self) -> &str {
        &self.canonical_url
    }

    /// Qualify a path with the configured key prefix.
    pub fn qualify_path<'a>(&self, path: &'a Path) -> Cow<'a, Path> {
        match self.config.key() {
            Some(prefix) => Cow::Owned(prefix.parts().chain(path.parts()).collect()),
            None => Cow::Borrowed(path),
        }
    }

    /// List every object below the configured prefix, recursively.
    ///
    /// Returns paths relative to the prefix, sorted.
    pub async fn list_all(&self) -> Result<Vec<Path>, StorageError> {
        let key_part_count = self
            .config
            .key()
            .map(|key| key.parts().count())
            .unwrap_or_default();

        let mut paths: Vec<Path> = self
            .object_store
            .list(self.config.key())
            .map_ok(|meta| meta.location.parts().skip(key_part_count).collect::<Path>())
            .try_collect()
            .await
            .context(ObjectStoreSnafu)?;

        paths.sort();
        Ok(paths)
    }

    /// Put a payload to a path.
    pub async fn put_payload(&self, path: &Path, payload: PutPayload) -> Result<(), StorageError> {
        let path = self.qualify_path(path);
        self.object_store
            .put(&path, payload)
            .await
            .context(ObjectStoreSnafu)?;
        Ok(())
    }

    /// Remove everything below the configured prefix.
    ///
    /// Returns the number of objects removed. On the local filesystem the
    /// emptied directory tree is removed as well so that stale partition
    /// directories do not survive an overwrite.
    pub async fn delete_all(&self) -> Result<usize, StorageError> {
        if let BackendConfig::Local(local) = &self.config {
            let root = std::path::Path::new(&local.path);
            let count = self.list_all().await?.len();
            match tokio::fs::remove_dir_all(root).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => return Err(StorageError::Io { source }),
            }
            tokio::fs::create_dir_all(root).await.context(IoSnafu)?;
            debug!(url = %self.canonical_url, objects = count, "Cleared local prefix");
            return Ok(count);
        }

        let locations = self
            .object_store
            .list(self.config.key())
            .map_ok(|meta| meta.location)
            .boxed();

        let deleted: Vec<Path> = self
            .object_store
            .delete_stream(locations)
            .try_collect()
            .await
            .context(ObjectStoreSnafu)?;

        debug!(url = %self.canonical_url, objects = deleted.len(), "Cleared prefix");
        Ok(deleted.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use tempfile::TempDir;

    async fn local_provider(path: &std::path::Path) -> StorageProvider {
        StorageProvider::for_url(path.to_str().unwrap(), &HashMap::new(), None)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_list_all_returns_relative_paths() {
        let temp_dir = TempDir::new().unwrap();
        let table_dir = temp_dir.path().join("songs/songs.parquet");
        let nested = table_dir.join("year=2000").join("artist_id=A1");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("part-0.parquet"), b"data").unwrap();
        std::fs::write(table_dir.join("_SUCCESS"), b"").unwrap();

        let storage = local_provider(&table_dir).await;
        let listed: Vec<String> = storage
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.to_string())
            .collect();

        assert_eq!(
            listed,
            vec!["_SUCCESS", "year=2000/artist_id=A1/part-0.parquet"]
        );
    }

    #[tokio::test]
    async fn test_put_payload_below_prefix() {
        let temp_dir = TempDir::new().unwrap();
        let storage = local_provider(&temp_dir.path().join("users/users.parquet")).await;

        storage
            .put_payload(&Path::from("_SUCCESS"), PutPayload::from(Bytes::new()))
            .await
            .unwrap();

        assert!(temp_dir.path().join("users/users.parquet/_SUCCESS").is_file());
        assert_eq!(storage.list_all().await.unwrap(), vec![Path::from("_SUCCESS")]);
    }

    #[tokio::test]
    async fn test_delete_all_clears_partition_tree() {
        let temp_dir = TempDir::new().unwrap();
        let table_dir = temp_dir.path().join("time");
        for year in ["2018", "2019"] {
            let dir = table_dir.join(format!("year={year}"));
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join("part-0.parquet"), b"data").unwrap();
        }

        let storage = local_provider(&table_dir).await;
        let removed = storage.delete_all().await.unwrap();

        assert_eq!(removed, 2);
        assert!(table_dir.exists());
        assert_eq!(std::fs::read_dir(&table_dir).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_delete_all_on_fresh_location() {
        let temp_dir = TempDir::new().unwrap();
        let storage = local_provider(&temp_dir.path().join("never-written")).await;
        assert_eq!(storage.delete_all().await.unwrap(), 0);
    }
}
