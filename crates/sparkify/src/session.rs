//! Compute session bootstrap.
//!
//! One [`EtlSession`] is created per run and handed to every transform. It
//! owns the query engine context and knows how to reach each configured
//! location: S3 buckets get an object store registered with the engine, built
//! from the run's credentials; `file://` locations use the engine's built-in
//! local store.

use std::collections::{BTreeSet, HashMap};

use deltalake::datafusion::prelude::{SessionConfig, SessionContext};
use tracing::{debug, info};

use sparkify_core::{AwsCredentials, StorageProvider};

use crate::config::EtlConfig;
use crate::error::EtlError;
use crate::location::Location;

/// Shared handle to the query engine and object stores.
#[derive(Clone)]
pub struct EtlSession {
    ctx: SessionContext,
    storage_options: HashMap<String, String>,
    credentials: Option<AwsCredentials>,
}

impl std::fmt::Debug for EtlSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EtlSession")
            .field("session_id", &self.ctx.session_id())
            .field("credentials", &self.credentials)
            .finish()
    }
}

impl EtlSession {
    /// Create the session for a run and register every S3 bucket that the
    /// input or output location refers to.
    pub async fn bootstrap(
        config: &EtlConfig,
        credentials: Option<AwsCredentials>,
    ) -> Result<Self, EtlError> {
        let session = Self::new(
            config.target_partitions,
            config.storage_options.clone(),
            credentials,
        );

        let buckets: BTreeSet<String> = [config.input_location()?, config.output_location()?]
            .iter()
            .filter_map(Location::bucket_url)
            .map(|url| url.to_string())
            .collect();

        for bucket in buckets {
            session.register_bucket(&bucket).await?;
        }

        info!(
            target_partitions = config.target_partitions,
            "Compute session ready"
        );
        Ok(session)
    }

    /// A session with no remote stores, for local runs.
    pub fn local() -> Self {
        Self::new(EtlConfig::default().target_partitions, HashMap::new(), None)
    }

    fn new(
        target_partitions: usize,
        storage_options: HashMap<String, String>,
        credentials: Option<AwsCredentials>,
    ) -> Self {
        let config = SessionConfig::new().with_target_partitions(target_partitions.max(1));
        Self {
            ctx: SessionContext::new_with_config(config),
            storage_options,
            credentials,
        }
    }

    /// Engine context.
    pub fn ctx(&self) -> &SessionContext {
        &self.ctx
    }

    /// Storage provider rooted at `location`, using the run's credentials.
    pub async fn storage_for(&self, location: &Location) -> Result<StorageProvider, EtlError> {
        let storage = StorageProvider::for_url(
            &location.storage_url(),
            &self.storage_options,
            self.credentials.as_ref(),
        )
        .await?;
        Ok(storage)
    }

    async fn register_bucket(&self, bucket_url: &str) -> Result<(), EtlError> {
        let location = Location::parse(bucket_url)?;
        let storage = self.storage_for(&location).await?;

        if let Some(url) = location.bucket_url() {
            self.ctx.register_object_store(&url, storage.object_store());
            debug!(bucket = %url, "Registered object store");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deltalake::datafusion::execution::object_store::ObjectStoreUrl;

    #[tokio::test]
    async fn test_local_session_runs_queries() {
        let session = EtlSession::local();
        let batches = session
            .ctx()
            .sql("SELECT 1 AS one")
            .await
            .unwrap()
            .collect()
            .await
            .unwrap();
        assert_eq!(batches[0].num_rows(), 1);
    }

    #[tokio::test]
    async fn test_bootstrap_registers_s3_buckets() {
        let mut config = EtlConfig::with_locations("s3a://udacity-dend/", "s3://sparkify-out/");
        config
            .storage_options
            .insert("region".to_string(), "us-west-2".to_string());
        let credentials = AwsCredentials::new("AKIAEXAMPLE", "secret");

        let session = EtlSession::bootstrap(&config, Some(credentials))
            .await
            .unwrap();

        let runtime = session.ctx().runtime_env();
        for bucket in ["s3://udacity-dend", "s3://sparkify-out"] {
            let url = ObjectStoreUrl::parse(bucket).unwrap();
            assert!(runtime.object_store(&url).is_ok(), "{bucket} not registered");
        }
    }

    #[tokio::test]
    async fn test_storage_for_local_location() {
        let dir = tempfile::TempDir::new().unwrap();
        let session = EtlSession::local();
        let location = Location::parse(dir.path().to_str().unwrap()).unwrap();

        let storage = session.storage_for(&location).await.unwrap();
        assert!(storage.list_all().await.unwrap().is_empty());
    }
}
