//! Input datasets.
//!
//! Both corpora are newline-delimited JSON under a base location. Files are
//! discovered by listing the object store with the dataset's glob and then
//! handed to the engine as an explicit file list, read with the declared
//! schema.

pub mod schemas;

use deltalake::datafusion::prelude::{DataFrame, NdJsonReadOptions};
use snafu::prelude::*;
use tracing::{debug, info};

use sparkify_core::{GlobPattern, list_matching, validate_schema};

use crate::config::SchemaConfig;
use crate::error::{EngineSnafu, EtlError, NoInputFilesSnafu, SchemaMismatchSnafu};
use crate::location::Location;
use crate::session::EtlSession;

/// The two raw corpora.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    Song,
    Log,
}

impl Dataset {
    /// Name of the dataset, also used as its SQL view name.
    pub fn name(self) -> &'static str {
        match self {
            Dataset::Song => "song_data",
            Dataset::Log => "log_data",
        }
    }

    /// Files of the dataset, relative to the input location.
    pub fn glob(self) -> &'static str {
        match self {
            Dataset::Song => "song_data/*/*/*/*.json",
            Dataset::Log => "log_data/*.json",
        }
    }
}

/// List the files of `dataset` below `input` as engine-addressable URLs.
pub async fn discover(
    session: &EtlSession,
    input: &Location,
    dataset: Dataset,
) -> Result<Vec<String>, EtlError> {
    let storage = session.storage_for(input).await?;
    let pattern = GlobPattern::new(dataset.glob())?;
    let files = list_matching(&storage, &pattern).await?;

    ensure!(
        !files.is_empty(),
        NoInputFilesSnafu {
            location: input.to_string(),
            pattern: dataset.glob(),
        }
    );

    files
        .iter()
        .map(|file| -> Result<String, EtlError> { Ok(input.join(file)?.to_string()) })
        .collect()
}

/// Load every file of `dataset` below `input` into one frame.
///
/// The frame has exactly the declared schema's columns. When `validate` is
/// set, the schema the engine infers from the files is checked against the
/// declared one first, and every incompatibility is reported together.
pub async fn load_json(
    session: &EtlSession,
    input: &Location,
    dataset: Dataset,
    schema: &SchemaConfig,
    validate: bool,
) -> Result<DataFrame, EtlError> {
    info!(
        dataset = dataset.name(),
        location = %input,
        schema_version = %schema.version,
        "Loading {}...",
        dataset.name()
    );

    let files = discover(session, input, dataset).await?;
    debug!(dataset = dataset.name(), files = files.len(), "Discovered input files");

    let declared = schema.to_arrow_schema();

    if validate {
        let inferred = session
            .ctx()
            .read_json(files.clone(), NdJsonReadOptions::default())
            .await
            .context(EngineSnafu {
                stage: format!("infer {} schema", dataset.name()),
            })?;

        let problems = validate_schema(&declared, inferred.schema().as_arrow());
        ensure!(
            problems.is_empty(),
            SchemaMismatchSnafu {
                dataset: dataset.name(),
                problems: problems.iter().map(ToString::to_string).collect::<Vec<_>>(),
            }
        );
    }

    session
        .ctx()
        .read_json(files, NdJsonReadOptions::default().schema(&declared))
        .await
        .context(EngineSnafu {
            stage: format!("load {}", dataset.name()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::schemas::{log_data_v1, song_data_v1};
    use tempfile::TempDir;

    fn write(root: &std::path::Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    const SONG: &str = r#"{"num_songs": 1, "artist_id": "A1", "artist_latitude": null, "artist_longitude": null, "artist_location": "", "artist_name": "Artist", "song_id": "S1", "title": "Song", "duration": 200.5, "year": 2000}"#;

    #[tokio::test]
    async fn test_load_song_data_with_declared_schema() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "song_data/A/B/C/TR1.json", SONG);
        write(dir.path(), "song_data/A/B/TR_ignored.json", SONG);

        let session = EtlSession::local();
        let input = Location::parse(dir.path().to_str().unwrap()).unwrap();

        let df = load_json(&session, &input, Dataset::Song, &song_data_v1(), true)
            .await
            .unwrap();

        assert_eq!(df.schema().fields().len(), 10);
        assert_eq!(df.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_missing_files_fail_fast() {
        let dir = TempDir::new().unwrap();
        let session = EtlSession::local();
        let input = Location::parse(dir.path().to_str().unwrap()).unwrap();

        let err = load_json(&session, &input, Dataset::Log, &log_data_v1(), true)
            .await
            .unwrap_err();
        assert!(matches!(err, EtlError::NoInputFiles { .. }));
    }

    #[tokio::test]
    async fn test_schema_drift_is_reported() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "log_data/2018-11-01-events.json",
            r#"{"artist": "A", "page": "NextSong", "ts": "not-a-number"}"#,
        );

        let session = EtlSession::local();
        let input = Location::parse(dir.path().to_str().unwrap()).unwrap();

        let err = load_json(&session, &input, Dataset::Log, &log_data_v1(), true)
            .await
            .unwrap_err();
        match err {
            EtlError::SchemaMismatch { dataset, problems } => {
                assert_eq!(dataset, "log_data");
                assert!(problems.iter().any(|p| p.contains("'ts'")));
                assert!(problems.iter().any(|p| p.contains("'userId'")));
            }
            other => panic!("Expected SchemaMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_dataset_globs() {
        assert_eq!(Dataset::Song.glob(), "song_data/*/*/*/*.json");
        assert_eq!(Dataset::Log.glob(), "log_data/*.json");
        assert_eq!(Dataset::Log.name(), "log_data");
    }
}
