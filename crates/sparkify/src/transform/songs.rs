//! Song catalog: the `songs` and `artists` dimensions.

use deltalake::datafusion::error::DataFusionError;
use deltalake::datafusion::logical_expr::ident;
use deltalake::datafusion::prelude::DataFrame;
use snafu::prelude::*;
use tracing::info;

use crate::config::EtlConfig;
use crate::error::{EngineSnafu, EtlError};
use crate::location::Location;
use crate::session::EtlSession;
use crate::sink::{TableSink, TableWriteStats};
use crate::source::{Dataset, load_json};
use crate::tables::{ARTISTS, SONGS};

/// Distinct `{song_id, title, artist_id, year, duration}`.
pub fn songs_table(songs: DataFrame) -> Result<DataFrame, DataFusionError> {
    songs
        .select(vec![
            ident("song_id"),
            ident("title"),
            ident("artist_id"),
            ident("year"),
            ident("duration"),
        ])?
        .distinct()
}

/// Distinct artists, with the `artist_` prefix dropped from attribute names.
pub fn artists_table(songs: DataFrame) -> Result<DataFrame, DataFusionError> {
    songs
        .select(vec![
            ident("artist_id"),
            ident("artist_name").alias("name"),
            ident("artist_location").alias("location"),
            ident("artist_latitude").alias("latitude"),
            ident("artist_longitude").alias("longitude"),
        ])?
        .distinct()
}

/// Load the song corpus and write `songs` and `artists`.
pub async fn process_song_data(
    session: &EtlSession,
    sink: &dyn TableSink,
    input: &Location,
    config: &EtlConfig,
) -> Result<Vec<TableWriteStats>, EtlError> {
    let songs = load_json(
        session,
        input,
        Dataset::Song,
        &config.schemas.song(),
        config.validate_schemas,
    )
    .await?;

    info!("Building songs table...");
    let songs_frame = songs_table(songs.clone()).context(EngineSnafu {
        stage: "build songs",
    })?;
    let songs_stats = sink.write_table(&SONGS, songs_frame).await?;

    info!("Building artists table...");
    let artists_frame = artists_table(songs).context(EngineSnafu {
        stage: "build artists",
    })?;
    let artists_stats = sink.write_table(&ARTISTS, artists_frame).await?;

    Ok(vec![songs_stats, artists_stats])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::memory::MemorySink;
    use tempfile::TempDir;

    fn song(song_id: &str, artist_id: &str, artist_name: &str, year: i64) -> String {
        format!(
            r#"{{"num_songs": 1, "artist_id": "{artist_id}", "artist_latitude": 35.14968, "artist_longitude": -90.04892, "artist_location": "Memphis, TN", "artist_name": "{artist_name}", "song_id": "{song_id}", "title": "Title {song_id}", "duration": 218.93179, "year": {year}}}"#
        )
    }

    fn write_song(root: &std::path::Path, relative: &str, contents: &str) {
        let path = root.join("song_data").join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    async fn run(dir: &TempDir) -> MemorySink {
        let session = EtlSession::local();
        let sink = MemorySink::new();
        let input = Location::parse(dir.path().to_str().unwrap()).unwrap();
        let config = EtlConfig::with_locations(input.as_str(), "/tmp/unused");

        let stats = process_song_data(&session, &sink, &input, &config)
            .await
            .unwrap();
        assert_eq!(stats.len(), 2);
        sink
    }

    #[tokio::test]
    async fn test_songs_and_artists_are_distinct() {
        let dir = TempDir::new().unwrap();
        // Same song delivered twice, and two songs by one artist
        write_song(dir.path(), "A/A/A/TR1.json", &song("S1", "A1", "Artist One", 2000));
        write_song(dir.path(), "A/A/B/TR1-copy.json", &song("S1", "A1", "Artist One", 2000));
        write_song(dir.path(), "A/B/A/TR2.json", &song("S2", "A1", "Artist One", 0));
        write_song(dir.path(), "B/A/A/TR3.json", &song("S3", "A2", "Artist Two", 2004));

        let sink = run(&dir).await;

        assert_eq!(sink.row_count("songs"), 3);
        assert_eq!(
            sink.column_names("songs"),
            vec!["song_id", "title", "artist_id", "year", "duration"]
        );

        assert_eq!(sink.row_count("artists"), 2);
        assert_eq!(
            sink.column_names("artists"),
            vec!["artist_id", "name", "location", "latitude", "longitude"]
        );

        let songs = sink.rows("songs");
        let mut deduped = songs.clone();
        deduped.dedup();
        assert_eq!(songs, deduped);
    }

    #[tokio::test]
    async fn test_songs_partitions() {
        let dir = TempDir::new().unwrap();
        write_song(dir.path(), "A/A/A/TR1.json", &song("S1", "A1", "Artist One", 2000));
        write_song(dir.path(), "A/A/B/TR2.json", &song("S2", "A2", "Artist Two", 0));

        let session = EtlSession::local();
        let sink = MemorySink::new();
        let input = Location::parse(dir.path().to_str().unwrap()).unwrap();
        let config = EtlConfig::with_locations(input.as_str(), "/tmp/unused");

        let stats = process_song_data(&session, &sink, &input, &config)
            .await
            .unwrap();

        assert_eq!(
            stats[0].partitions.iter().cloned().collect::<Vec<_>>(),
            vec!["year=0/artist_id=A2", "year=2000/artist_id=A1"]
        );
        assert!(stats[1].partitions.is_empty());
    }

    #[tokio::test]
    async fn test_artist_with_conflicting_attributes_keeps_both_rows() {
        let dir = TempDir::new().unwrap();
        write_song(dir.path(), "A/A/A/TR1.json", &song("S1", "A1", "Artist One", 2000));
        write_song(dir.path(), "A/A/B/TR2.json", &song("S2", "A1", "Artist 1", 2001));

        let sink = run(&dir).await;
        assert_eq!(sink.row_count("artists"), 2);
    }
}
