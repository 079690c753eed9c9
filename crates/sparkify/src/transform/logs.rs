//! Activity logs: the `users` and `time` dimensions and the `songplays` fact.

use deltalake::datafusion::error::DataFusionError;
use deltalake::datafusion::logical_expr::{ident, lit};
use deltalake::datafusion::prelude::{DataFrame, SessionContext};
use deltalake::datafusion::scalar::ScalarValue;
use snafu::prelude::*;
use tracing::info;

use crate::config::{EtlConfig, JoinKey, SongplaysConfig, SongplaysProjection, UserDedup};
use crate::error::{EngineSnafu, EtlError};
use crate::location::Location;
use crate::session::EtlSession;
use crate::sink::{TableSink, TableWriteStats};
use crate::source::{Dataset, load_json};
use crate::tables::{SONGPLAYS, TIME, USERS};

use super::time::{self, TIME_PARTS};

/// Page value of a song being played.
pub const NEXT_SONG: &str = "NextSong";

/// View holding the filtered events while the users query runs.
const EVENTS_VIEW: &str = "next_song_events";

/// Keep only song-play events.
pub fn next_song_events(logs: DataFrame) -> Result<DataFrame, DataFusionError> {
    logs.filter(ident("page").eq(lit(NEXT_SONG)))
}

/// Distinct users as seen in the events.
pub async fn users_table(
    ctx: &SessionContext,
    events: DataFrame,
    dedup: UserDedup,
) -> Result<DataFrame, DataFusionError> {
    match dedup {
        UserDedup::DistinctRows => events
            .select(vec![
                ident("userId").alias("user_id"),
                ident("firstName").alias("first_name"),
                ident("lastName").alias("last_name"),
                ident("gender"),
                ident("level"),
            ])?
            .distinct(),
        UserDedup::LatestLevel => {
            register_view(ctx, EVENTS_VIEW, events)?;
            ctx.sql(&format!(
                r#"SELECT user_id, first_name, last_name, gender, level
FROM (
    SELECT
        "userId" AS user_id,
        "firstName" AS first_name,
        "lastName" AS last_name,
        gender,
        level,
        ROW_NUMBER() OVER (PARTITION BY "userId" ORDER BY ts DESC NULLS LAST, level DESC) AS recency
    FROM {EVENTS_VIEW}
) AS ranked
WHERE recency = 1"#
            ))
            .await
        }
    }
}

/// Add `start_time`, derived from `ts`.
pub fn with_start_time(events: DataFrame) -> Result<DataFrame, DataFusionError> {
    events.with_column("start_time", time::start_time(ident("ts")))
}

/// Distinct `{start_time, hour, day, week, month, year, weekday}`.
///
/// Events without a timestamp have no place in the time dimension.
pub fn time_table(events: DataFrame) -> Result<DataFrame, DataFusionError> {
    let start_time = || ident("start_time");

    let mut columns = vec![start_time()];
    columns.extend(
        TIME_PARTS
            .iter()
            .map(|name| time::part(name, start_time()).alias(*name)),
    );
    columns.push(time::weekday(start_time()).alias("weekday"));

    events
        .filter(start_time().is_not_null())?
        .select(columns)?
        .distinct()
}

/// SQL joining `song_data` to `log_data`.
pub fn songplays_query(projection: SongplaysProjection, join_key: JoinKey) -> String {
    let select = match projection {
        SongplaysProjection::Columns => {
            r#"l.start_time AS start_time,
    l."userId" AS user_id,
    l.level AS level,
    s.song_id AS song_id,
    s.artist_id AS artist_id,
    l."sessionId" AS session_id,
    l.location AS location,
    l."userAgent" AS user_agent"#
        }
        SongplaysProjection::LegacyLiterals => {
            r#"'start_time' AS start_time,
    'userId' AS "userId",
    'level' AS level,
    'song_id' AS song_id,
    'artist_id' AS artist_id,
    'sessionId' AS "sessionId",
    'location' AS location,
    'userAgent' AS "userAgent""#
        }
    };

    let predicate = match join_key {
        JoinKey::ArtistName => "s.artist_name = l.artist",
        JoinKey::ArtistAndTitle => "s.artist_name = l.artist AND s.title = l.song",
    };

    format!(
        "SELECT\n    {select}\nFROM {song} s\nINNER JOIN {log} l\n    ON {predicate}",
        song = Dataset::Song.name(),
        log = Dataset::Log.name(),
    )
}

/// Join songs to events and add the `year`/`month` partition columns.
///
/// With the legacy projection there is no real `start_time` to derive them
/// from, so both are null and land in the default partition.
pub async fn songplays_table(
    ctx: &SessionContext,
    songs: DataFrame,
    events: DataFrame,
    config: &SongplaysConfig,
) -> Result<DataFrame, DataFusionError> {
    register_view(ctx, Dataset::Song.name(), songs)?;
    register_view(ctx, Dataset::Log.name(), events)?;

    let joined = ctx
        .sql(&songplays_query(config.projection, config.join_key))
        .await?;

    match config.projection {
        SongplaysProjection::Columns => joined
            .with_column("year", time::part("year", ident("start_time")))?
            .with_column("month", time::part("month", ident("start_time"))),
        SongplaysProjection::LegacyLiterals => joined
            .with_column("year", lit(ScalarValue::Int32(None)))?
            .with_column("month", lit(ScalarValue::Int32(None))),
    }
}

/// Register `frame` under `name`, replacing any earlier registration.
fn register_view(ctx: &SessionContext, name: &str, frame: DataFrame) -> Result<(), DataFusionError> {
    ctx.deregister_table(name)?;
    ctx.register_table(name, frame.into_view())?;
    Ok(())
}

/// Load the log corpus and write `users`, `time` and `songplays`.
pub async fn process_log_data(
    session: &EtlSession,
    sink: &dyn TableSink,
    input: &Location,
    config: &EtlConfig,
) -> Result<Vec<TableWriteStats>, EtlError> {
    let ctx = session.ctx();

    let logs = load_json(
        session,
        input,
        Dataset::Log,
        &config.schemas.log(),
        config.validate_schemas,
    )
    .await?;

    info!("Filtering {}...", Dataset::Log.name());
    let events = next_song_events(logs).context(EngineSnafu {
        stage: "filter log_data",
    })?;

    info!(dedup = ?config.users.dedup, "Building users table...");
    let users = users_table(ctx, events.clone(), config.users.dedup)
        .await
        .context(EngineSnafu {
            stage: "build users",
        })?;
    let users_stats = sink.write_table(&USERS, users).await?;

    let events = with_start_time(events).context(EngineSnafu {
        stage: "derive start_time",
    })?;

    info!("Building time table...");
    let time_frame = time_table(events.clone()).context(EngineSnafu {
        stage: "build time",
    })?;
    let time_stats = sink.write_table(&TIME, time_frame).await?;

    let songs = load_json(
        session,
        input,
        Dataset::Song,
        &config.schemas.song(),
        config.validate_schemas,
    )
    .await?;

    info!(
        projection = ?config.songplays.projection,
        join_key = ?config.songplays.join_key,
        "Joining song and log data..."
    );
    let songplays = songplays_table(ctx, songs, events, &config.songplays)
        .await
        .context(EngineSnafu {
            stage: "build songplays",
        })?;
    let songplays_stats = sink.write_table(&SONGPLAYS, songplays).await?;

    Ok(vec![users_stats, time_stats, songplays_stats])
}
