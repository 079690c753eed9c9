//! Built-in schemas of the raw corpora.
//!
//! Field names are the ones used in the JSON records; renaming to output
//! column names happens in the transforms.

use crate::config::{FieldConfig, FieldType, SchemaConfig};

/// One song per file under `song_data/`.
pub fn song_data_v1() -> SchemaConfig {
    use FieldType::*;

    SchemaConfig {
        version: "v1".to_string(),
        fields: [
            ("num_songs", Int64),
            ("artist_id", String),
            ("artist_latitude", Float64),
            ("artist_longitude", Float64),
            ("artist_location", String),
            ("artist_name", String),
            ("song_id", String),
            ("title", String),
            ("duration", Float64),
            ("year", Int64),
        ]
        .into_iter()
        .map(|(name, field_type)| FieldConfig::new(name, field_type))
        .collect(),
    }
}

/// Player activity events under `log_data/`, one JSON object per line.
pub fn log_data_v1() -> SchemaConfig {
    use FieldType::*;

    SchemaConfig {
        version: "v1".to_string(),
        fields: [
            ("artist", String),
            ("auth", String),
            ("firstName", String),
            ("gender", String),
            ("itemInSession", Int64),
            ("lastName", String),
            ("length", Float64),
            ("level", String),
            ("location", String),
            ("method", String),
            ("page", String),
            ("registration", Float64),
            ("sessionId", Int64),
            ("song", String),
            ("status", Int64),
            ("ts", Int64),
            ("userAgent", String),
            ("userId", String),
        ]
        .into_iter()
        .map(|(name, field_type)| FieldConfig::new(name, field_type))
        .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_schemas_are_valid() {
        song_data_v1().validate("song_data").unwrap();
        log_data_v1().validate("log_data").unwrap();
    }

    #[test]
    fn test_song_schema_has_projection_columns() {
        let schema = song_data_v1().to_arrow_schema();
        for name in [
            "song_id",
            "title",
            "artist_id",
            "year",
            "duration",
            "artist_name",
            "artist_location",
            "artist_latitude",
            "artist_longitude",
        ] {
            assert!(schema.field_with_name(name).is_ok(), "missing {name}");
        }
    }

    #[test]
    fn test_log_user_id_is_string() {
        // userId is a quoted string in the log files, and empty for logged-out events
        let schema = log_data_v1().to_arrow_schema();
        assert_eq!(
            schema.field_with_name("userId").unwrap().data_type(),
            &deltalake::arrow::datatypes::DataType::Utf8
        );
    }
}
