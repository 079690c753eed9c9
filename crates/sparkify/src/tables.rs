//! The star-schema output tables.

use std::fmt;

/// Name and physical layout of one output table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
    pub name: &'static str,
    /// Hive partition columns, outermost first.
    pub partition_by: &'static [&'static str],
}

pub const SONGS: TableSpec = TableSpec {
    name: "songs",
    partition_by: &["year", "artist_id"],
};

pub const ARTISTS: TableSpec = TableSpec {
    name: "artists",
    partition_by: &[],
};

pub const USERS: TableSpec = TableSpec {
    name: "users",
    partition_by: &[],
};

pub const TIME: TableSpec = TableSpec {
    name: "time",
    partition_by: &["year"],
};

pub const SONGPLAYS: TableSpec = TableSpec {
    name: "songplays",
    partition_by: &["year", "month"],
};

/// Every table, in the order a run writes them.
pub const ALL_TABLES: [TableSpec; 5] = [SONGS, ARTISTS, USERS, TIME, SONGPLAYS];

impl TableSpec {
    /// Directory of the table relative to the output location,
    /// e.g. `songs/songs.parquet/`.
    pub fn relative_dir(&self) -> String {
        format!("{0}/{0}.parquet/", self.name)
    }

    pub fn partition_columns(&self) -> Vec<String> {
        self.partition_by.iter().map(|c| c.to_string()).collect()
    }

    pub fn is_partitioned(&self) -> bool {
        !self.partition_by.is_empty()
    }
}

impl fmt::Display for TableSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
