//! Table derivations.
//!
//! Each routine takes the session and a sink explicitly, loads its inputs,
//! derives its tables with the engine and hands them to the sink.

pub mod logs;
pub mod songs;
pub mod time;

pub use logs::process_log_data;
pub use songs::process_song_data;
