//! Vectorized time derivations on event timestamps.
//!
//! Event `ts` values are epoch milliseconds. They are truncated to whole
//! seconds and interpreted in UTC; all parts are computed by the engine's
//! built-in columnar functions.

use deltalake::arrow::datatypes::{DataType, TimeUnit};
use deltalake::datafusion::functions::expr_fn::{date_part, to_timestamp_seconds};
use deltalake::datafusion::logical_expr::{Expr, cast, lit};

/// Calendar parts of the time dimension, in column order.
pub const TIME_PARTS: [&str; 5] = ["hour", "day", "week", "month", "year"];

/// `start_time` from epoch milliseconds, at microsecond precision.
pub fn start_time(ts_millis: Expr) -> Expr {
    cast(
        to_timestamp_seconds(vec![ts_millis / lit(1000_i64)]),
        DataType::Timestamp(TimeUnit::Microsecond, None),
    )
}

/// One calendar part (`hour`, `day`, `week`, `month`, `year`, `dow`) as Int32.
///
/// `week` is the ISO-8601 week of year.
pub fn part(name: &str, timestamp: Expr) -> Expr {
    cast(date_part(lit(name), timestamp), DataType::Int32)
}

/// Day of week with Sunday = 1 through Saturday = 7.
pub fn weekday(timestamp: Expr) -> Expr {
    part("dow", timestamp) + lit(1_i32)
}
