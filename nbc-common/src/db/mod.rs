//! Persistence gateway over the single-file SQLite store

pub mod back_checks;
pub mod farmers;
pub mod init;
pub mod locations;
pub mod migrations;
pub mod table;

pub use init::init_database;
pub use migrations::run_migrations;
pub use table::Table;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, SubsecRound, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

/// Current time, truncated to whole seconds, with its stored form
///
/// Fixed-width `YYYY-MM-DDTHH:MM:SSZ` so stored timestamps compare correctly
/// as text.
pub(crate) fn now_timestamp() -> (DateTime<Utc>, String) {
    let now = Utc::now().trunc_subsecs(0);
    (now, now.to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// Parse a stored timestamp
///
/// Accepts RFC 3339 (written by this service) and SQLite's
/// `CURRENT_TIMESTAMP` form (`YYYY-MM-DD HH:MM:SS`, UTC). Unparseable or
/// missing values map to the Unix epoch rather than failing the whole read.
pub(crate) fn parse_timestamp(raw: Option<&str>) -> DateTime<Utc> {
    let Some(raw) = raw else {
        return DateTime::<Utc>::UNIX_EPOCH;
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Utc);
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Nullable TEXT column, NULL as empty
pub(crate) fn text(row: &SqliteRow, column: &str) -> String {
    row.try_get::<Option<String>, _>(column)
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Nullable INTEGER column, NULL as zero
pub(crate) fn int(row: &SqliteRow, column: &str) -> i64 {
    row.try_get::<Option<i64>, _>(column).ok().flatten().unwrap_or(0)
}

/// Nullable REAL column, NULL as zero
pub(crate) fn real(row: &SqliteRow, column: &str) -> f64 {
    row.try_get::<Option<f64>, _>(column).ok().flatten().unwrap_or(0.0)
}
