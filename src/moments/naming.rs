use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

/// Allocate the next `PREFIX-YYYY-MM-NNNNN` id. Call inside the transaction
/// that inserts the row so a rollback also releases the number.
pub fn next_moment_id(
    conn: &Connection,
    prefix: &str,
    now: DateTime<Utc>,
) -> Result<String, rusqlite::Error> {
    let series = format!("{}-{}", prefix, now.format("%Y-%m"));

    let current: i64 = conn.query_row(
        "INSERT INTO naming_series (prefix, current) VALUES (?1, 1)
         ON CONFLICT(prefix) DO UPDATE SET current = current + 1
         RETURNING current",
        params![series],
        |row| row.get(0),
    )?;

    Ok(format!("{}-{:05}", series, current))
}
