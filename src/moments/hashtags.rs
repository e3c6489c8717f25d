use rusqlite::{params, Connection};

use crate::db::models::Hashtag;

/// Registry key for a tag; `#Rust` and `#rust` share a row.
pub fn registry_key(tag: &str) -> String {
    tag.to_lowercase()
}

pub fn record_usage(conn: &Connection, tag: &str, now: &str) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO hashtags (tag, usage_count, first_used, last_used) VALUES (?1, 1, ?2, ?2)
         ON CONFLICT(tag) DO UPDATE SET usage_count = usage_count + 1, last_used = excluded.last_used",
        params![registry_key(tag), now],
    )?;
    Ok(())
}

pub fn trending(conn: &Connection, limit: i64) -> Result<Vec<Hashtag>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT tag, usage_count, first_used, last_used FROM hashtags
         ORDER BY usage_count DESC, last_used DESC
         LIMIT ?1",
    )?;

    let tags = stmt
        .query_map(params![limit], |row| {
            Ok(Hashtag {
                tag: row.get(0)?,
                usage_count: row.get(1)?,
                first_used: row.get(2)?,
                last_used: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(tags)
}
