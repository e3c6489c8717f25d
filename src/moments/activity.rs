use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::{ActivityEntry, UserActivity};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityType {
    Created,
    Updated,
    Liked,
    Commented,
    Shared,
    Deleted,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Created => "Created",
            ActivityType::Updated => "Updated",
            ActivityType::Liked => "Liked",
            ActivityType::Commented => "Commented",
            ActivityType::Shared => "Shared",
            ActivityType::Deleted => "Deleted",
        }
    }
}

/// Per-user counters kept in `user_activity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    Moments,
    Likes,
    Comments,
    Shares,
}

impl Counter {
    fn column(&self) -> &'static str {
        match self {
            Counter::Moments => "moments_count",
            Counter::Likes => "total_likes",
            Counter::Comments => "total_comments",
            Counter::Shares => "total_shares",
        }
    }
}

/// Log rows reference the public `MOM-…` id so they outlive a deleted moment.
pub fn log_activity(
    conn: &Connection,
    moment_id: &str,
    activity_type: ActivityType,
    user_id: &str,
    now: &str,
    description: &str,
) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO moment_activity (id, moment_id, activity_type, user_id, activity_date, description)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            uuid::Uuid::now_v7().to_string(),
            moment_id,
            activity_type.as_str(),
            user_id,
            now,
            description
        ],
    )?;
    Ok(())
}

pub fn bump_user_activity(
    conn: &Connection,
    user_id: &str,
    counter: Counter,
    delta: i64,
) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT OR IGNORE INTO user_activity (user_id) VALUES (?1)",
        params![user_id],
    )?;
    let column = counter.column();
    conn.execute(
        &format!(
            "UPDATE user_activity SET {column} = MAX(0, {column} + ?1) WHERE user_id = ?2"
        ),
        params![delta, user_id],
    )?;
    Ok(())
}

pub fn get_user_activity(conn: &Connection, user_id: &str) -> Result<UserActivity, rusqlite::Error> {
    let activity = conn
        .query_row(
            "SELECT user_id, moments_count, total_likes, total_comments, total_shares
             FROM user_activity WHERE user_id = ?1",
            params![user_id],
            |row| {
                Ok(UserActivity {
                    user_id: row.get(0)?,
                    moments_count: row.get(1)?,
                    total_likes: row.get(2)?,
                    total_comments: row.get(3)?,
                    total_shares: row.get(4)?,
                })
            },
        )
        .optional()?;

    Ok(activity.unwrap_or_else(|| UserActivity {
        user_id: user_id.to_string(),
        ..Default::default()
    }))
}

pub fn moment_activity(conn: &Connection, moment_id: &str) -> Result<Vec<ActivityEntry>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT id, moment_id, activity_type, user_id, activity_date, description
         FROM moment_activity WHERE moment_id = ?1
         ORDER BY activity_date ASC, rowid ASC",
    )?;

    let entries = stmt
        .query_map(params![moment_id], |row| {
            Ok(ActivityEntry {
                id: row.get(0)?,
                moment_id: row.get(1)?,
                activity_type: row.get(2)?,
                user_id: row.get(3)?,
                activity_date: row.get(4)?,
                description: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(include_str!("../../migrations/001_initial.sql"))
            .unwrap();
        conn.execute_batch(include_str!("../../migrations/002_moments.sql"))
            .unwrap();
        conn.execute("INSERT INTO users (id, username) VALUES ('u1', 'alice')", [])
            .unwrap();
        conn
    }

    #[test]
    fn missing_activity_reads_as_zero() {
        let conn = conn();
        let activity = get_user_activity(&conn, "u1").unwrap();
        assert_eq!(activity.user_id, "u1");
        assert_eq!(activity.moments_count, 0);
    }

    #[test]
    fn bump_creates_row_and_floors_at_zero() {
        let conn = conn();
        bump_user_activity(&conn, "u1", Counter::Moments, 1).unwrap();
        bump_user_activity(&conn, "u1", Counter::Moments, 1).unwrap();
        bump_user_activity(&conn, "u1", Counter::Likes, -1).unwrap();

        let activity = get_user_activity(&conn, "u1").unwrap();
        assert_eq!(activity.moments_count, 2);
        assert_eq!(activity.total_likes, 0);
    }

    #[test]
    fn activity_log_is_chronological() {
        let conn = conn();
        log_activity(&conn, "MOM-1", ActivityType::Created, "u1", "2025-01-01T00:00:00Z", "Created moment: MOM-1").unwrap();
        log_activity(&conn, "MOM-1", ActivityType::Liked, "u1", "2025-01-02T00:00:00Z", "liked").unwrap();
        log_activity(&conn, "MOM-2", ActivityType::Created, "u1", "2025-01-02T00:00:00Z", "other").unwrap();

        let entries = moment_activity(&conn, "MOM-1").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].activity_type, "Created");
        assert_eq!(entries[0].description, "Created moment: MOM-1");
        assert_eq!(entries[1].activity_type, "Liked");
    }
}
