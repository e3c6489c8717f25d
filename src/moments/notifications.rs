use rusqlite::{params, Connection};

use crate::error::{AppError, AppResult};
use crate::moments::model::{Moment, Notification, NotificationType, Privacy};
use crate::users;

pub fn notify(
    conn: &Connection,
    user_id: &str,
    moment_row_id: &str,
    notification_type: NotificationType,
    message: &str,
    now: &str,
) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO moment_notifications (id, user_id, moment_id, notification_type, message, is_read, created_date)
         VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)",
        params![
            uuid::Uuid::now_v7().to_string(),
            user_id,
            moment_row_id,
            notification_type.as_str(),
            message,
            now
        ],
    )?;
    Ok(())
}

/// Mention notifications for the given user ids. The author is skipped.
pub fn notify_mentions(
    conn: &Connection,
    moment: &Moment,
    mentioned_user_ids: &[String],
    now: &str,
) -> Result<usize, rusqlite::Error> {
    let message = format!("You were mentioned in a moment by {}", moment.author);
    let mut sent = 0;
    for user_id in mentioned_user_ids.iter().filter(|id| **id != moment.author_id) {
        notify(conn, user_id, &moment.id, NotificationType::Mention, &message, now)?;
        sent += 1;
    }
    Ok(sent)
}

/// Notify followers and, for department moments, department colleagues.
/// Mentions are sent separately via [`notify_mentions`]. Nobody is notified twice.
pub fn fan_out_new_moment(conn: &Connection, moment: &Moment, now: &str) -> AppResult<usize> {
    let followers = if moment.privacy == Privacy::Private {
        Vec::new()
    } else {
        users::followers(conn, &moment.author_id)?
    };

    let message = format!("{} shared a new moment", moment.author);
    for follower in &followers {
        notify(conn, follower, &moment.id, NotificationType::NewMoment, &message, now)?;
    }
    let mut sent = followers.len();

    if moment.privacy == Privacy::Department {
        let mut stmt = conn.prepare(
            "SELECT member.id FROM users author
             JOIN users member ON member.department = author.department
             WHERE author.id = ?1 AND author.department IS NOT NULL AND member.id != author.id",
        )?;
        let members = stmt
            .query_map(params![moment.author_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let message = format!("{} shared a moment in your department", moment.author);
        let members: Vec<&String> = members.iter().filter(|m| !followers.contains(*m)).collect();
        for member in &members {
            notify(
                conn,
                member,
                &moment.id,
                NotificationType::DepartmentMoment,
                &message,
                now,
            )?;
        }
        sent += members.len();
    }

    tracing::debug!(moment = %moment.moment_id, sent, "Fanned out new moment");
    Ok(sent)
}

/// Author notification for an interaction; self-interactions are silent.
pub fn notify_author(
    conn: &Connection,
    moment: &Moment,
    actor_id: &str,
    actor_name: &str,
    notification_type: NotificationType,
    now: &str,
) -> Result<(), rusqlite::Error> {
    if actor_id == moment.author_id {
        return Ok(());
    }
    let message = match notification_type {
        NotificationType::Like => format!("{} liked your moment", actor_name),
        NotificationType::Comment => format!("{} commented on your moment", actor_name),
        NotificationType::Share => format!("{} shared your moment", actor_name),
        _ => format!("{} interacted with your moment", actor_name),
    };
    notify(conn, &moment.author_id, &moment.id, notification_type, &message, now)
}

pub fn list_notifications(
    conn: &Connection,
    user_id: &str,
    unread_only: bool,
    limit: i64,
) -> AppResult<Vec<Notification>> {
    let mut stmt = conn.prepare(
        "SELECT n.id, n.user_id, m.moment_id, n.notification_type, n.message, n.is_read, n.created_date
         FROM moment_notifications n
         LEFT JOIN moments m ON m.id = n.moment_id
         WHERE n.user_id = ?1 AND (?2 = 0 OR n.is_read = 0)
         ORDER BY n.created_date DESC, n.rowid DESC
         LIMIT ?3",
    )?;

    let notifications = stmt
        .query_map(params![user_id, unread_only, limit], |row| {
            let kind: String = row.get(3)?;
            Ok(Notification {
                id: row.get(0)?,
                user_id: row.get(1)?,
                moment_id: row.get(2)?,
                notification_type: NotificationType::parse(&kind)
                    .unwrap_or(NotificationType::NewMoment),
                message: row.get(4)?,
                is_read: row.get(5)?,
                created_date: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(notifications)
}

pub fn mark_read(conn: &Connection, user_id: &str, notification_id: &str) -> AppResult<()> {
    let updated = conn.execute(
        "UPDATE moment_notifications SET is_read = 1 WHERE id = ?1 AND user_id = ?2",
        params![notification_id, user_id],
    )?;
    if updated == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

pub fn mark_all_read(conn: &Connection, user_id: &str) -> AppResult<usize> {
    let updated = conn.execute(
        "UPDATE moment_notifications SET is_read = 1 WHERE user_id = ?1 AND is_read = 0",
        params![user_id],
    )?;
    Ok(updated)
}

pub fn unread_count(conn: &Connection, user_id: &str) -> AppResult<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM moment_notifications WHERE user_id = ?1 AND is_read = 0",
        params![user_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moments::lifecycle::create_moment;
    use crate::moments::model::NewMoment;
    use crate::moments::testing::{actor, setup};

    #[test]
    fn colleague_who_follows_is_notified_once() {
        let (mut conn, cfg) = setup();
        let alice = actor(&conn, "alice", Some("Eng"));
        let dave = actor(&conn, "dave", Some("Eng"));
        users::follow(&conn, &dave.id, "alice").unwrap();

        create_moment(
            &mut conn,
            &cfg,
            &alice,
            NewMoment {
                content: Some("retro at 3".into()),
                privacy: Some("Department".into()),
                ..Default::default()
            },
        )
        .unwrap();

        let notes = list_notifications(&conn, &dave.id, false, 10).unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].notification_type, NotificationType::NewMoment);
    }

    #[test]
    fn mark_read_is_scoped_to_the_owner() {
        let (conn, _) = setup();
        let alice = actor(&conn, "alice", None);
        let bob = actor(&conn, "bob", None);
        conn.execute(
            "INSERT INTO moment_notifications (id, user_id, moment_id, notification_type, message, is_read, created_date)
             VALUES ('n1', ?1, NULL, 'Like', 'hi', 0, '2025-01-01T00:00:00.000000Z')",
            params![alice.id],
        )
        .unwrap();

        assert!(matches!(mark_read(&conn, &bob.id, "n1"), Err(AppError::NotFound)));
        assert_eq!(unread_count(&conn, &alice.id).unwrap(), 1);
        mark_read(&conn, &alice.id, "n1").unwrap();
        assert_eq!(unread_count(&conn, &alice.id).unwrap(), 0);
        assert!(list_notifications(&conn, &alice.id, true, 10).unwrap().is_empty());
    }
}
