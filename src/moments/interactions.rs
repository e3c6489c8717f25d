//! Likes, comments, shares and views.
//!
//! Each interaction writes its record and bumps the moment counter with a
//! single `c = c + 1` update inside one transaction, then refreshes the
//! engagement score before committing.

use rusqlite::{params, Connection};

use crate::config::MomentsConfig;
use crate::db;
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::moments::activity::{self, ActivityType, Counter};
use crate::moments::feed::load_visible;
use crate::moments::lifecycle::refresh_engagement;
use crate::moments::model::{CounterResponse, NotificationType};
use crate::moments::{notifications, now_timestamp};

fn read_counter(conn: &Connection, row_id: &str, column: &str) -> Result<i64, rusqlite::Error> {
    conn.query_row(
        &format!("SELECT {column} FROM moments WHERE id = ?1"),
        params![row_id],
        |row| row.get(0),
    )
}

pub fn like_moment(conn: &mut Connection, user: &CurrentUser, moment_id: &str) -> AppResult<CounterResponse> {
    let tx = db::write_transaction(conn)?;
    let moment = load_visible(&tx, &user.id, moment_id)?;

    let already: bool = tx.query_row(
        "SELECT COUNT(*) > 0 FROM moment_likes WHERE moment_id = ?1 AND user_id = ?2",
        params![moment.id, user.id],
        |row| row.get(0),
    )?;
    if already {
        return Err(AppError::Conflict("You have already liked this moment".into()));
    }

    let now = now_timestamp();
    tx.execute(
        "INSERT INTO moment_likes (id, moment_id, user_id, like_date) VALUES (?1, ?2, ?3, ?4)",
        params![uuid::Uuid::now_v7().to_string(), moment.id, user.id, now],
    )
    .map_err(|e| {
        if db::is_constraint_violation(&e) {
            AppError::Conflict("You have already liked this moment".into())
        } else {
            AppError::Database(e)
        }
    })?;
    tx.execute(
        "UPDATE moments SET likes_count = likes_count + 1 WHERE id = ?1",
        params![moment.id],
    )?;

    notifications::notify_author(&tx, &moment, &user.id, &user.username, NotificationType::Like, &now)?;
    activity::bump_user_activity(&tx, &moment.author_id, Counter::Likes, 1)?;
    activity::log_activity(
        &tx,
        moment_id,
        ActivityType::Liked,
        &user.id,
        &now,
        &format!("{} liked {}", user.username, moment_id),
    )?;
    refresh_engagement(&tx, &moment.id)?;

    let likes = read_counter(&tx, &moment.id, "likes_count")?;
    tx.commit()?;

    tracing::debug!(moment = %moment_id, user = %user.username, likes, "Liked moment");
    Ok(CounterResponse::likes(likes))
}

/// Remove a like. Unliking something you never liked is not an error.
pub fn unlike_moment(conn: &mut Connection, user: &CurrentUser, moment_id: &str) -> AppResult<CounterResponse> {
    let tx = db::write_transaction(conn)?;
    let moment = load_visible(&tx, &user.id, moment_id)?;

    let removed = tx.execute(
        "DELETE FROM moment_likes WHERE moment_id = ?1 AND user_id = ?2",
        params![moment.id, user.id],
    )?;
    if removed > 0 {
        tx.execute(
            "UPDATE moments SET likes_count = MAX(0, likes_count - 1) WHERE id = ?1",
            params![moment.id],
        )?;
        activity::bump_user_activity(&tx, &moment.author_id, Counter::Likes, -1)?;
        refresh_engagement(&tx, &moment.id)?;
    }

    let likes = read_counter(&tx, &moment.id, "likes_count")?;
    tx.commit()?;
    Ok(CounterResponse::likes(likes))
}

pub fn add_comment(
    conn: &mut Connection,
    cfg: &MomentsConfig,
    user: &CurrentUser,
    moment_id: &str,
    comment: &str,
) -> AppResult<CounterResponse> {
    let comment = comment.trim();
    if comment.is_empty() {
        return Err(AppError::BadRequest("Comment content is required".into()));
    }
    if comment.chars().count() > cfg.max_comment_chars {
        return Err(AppError::BadRequest(format!(
            "Comment cannot exceed {} characters",
            cfg.max_comment_chars
        )));
    }

    let tx = db::write_transaction(conn)?;
    let moment = load_visible(&tx, &user.id, moment_id)?;

    let now = now_timestamp();
    tx.execute(
        "INSERT INTO moment_comments (id, moment_id, user_id, comment, comment_date)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![uuid::Uuid::now_v7().to_string(), moment.id, user.id, comment, now],
    )?;
    tx.execute(
        "UPDATE moments SET comments_count = comments_count + 1 WHERE id = ?1",
        params![moment.id],
    )?;

    notifications::notify_author(&tx, &moment, &user.id, &user.username, NotificationType::Comment, &now)?;
    activity::bump_user_activity(&tx, &moment.author_id, Counter::Comments, 1)?;
    activity::log_activity(
        &tx,
        moment_id,
        ActivityType::Commented,
        &user.id,
        &now,
        &format!("{} commented on {}", user.username, moment_id),
    )?;
    refresh_engagement(&tx, &moment.id)?;

    let comments = read_counter(&tx, &moment.id, "comments_count")?;
    tx.commit()?;
    Ok(CounterResponse::comments(comments))
}

pub fn share_moment(conn: &mut Connection, user: &CurrentUser, moment_id: &str) -> AppResult<CounterResponse> {
    let tx = db::write_transaction(conn)?;
    let moment = load_visible(&tx, &user.id, moment_id)?;

    let now = now_timestamp();
    tx.execute(
        "INSERT INTO moment_shares (id, moment_id, user_id, share_date) VALUES (?1, ?2, ?3, ?4)",
        params![uuid::Uuid::now_v7().to_string(), moment.id, user.id, now],
    )?;
    tx.execute(
        "UPDATE moments SET shares_count = shares_count + 1 WHERE id = ?1",
        params![moment.id],
    )?;

    notifications::notify_author(&tx, &moment, &user.id, &user.username, NotificationType::Share, &now)?;
    activity::bump_user_activity(&tx, &moment.author_id, Counter::Shares, 1)?;
    activity::log_activity(
        &tx,
        moment_id,
        ActivityType::Shared,
        &user.id,
        &now,
        &format!("{} shared {}", user.username, moment_id),
    )?;
    refresh_engagement(&tx, &moment.id)?;

    let shares = read_counter(&tx, &moment.id, "shares_count")?;
    tx.commit()?;
    Ok(CounterResponse::shares(shares))
}

/// Count a view by someone other than the author. Returns the view count.
pub fn record_view(conn: &mut Connection, viewer_id: &str, moment_id: &str) -> AppResult<i64> {
    let tx = db::write_transaction(conn)?;
    let moment = load_visible(&tx, viewer_id, moment_id)?;
    if moment.author_id != viewer_id {
        tx.execute(
            "UPDATE moments SET views_count = views_count + 1 WHERE id = ?1",
            params![moment.id],
        )?;
        refresh_engagement(&tx, &moment.id)?;
    }
    let views = read_counter(&tx, &moment.id, "views_count")?;
    tx.commit()?;
    Ok(views)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moments::lifecycle::create_moment;
    use crate::moments::model::NewMoment;
    use crate::moments::testing::{actor, setup};
    use crate::moments::{activity, load_moment, notifications};
    use crate::users;

    fn new_moment(conn: &mut Connection, cfg: &MomentsConfig, author: &CurrentUser, privacy: &str) -> String {
        create_moment(
            conn,
            cfg,
            author,
            NewMoment {
                content: Some("hello world".into()),
                privacy: Some(privacy.into()),
                ..Default::default()
            },
        )
        .unwrap()
        .moment_id
    }

    #[test]
    fn liking_twice_is_rejected() {
        let (mut conn, cfg) = setup();
        let alice = actor(&conn, "alice", None);
        let bob = actor(&conn, "bob", None);
        let id = new_moment(&mut conn, &cfg, &alice, "Public");

        let first = like_moment(&mut conn, &bob, &id).unwrap();
        assert_eq!(first, CounterResponse::likes(1));

        let err = like_moment(&mut conn, &bob, &id).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(err.to_string(), "You have already liked this moment");
        assert_eq!(load_moment(&conn, &id).unwrap().likes_count, 1);
    }

    #[test]
    fn like_notifies_author_but_not_self() {
        let (mut conn, cfg) = setup();
        let alice = actor(&conn, "alice", None);
        let bob = actor(&conn, "bob", None);
        let id = new_moment(&mut conn, &cfg, &alice, "Public");

        like_moment(&mut conn, &alice, &id).unwrap();
        assert!(notifications::list_notifications(&conn, &alice.id, false, 10)
            .unwrap()
            .is_empty());

        like_moment(&mut conn, &bob, &id).unwrap();
        let notes = notifications::list_notifications(&conn, &alice.id, false, 10).unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].message, "bob liked your moment");
        assert_eq!(notes[0].moment_id.as_deref(), Some(id.as_str()));
        assert_eq!(activity::get_user_activity(&conn, &alice.id).unwrap().total_likes, 2);
    }

    #[test]
    fn unlike_decrements_and_tolerates_repeat() {
        let (mut conn, cfg) = setup();
        let alice = actor(&conn, "alice", None);
        let bob = actor(&conn, "bob", None);
        let id = new_moment(&mut conn, &cfg, &alice, "Public");

        like_moment(&mut conn, &bob, &id).unwrap();
        assert_eq!(unlike_moment(&mut conn, &bob, &id).unwrap(), CounterResponse::likes(0));
        assert_eq!(unlike_moment(&mut conn, &bob, &id).unwrap(), CounterResponse::likes(0));
        // can like again after unliking
        assert_eq!(like_moment(&mut conn, &bob, &id).unwrap(), CounterResponse::likes(1));
    }

    #[test]
    fn comment_increments_by_one() {
        let (mut conn, cfg) = setup();
        let alice = actor(&conn, "alice", None);
        let bob = actor(&conn, "bob", None);
        let id = new_moment(&mut conn, &cfg, &alice, "Public");

        assert_eq!(
            add_comment(&mut conn, &cfg, &bob, &id, "nice").unwrap(),
            CounterResponse::comments(1)
        );
        assert_eq!(
            add_comment(&mut conn, &cfg, &bob, &id, "again").unwrap(),
            CounterResponse::comments(2)
        );
        let notes = notifications::list_notifications(&conn, &alice.id, false, 10).unwrap();
        assert_eq!(notes[0].message, "bob commented on your moment");
    }

    #[test]
    fn empty_comment_is_rejected() {
        let (mut conn, cfg) = setup();
        let alice = actor(&conn, "alice", None);
        let id = new_moment(&mut conn, &cfg, &alice, "Public");
        let err = add_comment(&mut conn, &cfg, &alice, &id, "   ").unwrap_err();
        assert_eq!(err.to_string(), "Comment content is required");
        assert_eq!(load_moment(&conn, &id).unwrap().comments_count, 0);
    }

    #[test]
    fn shares_accumulate_and_feed_engagement() {
        let (mut conn, cfg) = setup();
        let alice = actor(&conn, "alice", None);
        let bob = actor(&conn, "bob", None);
        let id = new_moment(&mut conn, &cfg, &alice, "Public");

        share_moment(&mut conn, &bob, &id).unwrap();
        assert_eq!(share_moment(&mut conn, &bob, &id).unwrap(), CounterResponse::shares(2));
        like_moment(&mut conn, &bob, &id).unwrap();
        add_comment(&mut conn, &cfg, &bob, &id, "hi").unwrap();

        let moment = load_moment(&conn, &id).unwrap();
        // 1 like + 1 comment * 2 + 2 shares * 3
        assert_eq!(moment.engagement_score, 9.0);
    }

    #[test]
    fn views_skip_the_author() {
        let (mut conn, cfg) = setup();
        let alice = actor(&conn, "alice", None);
        let bob = actor(&conn, "bob", None);
        let id = new_moment(&mut conn, &cfg, &alice, "Public");

        assert_eq!(record_view(&mut conn, &alice.id, &id).unwrap(), 0);
        assert_eq!(record_view(&mut conn, &bob.id, &id).unwrap(), 1);
        let moment = load_moment(&conn, &id).unwrap();
        assert!((moment.engagement_score - 0.1).abs() < 1e-9);
    }

    #[test]
    fn hidden_moments_cannot_be_touched() {
        let (mut conn, cfg) = setup();
        let alice = actor(&conn, "alice", None);
        let bob = actor(&conn, "bob", None);
        let id = new_moment(&mut conn, &cfg, &alice, "Private");

        assert!(matches!(like_moment(&mut conn, &bob, &id), Err(AppError::NotFound)));
        assert!(matches!(share_moment(&mut conn, &bob, &id), Err(AppError::NotFound)));
        assert!(matches!(
            like_moment(&mut conn, &bob, "MOM-0000-00-99999"),
            Err(AppError::NotFound)
        ));
    }

    #[test]
    fn friends_moments_need_a_follow() {
        let (mut conn, cfg) = setup();
        let alice = actor(&conn, "alice", None);
        let bob = actor(&conn, "bob", None);
        let id = new_moment(&mut conn, &cfg, &alice, "Friends");

        assert!(matches!(like_moment(&mut conn, &bob, &id), Err(AppError::NotFound)));
        users::follow(&conn, &bob.id, "alice").unwrap();
        assert!(like_moment(&mut conn, &bob, &id).is_ok());
    }
}
