use chrono::Utc;
use rusqlite::{named_params, params, Connection};

use crate::config::MomentsConfig;
use crate::error::{AppError, AppResult};
use crate::moments::model::{CommentView, LikeView, Moment, MomentDetails, MomentStatus, MomentSummary};
use crate::moments::{load_moment, moment_from_row, posted_ago, MOMENT_SELECT};

/// Audience rule shared by the feed and single-moment reads. Binds `:viewer`.
const VISIBLE_TO_VIEWER: &str = "(
    m.author_id = :viewer
    OR m.privacy = 'Public'
    OR (m.privacy = 'Friends' AND EXISTS (
        SELECT 1 FROM user_follows f
        WHERE f.follower_id = :viewer AND f.following_id = m.author_id))
    OR (m.privacy = 'Department' AND EXISTS (
        SELECT 1 FROM users a JOIN users v ON v.department = a.department
        WHERE a.id = m.author_id AND v.id = :viewer AND a.department IS NOT NULL))
)";

/// Whether `viewer_id` may see `moment`. Drafts are author-only.
pub fn can_view(conn: &Connection, viewer_id: &str, moment: &Moment) -> AppResult<bool> {
    if moment.author_id == viewer_id {
        return Ok(true);
    }
    if moment.status == MomentStatus::Draft {
        return Ok(false);
    }
    let visible: bool = conn.query_row(
        &format!("SELECT COUNT(*) > 0 FROM moments m WHERE m.id = :id AND {VISIBLE_TO_VIEWER}"),
        named_params! { ":id": moment.id, ":viewer": viewer_id },
        |row| row.get(0),
    )?;
    Ok(visible)
}

/// Load a moment the viewer is allowed to see; hidden moments read as missing.
pub fn load_visible(conn: &Connection, viewer_id: &str, moment_id: &str) -> AppResult<Moment> {
    let moment = load_moment(conn, moment_id)?;
    if !can_view(conn, viewer_id, &moment)? {
        return Err(AppError::NotFound);
    }
    Ok(moment)
}

pub fn get_moment_feed(
    conn: &Connection,
    cfg: &MomentsConfig,
    viewer_id: &str,
    limit: Option<i64>,
    offset: Option<i64>,
) -> AppResult<Vec<MomentSummary>> {
    let limit = cfg.feed_limit(limit);
    let offset = offset.unwrap_or(0).max(0);

    let mut stmt = conn.prepare(&format!(
        "{MOMENT_SELECT}
         WHERE m.status = 'Published' AND {VISIBLE_TO_VIEWER}
         ORDER BY m.posted_date DESC, m.rowid DESC
         LIMIT :limit OFFSET :offset"
    ))?;

    let moments = stmt
        .query_map(
            named_params! { ":viewer": viewer_id, ":limit": limit, ":offset": offset },
            moment_from_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;

    let mut liked_stmt =
        conn.prepare("SELECT COUNT(*) > 0 FROM moment_likes WHERE moment_id = ?1 AND user_id = ?2")?;

    let now = Utc::now();
    let mut feed = Vec::with_capacity(moments.len());
    for m in moments {
        let liked_by_viewer: bool = liked_stmt.query_row(params![m.id, viewer_id], |r| r.get(0))?;
        feed.push(MomentSummary {
            posted_ago: posted_ago(&m.posted_date, now),
            moment_id: m.moment_id,
            author: m.author,
            content: m.content,
            content_html: m.content_html,
            moment_type: m.moment_type,
            privacy: m.privacy,
            posted_date: m.posted_date,
            location: m.location,
            attachments: m.attachments,
            hashtags: m.hashtags,
            mentions: m.mentions,
            preview: m.preview,
            likes_count: m.likes_count,
            comments_count: m.comments_count,
            shares_count: m.shares_count,
            liked_by_viewer,
        });
    }

    Ok(feed)
}

pub fn get_moment_details(
    conn: &Connection,
    viewer_id: &str,
    moment_id: &str,
) -> AppResult<MomentDetails> {
    let moment = load_visible(conn, viewer_id, moment_id)?;

    let mut stmt = conn.prepare(
        "SELECT c.id, u.username, c.comment, c.comment_date
         FROM moment_comments c
         JOIN users u ON u.id = c.user_id
         WHERE c.moment_id = ?1
         ORDER BY c.comment_date ASC, c.rowid ASC",
    )?;
    let comments = stmt
        .query_map(params![moment.id], |row| {
            Ok(CommentView {
                id: row.get(0)?,
                user: row.get(1)?,
                comment: row.get(2)?,
                comment_date: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT u.username, l.like_date
         FROM moment_likes l
         JOIN users u ON u.id = l.user_id
         WHERE l.moment_id = ?1
         ORDER BY l.like_date DESC, l.rowid DESC",
    )?;
    let likes = stmt
        .query_map(params![moment.id], |row| {
            Ok(LikeView {
                user: row.get(0)?,
                like_date: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(MomentDetails {
        moment,
        comments,
        likes,
    })
}
