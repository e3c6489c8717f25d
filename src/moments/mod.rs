//! Social moments: posting, interactions, notifications and the feed.

pub mod activity;
pub mod analysis;
pub mod feed;
pub mod hashtags;
pub mod interactions;
pub mod lifecycle;
pub mod model;
pub mod naming;
pub mod notifications;
pub mod text;

#[cfg(test)]
pub(crate) mod testing;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{AppError, AppResult};
use crate::moments::analysis::{ContentAnalysis, ContentCategory, Sentiment};
use crate::moments::model::{Location, Moment, MomentStatus, MomentType, Privacy, Preview};

/// Stored timestamps sort lexicographically in this format.
pub fn timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn now_timestamp() -> String {
    timestamp(Utc::now())
}

pub(crate) const MOMENT_SELECT: &str = "SELECT m.id, m.moment_id, m.author_id, u.username AS author,
        m.content, m.content_html, m.moment_type, m.privacy, m.visibility, m.status,
        m.posted_date, m.location_name, m.latitude, m.longitude, m.attachments,
        m.hashtags, m.mentions, m.preview, m.likes_count, m.comments_count,
        m.shares_count, m.views_count, m.engagement_score, m.sentiment,
        m.content_category, m.safety_score, m.analyzed_at, m.updated_at
     FROM moments m
     JOIN users u ON u.id = m.author_id";

fn json_list(raw: String) -> Vec<String> {
    serde_json::from_str(&raw).unwrap_or_default()
}

pub(crate) fn moment_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Moment> {
    let privacy = Privacy::parse(&row.get::<_, String>("privacy")?).unwrap_or(Privacy::Public);
    let location_name: Option<String> = row.get("location_name")?;
    let latitude: Option<f64> = row.get("latitude")?;
    let longitude: Option<f64> = row.get("longitude")?;
    let location = if location_name.is_some() || latitude.is_some() || longitude.is_some() {
        Some(Location {
            name: location_name,
            latitude,
            longitude,
        })
    } else {
        None
    };

    let analyzed_at: Option<String> = row.get("analyzed_at")?;
    let ai_analysis = match analyzed_at {
        Some(analysis_date) => Some(ContentAnalysis {
            sentiment: Sentiment::parse(&row.get::<_, Option<String>>("sentiment")?.unwrap_or_default()),
            content_type: ContentCategory::parse(
                &row.get::<_, Option<String>>("content_category")?.unwrap_or_default(),
            ),
            safety_score: row.get::<_, Option<f64>>("safety_score")?.unwrap_or(1.0),
            analysis_date,
        }),
        None => None,
    };

    Ok(Moment {
        id: row.get("id")?,
        moment_id: row.get("moment_id")?,
        author_id: row.get("author_id")?,
        author: row.get("author")?,
        content: row.get("content")?,
        content_html: row.get("content_html")?,
        moment_type: MomentType::parse(&row.get::<_, String>("moment_type")?)
            .unwrap_or(MomentType::Text),
        privacy,
        visibility: privacy.visibility(),
        status: MomentStatus::parse(&row.get::<_, String>("status")?)
            .unwrap_or(MomentStatus::Published),
        posted_date: row.get("posted_date")?,
        location,
        attachments: json_list(row.get("attachments")?),
        hashtags: json_list(row.get("hashtags")?),
        mentions: json_list(row.get("mentions")?),
        preview: serde_json::from_str::<Preview>(&row.get::<_, String>("preview")?)
            .unwrap_or_default(),
        likes_count: row.get("likes_count")?,
        comments_count: row.get("comments_count")?,
        shares_count: row.get("shares_count")?,
        views_count: row.get("views_count")?,
        engagement_score: row.get("engagement_score")?,
        ai_analysis,
        updated_at: row.get("updated_at")?,
    })
}

/// Look a moment up by its public `MOM-…` id.
pub fn find_moment(conn: &Connection, moment_id: &str) -> AppResult<Option<Moment>> {
    let moment = conn
        .query_row(
            &format!("{MOMENT_SELECT} WHERE m.moment_id = ?1"),
            params![moment_id],
            moment_from_row,
        )
        .optional()?;
    Ok(moment)
}

pub fn load_moment(conn: &Connection, moment_id: &str) -> AppResult<Moment> {
    find_moment(conn, moment_id)?.ok_or(AppError::NotFound)
}

/// Age of a post as shown in the feed: "just now", "5m ago", "3h ago",
/// "2d ago", then the calendar date once it is a week old. Clock skew that
/// puts `posted` after `now` reads as "just now".
pub fn age_label(posted: DateTime<Utc>, now: DateTime<Utc>) -> String {
    match (now - posted).num_seconds() {
        s if s < 60 => "just now".to_string(),
        s if s < 3_600 => format!("{}m ago", s / 60),
        s if s < 86_400 => format!("{}h ago", s / 3_600),
        s if s < 7 * 86_400 => format!("{}d ago", s / 86_400),
        _ => posted.format("%b %-d, %Y").to_string(),
    }
}

/// [`age_label`] for a stored timestamp. Unparseable values pass through.
pub fn posted_ago(stored: &str, now: DateTime<Utc>) -> String {
    match DateTime::parse_from_rfc3339(stored) {
        Ok(posted) => age_label(posted.with_timezone(&Utc), now),
        Err(_) => stored.to_string(),
    }
}
