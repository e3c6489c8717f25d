//! Create, edit and delete moments.
//!
//! Creation runs validate → defaults → render/extract → insert → fan-out →
//! analysis in a single transaction, so a failure at any step leaves no
//! partial moment, hashtag bump or notification behind.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::config::MomentsConfig;
use crate::db;
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::moments::activity::{self, ActivityType, Counter};
use crate::moments::analysis::{self, ContentAnalysis};
use crate::moments::model::{
    Location, Moment, MomentStatus, MomentType, MomentUpdate, NewMoment, Preview, Privacy,
};
use crate::moments::{feed, hashtags, load_moment, naming, notifications, text, timestamp};

/// Fields that survive validation and feed the processing steps.
#[derive(Debug, Clone)]
struct Draft {
    content: Option<String>,
    moment_type: MomentType,
    privacy: Privacy,
    status: MomentStatus,
    attachments: Vec<String>,
    location: Option<Location>,
}

/// Everything derived from the draft's content.
struct Processed {
    content_html: Option<String>,
    hashtags: Vec<String>,
    mentions: Vec<String>,
    preview: Preview,
    analysis: ContentAnalysis,
}

pub fn validate_moment_data(
    content: Option<&str>,
    attachments: &[String],
    author_id: &str,
) -> AppResult<()> {
    if content.map_or(true, str::is_empty) && attachments.is_empty() {
        return Err(AppError::BadRequest(
            "Moment must have content or attachments".into(),
        ));
    }
    if author_id.is_empty() {
        return Err(AppError::BadRequest("Author is required".into()));
    }
    Ok(())
}

pub fn validate_content(content: Option<&str>, max_chars: usize) -> AppResult<()> {
    let Some(content) = content else {
        return Ok(());
    };
    if content.chars().count() > max_chars {
        return Err(AppError::BadRequest(format!(
            "Content cannot exceed {} characters",
            max_chars
        )));
    }
    if analysis::contains_inappropriate_content(content) {
        return Err(AppError::BadRequest(
            "Content contains inappropriate material".into(),
        ));
    }
    Ok(())
}

pub fn validate_location(location: Option<&Location>) -> AppResult<()> {
    let Some(location) = location else {
        return Ok(());
    };
    match (location.latitude, location.longitude) {
        (Some(lat), Some(lon))
            if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon) =>
        {
            Ok(())
        }
        _ => Err(AppError::BadRequest("Invalid location data".into())),
    }
}

/// Resolve `@mentions` to user ids, failing on the first unknown name.
/// Returns distinct `(username, id)` pairs in first-seen order.
pub fn validate_mentions(conn: &Connection, mentions: &[String]) -> AppResult<Vec<(String, String)>> {
    let distinct = text::dedup_preserving_order(mentions.iter().cloned(), str::to_string);
    let mut resolved = Vec::with_capacity(distinct.len());
    for username in distinct {
        let id: Option<String> = conn
            .query_row(
                "SELECT id FROM users WHERE username = ?1",
                params![username],
                |row| row.get(0),
            )
            .optional()?;
        match id {
            Some(id) => resolved.push((username, id)),
            None => {
                return Err(AppError::BadRequest(format!(
                    "Mentioned user {} does not exist",
                    username
                )))
            }
        }
    }
    Ok(resolved)
}

fn normalize_content(content: Option<String>) -> Option<String> {
    content.map(|c| c.trim().to_string()).filter(|c| !c.is_empty())
}

fn validate_draft(conn: &Connection, cfg: &MomentsConfig, author_id: &str, draft: &Draft) -> AppResult<Vec<(String, String)>> {
    validate_moment_data(draft.content.as_deref(), &draft.attachments, author_id)?;
    validate_content(draft.content.as_deref(), cfg.max_content_chars)?;
    let mentions = draft
        .content
        .as_deref()
        .map(text::extract_mentions)
        .unwrap_or_default();
    let resolved = validate_mentions(conn, &mentions)?;
    validate_location(draft.location.as_ref())?;
    Ok(resolved)
}

fn process(cfg: &MomentsConfig, draft: &Draft, now: &str) -> Processed {
    let content = draft.content.as_deref().unwrap_or("");
    let hashtags = text::extract_hashtags(content);
    let mentions = text::extract_mentions(content);

    let preview = Preview {
        content_preview: text::truncate_preview(content, cfg.preview_chars),
        attachment_count: draft.attachments.len() as i64,
        hashtag_count: hashtags.len() as i64,
        mention_count: mentions.len() as i64,
        location: draft.location.as_ref().and_then(|l| l.name.clone()),
    };

    Processed {
        content_html: draft.content.as_deref().map(text::render_content),
        hashtags,
        mentions,
        preview,
        analysis: analysis::analyze(content, now.to_string()),
    }
}

/// Recompute and store the engagement score from the current counters.
pub fn refresh_engagement(conn: &Connection, moment_row_id: &str) -> Result<f64, rusqlite::Error> {
    let (likes, comments, shares, views): (i64, i64, i64, i64) = conn.query_row(
        "SELECT likes_count, comments_count, shares_count, views_count FROM moments WHERE id = ?1",
        params![moment_row_id],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
    )?;
    let score = analysis::engagement_score(likes, comments, shares, views);
    conn.execute(
        "UPDATE moments SET engagement_score = ?1 WHERE id = ?2",
        params![score, moment_row_id],
    )?;
    Ok(score)
}

fn record_mentions(
    conn: &Connection,
    moment_row_id: &str,
    mentioned: &[(String, String)],
    now: &str,
) -> Result<(), rusqlite::Error> {
    for (_, user_id) in mentioned {
        conn.execute(
            "INSERT OR IGNORE INTO moment_mentions (id, moment_id, mentioned_user_id, mention_date)
             VALUES (?1, ?2, ?3, ?4)",
            params![uuid::Uuid::now_v7().to_string(), moment_row_id, user_id, now],
        )?;
    }
    Ok(())
}

fn record_hashtags<'a>(
    conn: &Connection,
    tags: impl IntoIterator<Item = &'a String>,
    now: &str,
) -> Result<(), rusqlite::Error> {
    let distinct = text::dedup_preserving_order(tags.into_iter().cloned(), hashtags::registry_key);
    for tag in &distinct {
        hashtags::record_usage(conn, tag, now)?;
    }
    Ok(())
}

pub fn create_moment(
    conn: &mut Connection,
    cfg: &MomentsConfig,
    author: &CurrentUser,
    input: NewMoment,
) -> AppResult<Moment> {
    let draft = Draft {
        content: normalize_content(input.content),
        moment_type: input
            .moment_type
            .as_deref()
            .map(MomentType::parse)
            .transpose()?
            .unwrap_or(MomentType::Text),
        privacy: input
            .privacy
            .as_deref()
            .map(Privacy::parse)
            .transpose()?
            .unwrap_or(Privacy::Public),
        status: input
            .status
            .as_deref()
            .map(MomentStatus::parse)
            .transpose()?
            .unwrap_or(MomentStatus::Published),
        attachments: input
            .attachments
            .into_iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect(),
        location: input.location,
    };

    let tx = db::write_transaction(conn)?;
    let mentioned = validate_draft(&tx, cfg, &author.id, &draft)?;

    let now_dt = Utc::now();
    let now = timestamp(now_dt);
    let moment_id = naming::next_moment_id(&tx, &cfg.id_prefix, now_dt)?;
    let row_id = uuid::Uuid::now_v7().to_string();
    let processed = process(cfg, &draft, &now);

    tx.execute(
        "INSERT INTO moments (
            id, moment_id, author_id, content, content_html, moment_type, privacy, visibility,
            status, posted_date, location_name, latitude, longitude, attachments, hashtags,
            mentions, preview, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?10)",
        params![
            row_id,
            moment_id,
            author.id,
            draft.content,
            processed.content_html,
            draft.moment_type.as_str(),
            draft.privacy.as_str(),
            draft.privacy.visibility().as_str(),
            draft.status.as_str(),
            now,
            draft.location.as_ref().and_then(|l| l.name.clone()),
            draft.location.as_ref().and_then(|l| l.latitude),
            draft.location.as_ref().and_then(|l| l.longitude),
            serde_json::to_string(&draft.attachments)?,
            serde_json::to_string(&processed.hashtags)?,
            serde_json::to_string(&processed.mentions)?,
            serde_json::to_string(&processed.preview)?,
        ],
    )?;

    record_hashtags(&tx, &processed.hashtags, &now)?;
    record_mentions(&tx, &row_id, &mentioned, &now)?;

    let moment = load_moment(&tx, &moment_id)?;

    // Drafts stay quiet until update_moment publishes them
    if draft.status == MomentStatus::Published {
        let mentioned_ids: Vec<String> = mentioned.iter().map(|(_, id)| id.clone()).collect();
        notifications::notify_mentions(&tx, &moment, &mentioned_ids, &now)?;
        notifications::fan_out_new_moment(&tx, &moment, &now)?;
    }

    activity::bump_user_activity(&tx, &author.id, Counter::Moments, 1)?;
    activity::log_activity(
        &tx,
        &moment_id,
        ActivityType::Created,
        &author.id,
        &now,
        &format!("Created moment: {}", moment_id),
    )?;

    store_analysis(&tx, &row_id, &processed.analysis)?;
    refresh_engagement(&tx, &row_id)?;

    let moment = load_moment(&tx, &moment_id)?;
    tx.commit()?;

    tracing::info!(
        moment = %moment.moment_id,
        author = %author.username,
        privacy = moment.privacy.as_str(),
        hashtags = moment.hashtags.len(),
        mentions = moment.mentions.len(),
        "Created moment"
    );
    Ok(moment)
}

fn store_analysis(conn: &Connection, row_id: &str, analysis: &ContentAnalysis) -> Result<(), rusqlite::Error> {
    conn.execute(
        "UPDATE moments SET sentiment = ?1, content_category = ?2, safety_score = ?3, analyzed_at = ?4
         WHERE id = ?5",
        params![
            analysis.sentiment.as_str(),
            analysis.content_type.as_str(),
            analysis.safety_score,
            analysis.analysis_date,
            row_id
        ],
    )?;
    Ok(())
}

/// Load a moment the actor may change. Moments the actor cannot see read as
/// missing; visible ones owned by someone else are Forbidden. Admins bypass both.
fn load_owned(conn: &Connection, actor: &CurrentUser, moment_id: &str) -> AppResult<Moment> {
    if actor.is_admin {
        return load_moment(conn, moment_id);
    }
    let moment = feed::load_visible(conn, &actor.id, moment_id)?;
    if moment.author_id != actor.id {
        return Err(AppError::Forbidden);
    }
    Ok(moment)
}

pub fn update_moment(
    conn: &mut Connection,
    cfg: &MomentsConfig,
    actor: &CurrentUser,
    moment_id: &str,
    update: MomentUpdate,
) -> AppResult<Moment> {
    let tx = db::write_transaction(conn)?;
    let existing = load_owned(&tx, actor, moment_id)?;

    let draft = Draft {
        content: match update.content {
            Some(content) => normalize_content(Some(content)),
            None => existing.content.clone(),
        },
        moment_type: match update.moment_type.as_deref() {
            Some(t) => MomentType::parse(t)?,
            None => existing.moment_type,
        },
        privacy: match update.privacy.as_deref() {
            Some(p) => Privacy::parse(p)?,
            None => existing.privacy,
        },
        status: match update.status.as_deref() {
            Some(s) => MomentStatus::parse(s)?,
            None => existing.status,
        },
        attachments: update.attachments.unwrap_or_else(|| existing.attachments.clone()),
        location: update.location.or_else(|| existing.location.clone()),
    };

    let mentioned = validate_draft(&tx, cfg, &existing.author_id, &draft)?;
    let now = timestamp(Utc::now());
    let processed = process(cfg, &draft, &now);

    tx.execute(
        "UPDATE moments SET content = ?1, content_html = ?2, moment_type = ?3, privacy = ?4,
            visibility = ?5, status = ?6, location_name = ?7, latitude = ?8, longitude = ?9,
            attachments = ?10, hashtags = ?11, mentions = ?12, preview = ?13, updated_at = ?14
         WHERE id = ?15",
        params![
            draft.content,
            processed.content_html,
            draft.moment_type.as_str(),
            draft.privacy.as_str(),
            draft.privacy.visibility().as_str(),
            draft.status.as_str(),
            draft.location.as_ref().and_then(|l| l.name.clone()),
            draft.location.as_ref().and_then(|l| l.latitude),
            draft.location.as_ref().and_then(|l| l.longitude),
            serde_json::to_string(&draft.attachments)?,
            serde_json::to_string(&processed.hashtags)?,
            serde_json::to_string(&processed.mentions)?,
            serde_json::to_string(&processed.preview)?,
            now,
            existing.id,
        ],
    )?;

    // Only tags and mentions that are new to this moment count again
    let old_tags: std::collections::HashSet<String> =
        existing.hashtags.iter().map(|t| hashtags::registry_key(t)).collect();
    let new_tags: Vec<&String> = processed
        .hashtags
        .iter()
        .filter(|t| !old_tags.contains(&hashtags::registry_key(t)))
        .collect();
    record_hashtags(&tx, new_tags, &now)?;

    let new_mentions: Vec<(String, String)> = mentioned
        .iter()
        .filter(|(name, _)| !existing.mentions.contains(name))
        .cloned()
        .collect();
    record_mentions(&tx, &existing.id, &new_mentions, &now)?;

    let moment = load_moment(&tx, moment_id)?;
    let publishing_draft =
        existing.status == MomentStatus::Draft && moment.status == MomentStatus::Published;
    if publishing_draft {
        // Everything a post created as Published would have sent
        let ids: Vec<String> = mentioned.iter().map(|(_, id)| id.clone()).collect();
        notifications::notify_mentions(&tx, &moment, &ids, &now)?;
        notifications::fan_out_new_moment(&tx, &moment, &now)?;
    } else if moment.status == MomentStatus::Published {
        let ids: Vec<String> = new_mentions.into_iter().map(|(_, id)| id).collect();
        notifications::notify_mentions(&tx, &moment, &ids, &now)?;
    }

    store_analysis(&tx, &existing.id, &processed.analysis)?;
    refresh_engagement(&tx, &existing.id)?;
    activity::log_activity(
        &tx,
        moment_id,
        ActivityType::Updated,
        &actor.id,
        &now,
        &format!("Updated moment: {}", moment_id),
    )?;

    let moment = load_moment(&tx, moment_id)?;
    tx.commit()?;

    tracing::info!(moment = %moment_id, actor = %actor.username, "Updated moment");
    Ok(moment)
}

pub fn delete_moment(conn: &mut Connection, actor: &CurrentUser, moment_id: &str) -> AppResult<()> {
    let tx = db::write_transaction(conn)?;
    let moment = load_owned(&tx, actor, moment_id)?;

    tx.execute("DELETE FROM moments WHERE id = ?1", params![moment.id])?;
    activity::bump_user_activity(&tx, &moment.author_id, Counter::Moments, -1)?;
    activity::log_activity(
        &tx,
        moment_id,
        ActivityType::Deleted,
        &actor.id,
        &timestamp(Utc::now()),
        &format!("Deleted moment: {}", moment_id),
    )?;
    tx.commit()?;

    tracing::info!(moment = %moment_id, actor = %actor.username, "Deleted moment");
    Ok(())
}
