use async_graphql::{Enum, SimpleObject};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::moments::analysis::ContentAnalysis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Enum)]
pub enum MomentType {
    Text,
    Photo,
    Video,
    Link,
    Event,
    Poll,
}

impl MomentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MomentType::Text => "Text",
            MomentType::Photo => "Photo",
            MomentType::Video => "Video",
            MomentType::Link => "Link",
            MomentType::Event => "Event",
            MomentType::Poll => "Poll",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "Text" => Ok(MomentType::Text),
            "Photo" => Ok(MomentType::Photo),
            "Video" => Ok(MomentType::Video),
            "Link" => Ok(MomentType::Link),
            "Event" => Ok(MomentType::Event),
            "Poll" => Ok(MomentType::Poll),
            other => Err(AppError::BadRequest(format!(
                "Invalid moment type: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Enum)]
pub enum Privacy {
    Public,
    Friends,
    Department,
    Private,
}

impl Privacy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Privacy::Public => "Public",
            Privacy::Friends => "Friends",
            Privacy::Department => "Department",
            Privacy::Private => "Private",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "Public" => Ok(Privacy::Public),
            "Friends" => Ok(Privacy::Friends),
            "Department" => Ok(Privacy::Department),
            "Private" => Ok(Privacy::Private),
            other => Err(AppError::BadRequest(format!("Invalid privacy: {}", other))),
        }
    }

    pub fn visibility(&self) -> Visibility {
        match self {
            Privacy::Private => Visibility::AuthorOnly,
            Privacy::Friends => Visibility::FriendsOnly,
            Privacy::Department => Visibility::DepartmentOnly,
            Privacy::Public => Visibility::Public,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Enum)]
pub enum Visibility {
    Public,
    #[serde(rename = "Friends Only")]
    FriendsOnly,
    #[serde(rename = "Department Only")]
    DepartmentOnly,
    #[serde(rename = "Author Only")]
    AuthorOnly,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "Public",
            Visibility::FriendsOnly => "Friends Only",
            Visibility::DepartmentOnly => "Department Only",
            Visibility::AuthorOnly => "Author Only",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Enum)]
pub enum MomentStatus {
    Draft,
    Published,
    Archived,
}

impl MomentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MomentStatus::Draft => "Draft",
            MomentStatus::Published => "Published",
            MomentStatus::Archived => "Archived",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "Draft" => Ok(MomentStatus::Draft),
            "Published" => Ok(MomentStatus::Published),
            "Archived" => Ok(MomentStatus::Archived),
            other => Err(AppError::BadRequest(format!("Invalid status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Enum)]
pub enum NotificationType {
    Mention,
    #[serde(rename = "New Moment")]
    NewMoment,
    #[serde(rename = "Department Moment")]
    DepartmentMoment,
    Like,
    Comment,
    Share,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Mention => "Mention",
            NotificationType::NewMoment => "New Moment",
            NotificationType::DepartmentMoment => "Department Moment",
            NotificationType::Like => "Like",
            NotificationType::Comment => "Comment",
            NotificationType::Share => "Share",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Mention" => Some(NotificationType::Mention),
            "New Moment" => Some(NotificationType::NewMoment),
            "Department Moment" => Some(NotificationType::DepartmentMoment),
            "Like" => Some(NotificationType::Like),
            "Comment" => Some(NotificationType::Comment),
            "Share" => Some(NotificationType::Share),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SimpleObject)]
pub struct Location {
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, SimpleObject)]
pub struct Preview {
    pub content_preview: String,
    pub attachment_count: i64,
    pub hashtag_count: i64,
    pub mention_count: i64,
    pub location: Option<String>,
}

/// Create request. Enum-like fields stay strings so bad values become 400s.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewMoment {
    pub content: Option<String>,
    pub moment_type: Option<String>,
    pub privacy: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub attachments: Vec<String>,
    pub location: Option<Location>,
}

/// Partial edit; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MomentUpdate {
    pub content: Option<String>,
    pub moment_type: Option<String>,
    pub privacy: Option<String>,
    pub status: Option<String>,
    pub attachments: Option<Vec<String>>,
    pub location: Option<Location>,
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct Moment {
    /// Internal row id
    #[graphql(skip)]
    pub id: String,
    pub moment_id: String,
    pub author_id: String,
    pub author: String,
    pub content: Option<String>,
    pub content_html: Option<String>,
    pub moment_type: MomentType,
    pub privacy: Privacy,
    pub visibility: Visibility,
    pub status: MomentStatus,
    pub posted_date: String,
    pub location: Option<Location>,
    pub attachments: Vec<String>,
    pub hashtags: Vec<String>,
    pub mentions: Vec<String>,
    pub preview: Preview,
    pub likes_count: i64,
    pub comments_count: i64,
    pub shares_count: i64,
    pub views_count: i64,
    pub engagement_score: f64,
    pub ai_analysis: Option<ContentAnalysis>,
    pub updated_at: String,
}

/// Feed row
#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct MomentSummary {
    pub moment_id: String,
    pub author: String,
    pub content: Option<String>,
    pub content_html: Option<String>,
    pub moment_type: MomentType,
    pub privacy: Privacy,
    pub posted_date: String,
    pub posted_ago: String,
    pub location: Option<Location>,
    pub attachments: Vec<String>,
    pub hashtags: Vec<String>,
    pub mentions: Vec<String>,
    pub preview: Preview,
    pub likes_count: i64,
    pub comments_count: i64,
    pub shares_count: i64,
    pub liked_by_viewer: bool,
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct CommentView {
    pub id: String,
    pub user: String,
    pub comment: String,
    pub comment_date: String,
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct LikeView {
    pub user: String,
    pub like_date: String,
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct MomentDetails {
    pub moment: Moment,
    pub comments: Vec<CommentView>,
    pub likes: Vec<LikeView>,
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub moment_id: Option<String>,
    pub notification_type: NotificationType,
    pub message: String,
    pub is_read: bool,
    pub created_date: String,
}

/// `{"status": "success", "<counter>": n}` as returned by interactions.
#[derive(Debug, Clone, PartialEq, Serialize, SimpleObject)]
pub struct CounterResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub likes_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shares_count: Option<i64>,
}

impl CounterResponse {
    fn success() -> Self {
        Self {
            status: "success".to_string(),
            likes_count: None,
            comments_count: None,
            shares_count: None,
        }
    }

    pub fn likes(count: i64) -> Self {
        Self {
            likes_count: Some(count),
            ..Self::success()
        }
    }

    pub fn comments(count: i64) -> Self {
        Self {
            comments_count: Some(count),
            ..Self::success()
        }
    }

    pub fn shares(count: i64) -> Self {
        Self {
            shares_count: Some(count),
            ..Self::success()
        }
    }
}
