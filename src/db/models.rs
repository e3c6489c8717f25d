use async_graphql::SimpleObject;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, SimpleObject)]
pub struct User {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub department: Option<String>,
    pub is_admin: bool,
    pub created_at: String,
}

impl User {
    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(User {
            id: row.get("id")?,
            username: row.get("username")?,
            display_name: row.get("display_name")?,
            department: row.get("department")?,
            is_admin: row.get("is_admin")?,
            created_at: row.get("created_at")?,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, SimpleObject)]
pub struct UserActivity {
    pub user_id: String,
    pub moments_count: i64,
    pub total_likes: i64,
    pub total_comments: i64,
    pub total_shares: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, SimpleObject)]
pub struct Hashtag {
    pub tag: String,
    pub usage_count: i64,
    pub first_used: String,
    pub last_used: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, SimpleObject)]
pub struct ActivityEntry {
    pub id: String,
    pub moment_id: String,
    pub activity_type: String,
    pub user_id: String,
    pub activity_date: String,
    pub description: String,
}
