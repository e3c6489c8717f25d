//! Keyword-based content scoring.
//!
//! All checks are case-insensitive substring matches, so "unhappy" still
//! counts as "happy". That is the accepted trade-off of a word list.

use async_graphql::{Enum, SimpleObject};
use serde::{Deserialize, Serialize};

const POSITIVE_WORDS: &[&str] = &[
    "happy", "great", "awesome", "amazing", "love", "excellent", "wonderful",
];
const NEGATIVE_WORDS: &[&str] = &[
    "sad", "bad", "terrible", "awful", "hate", "disappointed", "angry",
];
const UNSAFE_WORDS: &[&str] = &["spam", "scam", "fraud", "illegal"];
const BLOCKED_WORDS: &[&str] = &["spam", "scam", "fraud", "illegal", "inappropriate"];

const CATEGORY_RULES: &[(ContentCategory, &[&str])] = &[
    (
        ContentCategory::WorkRelated,
        &["work", "project", "meeting", "office"],
    ),
    (
        ContentCategory::Celebration,
        &["celebration", "party", "birthday", "anniversary"],
    ),
    (ContentCategory::Support, &["help", "support", "assistance"]),
    (ContentCategory::Idea, &["idea", "suggestion", "feedback"]),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Enum)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "positive" => Sentiment::Positive,
            "negative" => Sentiment::Negative,
            _ => Sentiment::Neutral,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Enum)]
#[serde(rename_all = "snake_case")]
pub enum ContentCategory {
    Text,
    WorkRelated,
    Celebration,
    Support,
    Idea,
    General,
}

impl ContentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentCategory::Text => "text",
            ContentCategory::WorkRelated => "work_related",
            ContentCategory::Celebration => "celebration",
            ContentCategory::Support => "support",
            ContentCategory::Idea => "idea",
            ContentCategory::General => "general",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "text" => ContentCategory::Text,
            "work_related" => ContentCategory::WorkRelated,
            "celebration" => ContentCategory::Celebration,
            "support" => ContentCategory::Support,
            "idea" => ContentCategory::Idea,
            _ => ContentCategory::General,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SimpleObject)]
pub struct ContentAnalysis {
    pub sentiment: Sentiment,
    pub content_type: ContentCategory,
    pub safety_score: f64,
    pub analysis_date: String,
}

fn count_hits(content_lower: &str, words: &[&str]) -> usize {
    words.iter().filter(|w| content_lower.contains(*w)).count()
}

pub fn analyze_sentiment(content: &str) -> Sentiment {
    if content.is_empty() {
        return Sentiment::Neutral;
    }
    let lower = content.to_lowercase();
    let positive = count_hits(&lower, POSITIVE_WORDS);
    let negative = count_hits(&lower, NEGATIVE_WORDS);

    match positive.cmp(&negative) {
        std::cmp::Ordering::Greater => Sentiment::Positive,
        std::cmp::Ordering::Less => Sentiment::Negative,
        std::cmp::Ordering::Equal => Sentiment::Neutral,
    }
}

pub fn classify_content(content: &str) -> ContentCategory {
    if content.is_empty() {
        return ContentCategory::Text;
    }
    let lower = content.to_lowercase();
    CATEGORY_RULES
        .iter()
        .find(|(_, words)| count_hits(&lower, words) > 0)
        .map(|(category, _)| *category)
        .unwrap_or(ContentCategory::General)
}

/// 1.0 for clean content, 0.0 as soon as any unsafe keyword appears.
pub fn analyze_safety(content: &str) -> f64 {
    if content.is_empty() {
        return 1.0;
    }
    if count_hits(&content.to_lowercase(), UNSAFE_WORDS) > 0 {
        0.0
    } else {
        1.0
    }
}

pub fn contains_inappropriate_content(content: &str) -> bool {
    !content.is_empty() && count_hits(&content.to_lowercase(), BLOCKED_WORDS) > 0
}

pub fn engagement_score(likes: i64, comments: i64, shares: i64, views: i64) -> f64 {
    likes as f64 + comments as f64 * 2.0 + shares as f64 * 3.0 + views as f64 * 0.1
}

pub fn analyze(content: &str, analysis_date: String) -> ContentAnalysis {
    ContentAnalysis {
        sentiment: analyze_sentiment(content),
        content_type: classify_content(content),
        safety_score: analyze_safety(content),
        analysis_date,
    }
}
