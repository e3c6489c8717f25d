//! Content rendering and tag extraction for moment bodies.
//!
//! Raw content is tokenized once into links, hashtags and mentions. Rendering
//! and extraction both walk the same token stream, so a `#` or `@` that sits
//! inside a URL is never treated as a tag.

use askama_escape::Html;
use regex::Regex;
use std::sync::LazyLock;

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?P<url>https?://[^\s<>"']+)|#(?P<tag>\w+)|@(?P<user>\w+)"#)
        .expect("token regex is valid")
});

/// Emoji short codes, applied in this order.
pub const EMOJI_CODES: &[(&str, &str)] = &[
    (":smile:", "😊"),
    (":heart:", "❤️"),
    (":thumbs_up:", "👍"),
    (":thumbs_down:", "👎"),
    (":laugh:", "😂"),
    (":angry:", "😠"),
    (":sad:", "😢"),
    (":love:", "😍"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    Text(&'a str),
    Link(&'a str),
    Hashtag(&'a str),
    Mention(&'a str),
}

pub fn tokenize(content: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut last = 0;

    for caps in TOKEN_RE.captures_iter(content) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last {
            tokens.push(Token::Text(&content[last..whole.start()]));
        }
        if let Some(url) = caps.name("url") {
            tokens.push(Token::Link(url.as_str()));
        } else if let Some(tag) = caps.name("tag") {
            tokens.push(Token::Hashtag(tag.as_str()));
        } else if let Some(user) = caps.name("user") {
            tokens.push(Token::Mention(user.as_str()));
        }
        last = whole.end();
    }

    if last < content.len() {
        tokens.push(Token::Text(&content[last..]));
    }
    tokens
}

pub fn process_emojis(content: &str) -> String {
    EMOJI_CODES
        .iter()
        .fold(content.to_string(), |acc, (code, emoji)| acc.replace(code, emoji))
}

pub fn escape_html(s: &str) -> String {
    askama_escape::escape(s, Html).to_string()
}

pub fn link_anchor(url: &str) -> String {
    let url = escape_html(url);
    format!(r#"<a href="{url}" target="_blank">{url}</a>"#)
}

pub fn hashtag_anchor(tag: &str) -> String {
    format!(r#"<a href="/hashtag/{tag}" class="hashtag">#{tag}</a>"#)
}

pub fn mention_anchor(user: &str) -> String {
    format!(r#"<a href="/user/{user}" class="mention">@{user}</a>"#)
}

/// Render raw content to HTML: emoji codes, then links, hashtags and mentions.
pub fn render_content(content: &str) -> String {
    let with_emojis = process_emojis(content);
    tokenize(&with_emojis)
        .into_iter()
        .map(|token| match token {
            Token::Text(text) => escape_html(text),
            Token::Link(url) => link_anchor(url),
            Token::Hashtag(tag) => hashtag_anchor(tag),
            Token::Mention(user) => mention_anchor(user),
        })
        .collect()
}

/// Every hashtag in order of appearance, duplicates included.
pub fn extract_hashtags(content: &str) -> Vec<String> {
    tokenize(content)
        .into_iter()
        .filter_map(|t| match t {
            Token::Hashtag(tag) => Some(tag.to_string()),
            _ => None,
        })
        .collect()
}

/// Every mentioned username in order of appearance, duplicates included.
pub fn extract_mentions(content: &str) -> Vec<String> {
    tokenize(content)
        .into_iter()
        .filter_map(|t| match t {
            Token::Mention(user) => Some(user.to_string()),
            _ => None,
        })
        .collect()
}

/// Drop repeats while keeping first-seen order.
pub fn dedup_preserving_order<I>(items: I, key: impl Fn(&str) -> String) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(key(item.as_str())))
        .collect()
}

/// First `max_chars` characters, with `...` appended when cut.
pub fn truncate_preview(content: &str, max_chars: usize) -> String {
    if content.chars().count() > max_chars {
        let head: String = content.chars().take(max_chars).collect();
        format!("{}...", head)
    } else {
        content.to_string()
    }
}
