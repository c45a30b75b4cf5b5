//! Wire shapes produced by the content-fetch collaborator.

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::content::ContentItem;
use crate::error::{Error, Result};

/// Bodies the platform substitutes for removed content
const REMOVED_MARKERS: [&str; 2] = ["[deleted]", "[removed]"];

/// Either supported top-level document
///
/// Variants are tried in order; `Listing` must come first because every
/// field of `ProfileDocument` is optional.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum InputDocument {
    Listing(Listing),
    Profile(ProfileDocument),
}

/// `{username, posts, comments}` as written by the fetcher
#[derive(Debug, Default, Deserialize)]
pub struct ProfileDocument {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub posts: Option<Vec<RawPost>>,
    #[serde(default)]
    pub comments: Option<Vec<RawComment>>,
}

/// Reddit `Listing` envelope
#[derive(Debug, Deserialize)]
pub struct Listing {
    pub kind: String,
    pub data: ListingData,
}

#[derive(Debug, Deserialize)]
pub struct ListingData {
    #[serde(default)]
    pub children: Vec<Thing>,
}

/// A listing child; `t3` is a submission, `t1` a comment
#[derive(Debug, Deserialize)]
pub struct Thing {
    pub kind: String,
    pub data: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPost {
    pub id: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    #[serde(default, alias = "category")]
    pub subreddit: String,
    #[serde(default)]
    pub score: i64,
    pub created_utc: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawComment {
    pub id: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub body: String,
    #[serde(default, alias = "category")]
    pub subreddit: String,
    #[serde(default)]
    pub score: i64,
    pub created_utc: f64,
    /// Fullname of the submission (`t3_<id>`)
    #[serde(default, alias = "parent_id")]
    pub link_id: Option<String>,
}

fn is_removed(text: &str) -> bool {
    REMOVED_MARKERS.contains(&text.trim())
}

/// Seconds since the epoch, possibly fractional
pub fn timestamp_from_epoch(id: &str, created_utc: f64) -> Result<DateTime<Utc>> {
    if !created_utc.is_finite() || created_utc < 0.0 {
        return Err(Error::validation(Some(id), format!("invalid created_utc {}", created_utc)));
    }
    let secs = created_utc.trunc() as i64;
    let nanos = ((created_utc.fract() * 1e9).round() as u32).min(999_999_999);
    Utc.timestamp_opt(secs, nanos)
        .single()
        .ok_or_else(|| Error::validation(Some(id), format!("created_utc {} is out of range", created_utc)))
}

impl RawPost {
    /// Title and body joined by a blank line; `None` for removed posts
    pub fn into_item(self) -> Result<Option<ContentItem>> {
        if is_removed(&self.selftext) {
            return Ok(None);
        }
        let title = self.title.trim();
        let body = self.selftext.trim();
        let text = match (title.is_empty(), body.is_empty()) {
            (true, true) => String::new(),
            (false, true) => title.to_string(),
            (true, false) => body.to_string(),
            (false, false) => format!("{}\n\n{}", title, body),
        };
        let timestamp = timestamp_from_epoch(&self.id, self.created_utc)?;
        Ok(Some(ContentItem::post(self.id, text, self.subreddit, self.score, timestamp)))
    }
}

impl RawComment {
    /// `None` for removed comments
    pub fn into_item(self) -> Result<Option<ContentItem>> {
        if is_removed(&self.body) {
            return Ok(None);
        }
        let timestamp = timestamp_from_epoch(&self.id, self.created_utc)?;
        let parent = self
            .link_id
            .map(|link| link.strip_prefix("t3_").map(str::to_string).unwrap_or(link));
        let item = ContentItem::comment(self.id, self.body, self.subreddit, self.score, timestamp);
        Ok(Some(match parent {
            Some(parent) => item.with_parent(parent),
            None => item,
        }))
    }
}
