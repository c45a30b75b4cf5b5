//! Content item definitions

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────
// Content Kind
// ─────────────────────────────────────────────────────────────────

/// Whether an item is a top-level submission or a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Post,
    Comment,
}

impl ContentKind {
    /// All kinds in storage order
    pub fn all() -> &'static [ContentKind] {
        &[ContentKind::Post, ContentKind::Comment]
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKind::Post => write!(f, "post"),
            ContentKind::Comment => write!(f, "comment"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Content Item
// ─────────────────────────────────────────────────────────────────

/// One public contribution by the subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    /// Identifier, unique within a run
    pub id: String,

    /// Post or comment
    pub kind: ContentKind,

    /// Title and body for posts, body for comments
    pub text: String,

    /// Community the item was published in (subreddit or forum)
    #[serde(default)]
    pub category: String,

    /// Score / upvotes
    #[serde(default)]
    pub weight: i64,

    /// Publication time
    pub timestamp: DateTime<Utc>,

    /// Post a comment replies to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl ContentItem {
    /// Create a post
    pub fn post(
        id: impl Into<String>,
        text: impl Into<String>,
        category: impl Into<String>,
        weight: i64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: ContentKind::Post,
            text: text.into(),
            category: category.into(),
            weight,
            timestamp,
            parent_id: None,
        }
    }

    /// Create a comment
    pub fn comment(
        id: impl Into<String>,
        text: impl Into<String>,
        category: impl Into<String>,
        weight: i64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: ContentKind::Comment,
            text: text.into(),
            category: category.into(),
            weight,
            timestamp,
            parent_id: None,
        }
    }

    /// Attach the id of the post this item replies to
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Evidence multiplier derived from the item's score
    ///
    /// Scores below 1 count as 1 so every matching item carries weight.
    pub fn weight_factor(&self) -> f64 {
        (self.weight.max(1) as f64).ln_1p()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_weight_factor_floor() {
        let low = ContentItem::post("a", "x", "c", -7, ts());
        let zero = ContentItem::post("b", "x", "c", 0, ts());
        let one = ContentItem::post("c", "x", "c", 1, ts());
        assert_eq!(low.weight_factor(), one.weight_factor());
        assert_eq!(zero.weight_factor(), one.weight_factor());
        assert!(one.weight_factor() > 0.0);
    }

    #[test]
    fn test_weight_factor_grows_with_score() {
        let small = ContentItem::post("a", "x", "c", 3, ts());
        let big = ContentItem::post("b", "x", "c", 300, ts());
        assert!(big.weight_factor() > small.weight_factor());
    }

    #[test]
    fn test_serde_camel_case() {
        let item = ContentItem::comment("c1", "hello", "rust", 4, ts()).with_parent("p1");
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"parentId\":\"p1\""));
        assert!(json.contains("\"kind\":\"comment\""));
    }
}
