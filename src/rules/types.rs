//! Rule table definitions, deserialized from TOML.
//!
//! A rule table maps (dimension, label) pairs to the keywords, category
//! hints and text markers that count as evidence for them. It also holds the
//! opposing-pole axes and the behavior patterns.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::content::ContentKind;
use crate::error::{Error, Result};
use crate::persona::{DemographicField, Dimension};

// ─────────────────────────────────────────────────────────────────
// Rule Table
// ─────────────────────────────────────────────────────────────────

/// Complete declarative rule configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleTable {
    /// Version of this table (e.g. "1.0.0")
    #[serde(default = "default_version")]
    pub version: String,

    /// Keyword / category / marker rules per label
    #[serde(default)]
    pub labels: Vec<LabelRule>,

    /// Opposing-pole axes for scale scores
    #[serde(default)]
    pub axes: Vec<AxisRule>,

    /// Activity patterns for the behavior dimension
    #[serde(default)]
    pub behavior: BehaviorRules,
}

/// Evidence rule for one label
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelRule {
    pub dimension: Dimension,

    /// Required for demographics, forbidden elsewhere
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<DemographicField>,

    pub label: String,

    /// Description template; supports `{label}` and `{support}`
    pub description: String,

    #[serde(default)]
    pub keywords: Vec<String>,

    /// Category names that indicate this label on their own
    #[serde(default)]
    pub category_hints: Vec<String>,

    #[serde(default)]
    pub markers: Vec<TextMarker>,

    #[serde(default = "default_multiplier")]
    pub weight_multiplier: f64,
}

/// Structural features checked on an item's raw text
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextMarker {
    /// Contains a question mark
    Question,
    /// Contains an exclamation mark
    Exclamation,
    /// At least `LONG_FORM_WORDS` words
    LongForm,
}

impl TextMarker {
    pub const LONG_FORM_WORDS: usize = 120;
}

/// Two opposing poles scored against each other
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AxisRule {
    pub name: String,
    pub left: PoleRule,
    pub right: PoleRule,
}

/// One end of an axis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoleRule {
    pub label: String,
    pub keywords: Vec<String>,
    #[serde(default = "default_multiplier")]
    pub weight_multiplier: f64,
}

// ─────────────────────────────────────────────────────────────────
// Behavior Rules
// ─────────────────────────────────────────────────────────────────

/// Activity patterns derived from categories, timestamps and volume
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BehaviorRules {
    /// Per-community participation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub community: Option<CommunityPattern>,

    /// Time-of-day windows (UTC)
    #[serde(default)]
    pub windows: Vec<ActivityWindow>,

    /// Posting / commenting volume
    #[serde(default)]
    pub cadence: Vec<CadenceRule>,
}

/// Label template for "active in community X" claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityPattern {
    /// Must contain `{category}`
    pub label: String,
    pub description: String,
    #[serde(default = "default_multiplier")]
    pub weight_multiplier: f64,
}

impl CommunityPattern {
    pub fn label_for(&self, category: &str) -> String {
        self.label.replace("{category}", category)
    }

    /// Whether `label_for` yields `label` for some category
    pub fn could_render(&self, label: &str) -> bool {
        let (Some(first), Some(last)) = (self.label.find("{category}"), self.label.rfind("{category}")) else {
            return self.label == label;
        };
        let prefix = &self.label[..first];
        let suffix = &self.label[last + "{category}".len()..];
        label.len() >= prefix.len() + suffix.len() && label.starts_with(prefix) && label.ends_with(suffix)
    }
}

/// Hours of the day, inclusive on both ends; wraps past midnight when
/// `start_hour > end_hour`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityWindow {
    pub label: String,
    pub start_hour: u32,
    pub end_hour: u32,

    /// Minimum share of all items that must fall in the window
    #[serde(default = "default_min_share")]
    pub min_share: f64,

    pub description: String,
}

impl ActivityWindow {
    pub fn contains(&self, hour: u32) -> bool {
        if self.start_hour <= self.end_hour {
            (self.start_hour..=self.end_hour).contains(&hour)
        } else {
            hour >= self.start_hour || hour <= self.end_hour
        }
    }
}

/// Volume band for one content kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CadenceRule {
    pub label: String,
    pub kind: ContentKind,
    pub min_items: usize,

    /// Upper bound of the band (inclusive); open-ended when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,

    pub description: String,
}

impl CadenceRule {
    pub fn matches(&self, count: usize) -> bool {
        count >= self.min_items && self.max_items.map_or(true, |max| count <= max)
    }
}

fn default_version() -> String {
    "1.0.0".to_string()
}

fn default_multiplier() -> f64 {
    1.0
}

fn default_min_share() -> f64 {
    0.5
}

// ─────────────────────────────────────────────────────────────────
// Templates
// ─────────────────────────────────────────────────────────────────

/// Fill a description template
///
/// Recognized placeholders: `{label}`, `{support}` and `{category}`.
pub fn render_template(template: &str, label: &str, support: usize, category: Option<&str>) -> String {
    let mut text = template
        .replace("{label}", label)
        .replace("{support}", &support.to_string());
    if let Some(category) = category {
        text = text.replace("{category}", category);
    }
    text
}

// ─────────────────────────────────────────────────────────────────
// Loading & Validation
// ─────────────────────────────────────────────────────────────────

impl RuleTable {
    /// Parse and validate a TOML rule table
    pub fn from_toml_str(content: &str, origin: &str) -> Result<Self> {
        let table: RuleTable = toml::from_str(content).map_err(|e| Error::RulesParse {
            origin: origin.to_string(),
            message: e.to_string(),
        })?;
        table.validate()?;
        Ok(table)
    }

    /// Rules for one dimension in table order
    pub fn labels_for(&self, dimension: Dimension) -> impl Iterator<Item = &LabelRule> {
        self.labels.iter().filter(move |r| r.dimension == dimension)
    }

    /// Check the table for entries that would make analysis ambiguous
    pub fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();

        for rule in &self.labels {
            let context = format!("{}/{}", rule.dimension, rule.label);

            if rule.label.trim().is_empty() {
                return Err(Error::rules_invalid(format!(
                    "empty label in dimension '{}'",
                    rule.dimension
                )));
            }
            match (rule.dimension, rule.field) {
                (Dimension::Demographics, None) => {
                    return Err(Error::rules_invalid(format!(
                        "{}: demographic rules need a field",
                        context
                    )));
                }
                (d, Some(_)) if d != Dimension::Demographics => {
                    return Err(Error::rules_invalid(format!(
                        "{}: only demographic rules take a field",
                        context
                    )));
                }
                _ => {}
            }
            if !(rule.weight_multiplier.is_finite() && rule.weight_multiplier > 0.0) {
                return Err(Error::rules_invalid(format!(
                    "{}: weight_multiplier must be a positive number",
                    context
                )));
            }
            let has_keyword = rule.keywords.iter().any(|k| !k.trim().is_empty());
            let has_hint = rule.category_hints.iter().any(|h| !h.trim().is_empty());
            if !has_keyword && !has_hint && rule.markers.is_empty() {
                return Err(Error::rules_invalid(format!(
                    "{}: needs at least one keyword, category hint or marker",
                    context
                )));
            }
            if !seen.insert((rule.dimension, rule.field, rule.label.clone())) {
                return Err(Error::rules_invalid(format!("{}: duplicate label", context)));
            }
        }

        let mut axis_names = BTreeSet::new();
        for axis in &self.axes {
            if axis.name.trim().is_empty() {
                return Err(Error::rules_invalid("axis with empty name"));
            }
            if !axis_names.insert(axis.name.clone()) {
                return Err(Error::rules_invalid(format!("duplicate axis '{}'", axis.name)));
            }
            if axis.left.label == axis.right.label {
                return Err(Error::rules_invalid(format!(
                    "axis '{}': poles must have different labels",
                    axis.name
                )));
            }
            for pole in [&axis.left, &axis.right] {
                if pole.label.trim().is_empty() || pole.keywords.iter().all(|k| k.trim().is_empty()) {
                    return Err(Error::rules_invalid(format!(
                        "axis '{}': each pole needs a label and keywords",
                        axis.name
                    )));
                }
                if !(pole.weight_multiplier.is_finite() && pole.weight_multiplier > 0.0) {
                    return Err(Error::rules_invalid(format!(
                        "axis '{}': weight_multiplier must be a positive number",
                        axis.name
                    )));
                }
            }
        }

        self.validate_behavior(&seen)
    }

    fn validate_behavior(
        &self,
        seen: &BTreeSet<(Dimension, Option<DemographicField>, String)>,
    ) -> Result<()> {
        let behavior = &self.behavior;

        if let Some(ref community) = behavior.community {
            if !community.label.contains("{category}") {
                return Err(Error::rules_invalid(
                    "behavior.community.label must contain {category}",
                ));
            }
            if !(community.weight_multiplier.is_finite() && community.weight_multiplier > 0.0) {
                return Err(Error::rules_invalid(
                    "behavior.community.weight_multiplier must be a positive number",
                ));
            }
        }

        let mut pattern_labels = BTreeSet::new();
        let window_labels = behavior.windows.iter().map(|w| &w.label);
        let cadence_labels = behavior.cadence.iter().map(|c| &c.label);
        for label in window_labels.chain(cadence_labels) {
            let taken = seen.contains(&(Dimension::Behavior, None, label.clone()));
            if label.trim().is_empty() || taken || !pattern_labels.insert(label.clone()) {
                return Err(Error::rules_invalid(format!(
                    "behavior pattern label '{}' is empty or already used",
                    label
                )));
            }
        }

        // A community label rendered for some category must not collide with
        // any other behavior label
        if let Some(ref community) = behavior.community {
            let rule_labels = seen
                .iter()
                .filter(|(dimension, _, _)| *dimension == Dimension::Behavior)
                .map(|(_, _, label)| label);
            if let Some(clash) = rule_labels
                .chain(pattern_labels.iter())
                .find(|label| community.could_render(label))
            {
                return Err(Error::rules_invalid(format!(
                    "behavior label '{}' collides with community label '{}'",
                    clash, community.label
                )));
            }
        }

        for window in &behavior.windows {
            if window.start_hour > 23 || window.end_hour > 23 {
                return Err(Error::rules_invalid(format!(
                    "window '{}': hours must be between 0 and 23",
                    window.label
                )));
            }
            if !(window.min_share > 0.0 && window.min_share <= 1.0) {
                return Err(Error::rules_invalid(format!(
                    "window '{}': min_share must be in (0, 1]",
                    window.label
                )));
            }
        }

        for cadence in &behavior.cadence {
            if cadence.min_items == 0 {
                return Err(Error::rules_invalid(format!(
                    "cadence '{}': min_items must be at least 1",
                    cadence.label
                )));
            }
            if cadence.max_items.is_some_and(|max| max < cadence.min_items) {
                return Err(Error::rules_invalid(format!(
                    "cadence '{}': max_items is below min_items",
                    cadence.label
                )));
            }
        }

        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
