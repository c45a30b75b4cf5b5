//! Core types for the persona record.
//!
//! A `PersonaRecord` is produced once per analysis run and is read-only
//! afterwards. It is the only thing renderers and exporters see.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ─────────────────────────────────────────────────────────────────
// Dimension
// ─────────────────────────────────────────────────────────────────

/// Top-level persona category
///
/// Declaration order is report order, and `Ord` follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Demographics,
    Interests,
    Personality,
    CommunicationStyle,
    Values,
    Behavior,
    Goals,
    Frustrations,
}

impl Dimension {
    /// Dimensions that carry a list of trait claims (everything but demographics)
    pub fn trait_dimensions() -> &'static [Dimension] {
        &[
            Dimension::Interests,
            Dimension::Personality,
            Dimension::CommunicationStyle,
            Dimension::Values,
            Dimension::Behavior,
            Dimension::Goals,
            Dimension::Frustrations,
        ]
    }

    /// Slug used in rule tables and JSON keys
    pub fn slug(&self) -> &'static str {
        match self {
            Dimension::Demographics => "demographics",
            Dimension::Interests => "interests",
            Dimension::Personality => "personality",
            Dimension::CommunicationStyle => "communication_style",
            Dimension::Values => "values",
            Dimension::Behavior => "behavior",
            Dimension::Goals => "goals",
            Dimension::Frustrations => "frustrations",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slug())
    }
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "demographics" => Ok(Dimension::Demographics),
            "interests" => Ok(Dimension::Interests),
            "personality" => Ok(Dimension::Personality),
            "communication_style" | "communication" => Ok(Dimension::CommunicationStyle),
            "values" | "motivations" => Ok(Dimension::Values),
            "behavior" | "behaviour" => Ok(Dimension::Behavior),
            "goals" => Ok(Dimension::Goals),
            "frustrations" => Ok(Dimension::Frustrations),
            _ => Err(format!("Unknown dimension '{}'", s)),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Demographic Field
// ─────────────────────────────────────────────────────────────────

/// A single-answer demographic question
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemographicField {
    Age,
    Occupation,
    Location,
    Relationship,
}

impl DemographicField {
    pub fn all() -> &'static [DemographicField] {
        &[
            DemographicField::Age,
            DemographicField::Occupation,
            DemographicField::Location,
            DemographicField::Relationship,
        ]
    }

    pub fn slug(&self) -> &'static str {
        match self {
            DemographicField::Age => "age",
            DemographicField::Occupation => "occupation",
            DemographicField::Location => "location",
            DemographicField::Relationship => "relationship",
        }
    }
}

impl fmt::Display for DemographicField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slug())
    }
}

// ─────────────────────────────────────────────────────────────────
// Claims
// ─────────────────────────────────────────────────────────────────

/// A persona-visible statement and the contributions that support it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitClaim {
    pub dimension: Dimension,
    pub label: String,
    pub description: String,

    /// Supporting item ids, strongest first. Never empty.
    pub evidence_ids: Vec<String>,

    /// Number of items that contributed to the label (before the citation cap)
    pub support: usize,

    /// Accumulated signal strength
    pub strength: f64,
}

/// Best single guess for a demographic field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DemographicEstimate {
    Estimated {
        label: String,
        description: String,
        evidence_ids: Vec<String>,
        support: usize,
        strength: f64,
    },
    InsufficientData,
}

impl DemographicEstimate {
    /// The estimated label, or `None` for insufficient data
    pub fn label(&self) -> Option<&str> {
        match self {
            DemographicEstimate::Estimated { label, .. } => Some(label),
            DemographicEstimate::InsufficientData => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, DemographicEstimate::Estimated { .. })
    }

    pub fn evidence_ids(&self) -> &[String] {
        match self {
            DemographicEstimate::Estimated { evidence_ids, .. } => evidence_ids,
            DemographicEstimate::InsufficientData => &[],
        }
    }
}

impl fmt::Display for DemographicEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DemographicEstimate::Estimated { label, .. } => write!(f, "{}", label),
            DemographicEstimate::InsufficientData => write!(f, "insufficient data"),
        }
    }
}

/// Demographic estimates, one per field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    pub age: DemographicEstimate,
    pub occupation: DemographicEstimate,
    pub location: DemographicEstimate,
    pub relationship: DemographicEstimate,
}

impl Demographics {
    /// All fields set to insufficient data
    pub fn unknown() -> Self {
        Self {
            age: DemographicEstimate::InsufficientData,
            occupation: DemographicEstimate::InsufficientData,
            location: DemographicEstimate::InsufficientData,
            relationship: DemographicEstimate::InsufficientData,
        }
    }

    pub fn get(&self, field: DemographicField) -> &DemographicEstimate {
        match field {
            DemographicField::Age => &self.age,
            DemographicField::Occupation => &self.occupation,
            DemographicField::Location => &self.location,
            DemographicField::Relationship => &self.relationship,
        }
    }

    pub fn set(&mut self, field: DemographicField, estimate: DemographicEstimate) {
        match field {
            DemographicField::Age => self.age = estimate,
            DemographicField::Occupation => self.occupation = estimate,
            DemographicField::Location => self.location = estimate,
            DemographicField::Relationship => self.relationship = estimate,
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Scale Scores
// ─────────────────────────────────────────────────────────────────

/// A pair of opposing poles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleAxis {
    pub name: String,
    pub left: String,
    pub right: String,
}

/// Position between two poles; 0 is fully left, 1 fully right
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleScore {
    pub axis: ScaleAxis,
    pub position: f64,
    pub evidence_ids: Vec<String>,
}

// ─────────────────────────────────────────────────────────────────
// Summary & Confidence
// ─────────────────────────────────────────────────────────────────

/// Activity count for one community
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

/// Counters describing what was analyzed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaSummary {
    pub items_analyzed: usize,
    pub posts: usize,
    pub comments: usize,
    pub first_activity: Option<DateTime<Utc>>,
    pub last_activity: Option<DateTime<Utc>>,

    /// Items per UTC hour of day
    pub hour_histogram: [u32; 24],

    /// Most active communities, busiest first
    pub top_categories: Vec<CategoryCount>,
}

/// Overall confidence bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    Low,
    Moderate,
    High,
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfidenceLevel::Low => write!(f, "low"),
            ConfidenceLevel::Moderate => write!(f, "moderate"),
            ConfidenceLevel::High => write!(f, "high"),
        }
    }
}

/// Which parts of the persona lack evidence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confidence {
    pub level: ConfidenceLevel,
    pub empty_dimensions: Vec<Dimension>,
    pub insufficient_fields: Vec<DemographicField>,
}

// ─────────────────────────────────────────────────────────────────
// Persona Record
// ─────────────────────────────────────────────────────────────────

/// The finished, evidence-linked persona
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub demographics: Demographics,
    pub traits: BTreeMap<Dimension, Vec<TraitClaim>>,
    pub scales: Vec<ScaleScore>,
    pub summary: PersonaSummary,
    pub confidence: Confidence,
}

impl PersonaRecord {
    /// Claims for one dimension (empty when none qualified)
    pub fn claims(&self, dimension: Dimension) -> &[TraitClaim] {
        self.traits
            .get(&dimension)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every trait claim in report order
    pub fn all_claims(&self) -> impl Iterator<Item = &TraitClaim> {
        self.traits.values().flatten()
    }

    /// Find a claim by dimension and label
    pub fn find_claim(&self, dimension: Dimension, label: &str) -> Option<&TraitClaim> {
        self.claims(dimension).iter().find(|c| c.label == label)
    }

    /// Scale score for a named axis
    pub fn scale(&self, axis_name: &str) -> Option<&ScaleScore> {
        self.scales.iter().find(|s| s.axis.name == axis_name)
    }

    /// Canonical JSON encoding
    pub fn to_canonical_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    /// SHA-256 hex digest of the canonical JSON encoding
    pub fn fingerprint(&self) -> serde_json::Result<String> {
        let bytes = self.to_canonical_json()?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
