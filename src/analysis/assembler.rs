//! Final record assembly and structural validation.

use std::collections::BTreeMap;

use tracing::{debug, error};

use crate::config::AnalysisSettings;
use crate::content::{ContentKind, ContentStore};
use crate::error::{Error, Result};
use crate::persona::{
    CategoryCount, Confidence, ConfidenceLevel, DemographicField, Demographics, Dimension,
    PersonaRecord, PersonaSummary, ScaleScore, TraitClaim,
};

use super::signals::TemporalProfile;

/// Communities listed in the summary
const TOP_CATEGORIES: usize = 5;

/// Bound outputs waiting to be assembled
#[derive(Debug, Clone, PartialEq)]
pub struct PersonaParts {
    pub subject: Option<String>,
    pub demographics: Demographics,
    pub traits: BTreeMap<Dimension, Vec<TraitClaim>>,
    pub scales: Vec<ScaleScore>,
}

/// Builds and validates `PersonaRecord`s
///
/// Every failure here is an `Error::Integrity`: the earlier stages produced
/// something that breaks the record's guarantees.
#[derive(Debug, Clone, Copy)]
pub struct PersonaAssembler {
    scale_floor: f64,
    scale_ceiling: f64,
}

impl PersonaAssembler {
    pub fn new(settings: &AnalysisSettings) -> Self {
        Self {
            scale_floor: settings.scale_floor,
            scale_ceiling: settings.scale_ceiling,
        }
    }

    pub fn assemble(
        &self,
        store: &ContentStore,
        temporal: &TemporalProfile,
        parts: PersonaParts,
    ) -> Result<PersonaRecord> {
        self.validate(store, &parts).map_err(|e| {
            error!(error = %e, "Persona failed integrity check");
            e
        })?;

        let summary = summarize(store, temporal);
        let confidence = assess(store, &parts);
        debug!(
            level = %confidence.level,
            empty_dimensions = confidence.empty_dimensions.len(),
            insufficient_fields = confidence.insufficient_fields.len(),
            "Persona assembled"
        );

        Ok(PersonaRecord {
            subject: parts.subject,
            demographics: parts.demographics,
            traits: parts.traits,
            scales: parts.scales,
            summary,
            confidence,
        })
    }

    fn validate(&self, store: &ContentStore, parts: &PersonaParts) -> Result<()> {
        let check_ids = |context: &str, ids: &[String]| -> Result<()> {
            if ids.is_empty() {
                return Err(Error::integrity(format!("{} has no evidence", context)));
            }
            if let Some(missing) = ids.iter().find(|id| !store.contains(id)) {
                return Err(Error::integrity(format!(
                    "{} cites unknown item '{}'",
                    context, missing
                )));
            }
            Ok(())
        };

        for dimension in Dimension::trait_dimensions() {
            if !parts.traits.contains_key(dimension) {
                return Err(Error::integrity(format!("dimension '{}' is missing", dimension)));
            }
        }
        for (dimension, claims) in &parts.traits {
            if !Dimension::trait_dimensions().contains(dimension) {
                return Err(Error::integrity(format!(
                    "dimension '{}' does not hold trait claims",
                    dimension
                )));
            }
            for claim in claims {
                if claim.dimension != *dimension {
                    return Err(Error::integrity(format!(
                        "claim '{}' filed under '{}' belongs to '{}'",
                        claim.label, dimension, claim.dimension
                    )));
                }
                check_ids(&format!("claim '{}/{}'", dimension, claim.label), &claim.evidence_ids)?;
            }
        }

        for field in DemographicField::all() {
            let estimate = parts.demographics.get(*field);
            if estimate.is_known() {
                check_ids(&format!("demographic '{}'", field), estimate.evidence_ids())?;
            }
        }

        for scale in &parts.scales {
            let position = scale.position;
            if !(position.is_finite() && position >= self.scale_floor && position <= self.scale_ceiling) {
                return Err(Error::integrity(format!(
                    "scale '{}' position {} is outside [{}, {}]",
                    scale.axis.name, position, self.scale_floor, self.scale_ceiling
                )));
            }
            check_ids(&format!("scale '{}'", scale.axis.name), &scale.evidence_ids)?;
        }

        Ok(())
    }
}

fn summarize(store: &ContentStore, temporal: &TemporalProfile) -> PersonaSummary {
    let range = store.date_range();

    let mut categories: Vec<CategoryCount> = temporal
        .categories
        .iter()
        .map(|(category, count)| CategoryCount {
            category: category.clone(),
            count: *count,
        })
        .collect();
    // Stable sort keeps name order among equal counts
    categories.sort_by(|a, b| b.count.cmp(&a.count));
    categories.truncate(TOP_CATEGORIES);

    PersonaSummary {
        items_analyzed: store.len(),
        posts: store.count_of(ContentKind::Post),
        comments: store.count_of(ContentKind::Comment),
        first_activity: range.map(|(first, _)| first),
        last_activity: range.map(|(_, last)| last),
        hour_histogram: temporal.hour_histogram,
        top_categories: categories,
    }
}

fn assess(store: &ContentStore, parts: &PersonaParts) -> Confidence {
    let empty_dimensions: Vec<Dimension> = parts
        .traits
        .iter()
        .filter(|(_, claims)| claims.is_empty())
        .map(|(dim, _)| *dim)
        .collect();
    let insufficient_fields: Vec<DemographicField> = DemographicField::all()
        .iter()
        .copied()
        .filter(|field| !parts.demographics.get(*field).is_known())
        .collect();

    let slots = Dimension::trait_dimensions().len() + DemographicField::all().len();
    let populated = slots - empty_dimensions.len() - insufficient_fields.len();

    let level = if store.is_empty() || populated * 3 < slots {
        ConfidenceLevel::Low
    } else if populated * 3 < slots * 2 {
        ConfidenceLevel::Moderate
    } else {
        ConfidenceLevel::High
    };

    Confidence {
        level,
        empty_dimensions,
        insufficient_fields,
    }
}
