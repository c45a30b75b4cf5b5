//! Evidence selection for classified labels.

use tracing::warn;

use crate::content::ContentStore;
use crate::error::{Error, Result};
use crate::persona::{DemographicEstimate, ScaleScore, TraitClaim};

use super::classifier::{ScaleCandidate, TraitCandidate};
use super::signals::Contribution;

/// Picks the cited item ids for each candidate
///
/// Contributions are ranked by strength (descending), then timestamp (most
/// recent first), then storage position. At most `cap` ids are kept and they
/// stay in rank order. A contribution whose id does not resolve in the store
/// is an integrity error.
#[derive(Debug, Clone, Copy)]
pub struct CitationBinder {
    cap: usize,
}

impl CitationBinder {
    pub fn new(cap: usize) -> Self {
        Self { cap: cap.max(1) }
    }

    pub fn select(&self, contributions: &[Contribution], store: &ContentStore) -> Result<Vec<String>> {
        let mut ranked = Vec::with_capacity(contributions.len());
        for contribution in contributions {
            match (store.get(&contribution.item_id), store.position(&contribution.item_id)) {
                (Ok(item), Some(position)) => {
                    ranked.push((contribution.strength, item.timestamp, position, &contribution.item_id))
                }
                _ => {
                    return Err(Error::integrity(format!(
                        "contribution cites unknown item '{}'",
                        contribution.item_id
                    )))
                }
            }
        }

        ranked.sort_by(|a, b| {
            b.0.total_cmp(&a.0)
                .then_with(|| b.1.cmp(&a.1))
                .then_with(|| a.2.cmp(&b.2))
        });

        Ok(ranked
            .into_iter()
            .take(self.cap)
            .map(|(_, _, _, id)| id.clone())
            .collect())
    }

    /// Attach evidence to a trait candidate; `None` when it has none
    pub fn bind(&self, candidate: TraitCandidate, store: &ContentStore) -> Result<Option<TraitClaim>> {
        let evidence_ids = self.select(&candidate.contributions, store)?;
        if evidence_ids.is_empty() {
            warn!(
                dimension = %candidate.dimension,
                label = %candidate.label,
                "Dropping claim without evidence"
            );
            return Ok(None);
        }
        Ok(Some(TraitClaim {
            dimension: candidate.dimension,
            label: candidate.label,
            description: candidate.description,
            evidence_ids,
            support: candidate.support,
            strength: candidate.strength,
        }))
    }

    pub fn bind_demographic(
        &self,
        candidate: Option<TraitCandidate>,
        store: &ContentStore,
    ) -> Result<DemographicEstimate> {
        let claim = match candidate {
            Some(c) => self.bind(c, store)?,
            None => None,
        };
        Ok(match claim {
            Some(claim) => DemographicEstimate::Estimated {
                label: claim.label,
                description: claim.description,
                evidence_ids: claim.evidence_ids,
                support: claim.support,
                strength: claim.strength,
            },
            None => DemographicEstimate::InsufficientData,
        })
    }

    pub fn bind_scale(&self, candidate: ScaleCandidate, store: &ContentStore) -> Result<Option<ScaleScore>> {
        let evidence_ids = self.select(&candidate.contributions, store)?;
        if evidence_ids.is_empty() {
            warn!(axis = %candidate.axis.name, "Dropping scale without evidence");
            return Ok(None);
        }
        Ok(Some(ScaleScore {
            axis: candidate.axis,
            position: candidate.position,
            evidence_ids,
        }))
    }
}
