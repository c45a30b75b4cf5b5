//! Trait classification: ranking, thresholds and scale positions.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::config::AnalysisSettings;
use crate::persona::{DemographicField, Dimension, ScaleAxis};
use crate::rules::{render_template, RuleTable};

use super::signals::{Contribution, Pole, SignalAggregate, SignalKey, SignalSource, SignalTable};

/// A label that passed selection, before evidence is bound
#[derive(Debug, Clone, PartialEq)]
pub struct TraitCandidate {
    pub dimension: Dimension,
    pub field: Option<DemographicField>,
    pub label: String,
    pub description: String,
    pub support: usize,
    pub strength: f64,
    pub contributions: Vec<Contribution>,
}

/// A scored axis, before evidence is bound
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleCandidate {
    pub axis: ScaleAxis,
    pub position: f64,
    /// Contributions from both poles, merged per item
    pub contributions: Vec<Contribution>,
}

/// Full classifier output for one signal table
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub demographics: BTreeMap<DemographicField, Option<TraitCandidate>>,
    pub traits: BTreeMap<Dimension, Vec<TraitCandidate>>,
    pub scales: Vec<ScaleCandidate>,
}

/// Strength descending, then label ascending
pub fn rank_order(a: (&SignalKey, &SignalAggregate), b: (&SignalKey, &SignalAggregate)) -> Ordering {
    b.1.strength()
        .total_cmp(&a.1.strength())
        .then_with(|| a.0.label.cmp(&b.0.label))
}

/// Maps signal aggregates to claims
///
/// Cheap to clone; the pipeline hands one copy to each dimension task.
#[derive(Debug, Clone)]
pub struct TraitClassifier {
    rules: Arc<RuleTable>,
    settings: AnalysisSettings,
}

impl TraitClassifier {
    pub fn new(rules: Arc<RuleTable>, settings: AnalysisSettings) -> Self {
        Self { rules, settings }
    }

    /// Candidates in rank order
    pub fn rank<'t>(
        &self,
        entries: impl Iterator<Item = (&'t SignalKey, &'t SignalAggregate)>,
    ) -> Vec<(&'t SignalKey, &'t SignalAggregate)> {
        let mut ranked: Vec<_> = entries.collect();
        ranked.sort_by(|a, b| rank_order(*a, *b));
        ranked
    }

    /// Best guess for one demographic field
    ///
    /// The strongest label that meets `min_evidence`. Weaker-supported labels
    /// never hide a qualifying one.
    pub fn classify_field(&self, table: &SignalTable, field: DemographicField) -> Option<TraitCandidate> {
        let ranked = self.rank(table.field(field));
        let below = ranked
            .iter()
            .take_while(|(_, agg)| agg.count() < self.settings.min_evidence)
            .count();
        if below > 0 {
            debug!(field = %field, skipped = below, "Demographic candidates below threshold");
        }
        ranked
            .into_iter()
            .find(|(_, agg)| agg.count() >= self.settings.min_evidence)
            .map(|(key, agg)| self.candidate(key, agg))
    }

    pub fn classify_demographics(&self, table: &SignalTable) -> BTreeMap<DemographicField, Option<TraitCandidate>> {
        DemographicField::all()
            .iter()
            .map(|field| (*field, self.classify_field(table, *field)))
            .collect()
    }

    /// Top labels of a trait dimension that meet the threshold
    pub fn classify_dimension(&self, table: &SignalTable, dimension: Dimension) -> Vec<TraitCandidate> {
        let limit = if dimension == Dimension::Behavior {
            self.settings.behavior_top_k
        } else {
            self.settings.top_k
        };

        let selected: Vec<TraitCandidate> = self
            .rank(table.dimension(dimension))
            .into_iter()
            .filter(|(_, agg)| agg.count() >= self.settings.min_evidence)
            .take(limit)
            .map(|(key, agg)| self.candidate(key, agg))
            .collect();

        debug!(dimension = %dimension, selected = selected.len(), "Dimension classified");
        selected
    }

    /// Positions for every axis with evidence on at least one side
    pub fn score_axes(&self, table: &SignalTable) -> Vec<ScaleCandidate> {
        self.rules
            .axes
            .iter()
            .enumerate()
            .filter_map(|(index, axis)| {
                let left = table.pole(index, Pole::Left);
                let right = table.pole(index, Pole::Right);
                let left_strength = left.map_or(0.0, SignalAggregate::strength);
                let right_strength = right.map_or(0.0, SignalAggregate::strength);
                let total = left_strength + right_strength;
                if total <= 0.0 {
                    return None;
                }

                let position = (right_strength / total)
                    .clamp(self.settings.scale_floor, self.settings.scale_ceiling);

                let mut contributions: Vec<Contribution> = Vec::new();
                for c in left.into_iter().chain(right).flat_map(|a| a.contributions()) {
                    match contributions.iter_mut().find(|m| m.item_id == c.item_id) {
                        Some(merged) => merged.strength += c.strength,
                        None => contributions.push(c.clone()),
                    }
                }

                Some(ScaleCandidate {
                    axis: ScaleAxis {
                        name: axis.name.clone(),
                        left: axis.left.label.clone(),
                        right: axis.right.label.clone(),
                    },
                    position,
                    contributions,
                })
            })
            .collect()
    }

    /// Classify every dimension sequentially
    pub fn classify(&self, table: &SignalTable) -> Classification {
        Classification {
            demographics: self.classify_demographics(table),
            traits: Dimension::trait_dimensions()
                .iter()
                .map(|dim| (*dim, self.classify_dimension(table, *dim)))
                .collect(),
            scales: self.score_axes(table),
        }
    }

    fn candidate(&self, key: &SignalKey, agg: &SignalAggregate) -> TraitCandidate {
        TraitCandidate {
            dimension: key.dimension,
            field: key.field,
            label: key.label.clone(),
            description: self.describe(key, agg),
            support: agg.count(),
            strength: agg.strength(),
            contributions: agg.contributions().to_vec(),
        }
    }

    fn describe(&self, key: &SignalKey, agg: &SignalAggregate) -> String {
        let support = agg.count();
        let behavior = &self.rules.behavior;
        let template = match &agg.source {
            SignalSource::Label(index) => self.rules.labels.get(*index).map(|r| (r.description.as_str(), None)),
            SignalSource::Community(category) => behavior
                .community
                .as_ref()
                .map(|c| (c.description.as_str(), Some(category.as_str()))),
            SignalSource::Window(index) => behavior.windows.get(*index).map(|w| (w.description.as_str(), None)),
            SignalSource::Cadence(index) => behavior.cadence.get(*index).map(|c| (c.description.as_str(), None)),
            SignalSource::Pole(_) => None,
        };
        match template {
            Some((template, category)) => render_template(template, &key.label, support, category),
            None => key.label.clone(),
        }
    }
}
