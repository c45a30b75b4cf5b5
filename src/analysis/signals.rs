//! Signal extraction
//!
//! Scans every content item against the rule table and accumulates
//! per-label aggregates, per-pole aggregates for the scale axes and the
//! temporal histograms used for behavior patterns. Scan order is storage
//! order, and every map is ordered, so two scans of the same store produce
//! identical tables.

use std::collections::BTreeMap;

use chrono::Timelike;
use tracing::{debug, trace};

use crate::config::AnalysisSettings;
use crate::content::{ContentItem, ContentStore};
use crate::persona::{DemographicField, Dimension};
use crate::rules::{RuleTable, TextMarker};

use super::normalize::{normalize_category, normalize_text, NormalizedText};

// ─────────────────────────────────────────────────────────────────
// Keys & Sources
// ─────────────────────────────────────────────────────────────────

/// Identity of a persona-visible label
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SignalKey {
    pub dimension: Dimension,
    /// Set for demographic labels only
    pub field: Option<DemographicField>,
    pub label: String,
}

impl SignalKey {
    pub fn new(dimension: Dimension, field: Option<DemographicField>, label: impl Into<String>) -> Self {
        Self {
            dimension,
            field,
            label: label.into(),
        }
    }
}

/// Side of a scale axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Pole {
    Left,
    Right,
}

/// One end of the axis at `axis` (index into the rule table)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PoleKey {
    pub axis: usize,
    pub side: Pole,
}

/// Which rule produced an aggregate; used to render its description
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalSource {
    /// Index into `RuleTable::labels`
    Label(usize),
    /// Community pattern instantiated for a category
    Community(String),
    /// Index into `behavior.windows`
    Window(usize),
    /// Index into `behavior.cadence`
    Cadence(usize),
    Pole(PoleKey),
}

/// What a signal counts towards
#[derive(Debug, Clone, PartialEq)]
pub enum SignalTarget {
    Trait(SignalKey, SignalSource),
    Pole(PoleKey),
}

/// One rule match on one item
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub target: SignalTarget,
    pub item_id: String,
    pub strength: f64,
}

// ─────────────────────────────────────────────────────────────────
// Aggregates
// ─────────────────────────────────────────────────────────────────

/// An item's share of an aggregate
#[derive(Debug, Clone, PartialEq)]
pub struct Contribution {
    pub item_id: String,
    pub strength: f64,
}

/// Accumulated evidence for one label or pole
#[derive(Debug, Clone, PartialEq)]
pub struct SignalAggregate {
    pub source: SignalSource,
    contributions: Vec<Contribution>,
    strength: f64,
}

impl SignalAggregate {
    pub fn new(source: SignalSource) -> Self {
        Self {
            source,
            contributions: Vec::new(),
            strength: 0.0,
        }
    }

    /// Add an item's strength; repeated hits from the same item merge
    pub fn absorb(&mut self, item_id: &str, strength: f64) {
        self.strength += strength;
        if let Some(existing) = self.contributions.iter_mut().find(|c| c.item_id == item_id) {
            existing.strength += strength;
            return;
        }
        self.contributions.push(Contribution {
            item_id: item_id.to_string(),
            strength,
        });
    }

    /// Number of distinct contributing items
    pub fn count(&self) -> usize {
        self.contributions.len()
    }

    pub fn strength(&self) -> f64 {
        self.strength
    }

    /// Contributions in scan order
    pub fn contributions(&self) -> &[Contribution] {
        &self.contributions
    }

    pub fn item_ids(&self) -> impl Iterator<Item = &str> {
        self.contributions.iter().map(|c| c.item_id.as_str())
    }
}

/// Hour-of-day and community histograms
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemporalProfile {
    /// Items per UTC hour
    pub hour_histogram: [u32; 24],
    /// Items per category, keyed by category name
    pub categories: BTreeMap<String, usize>,
}

impl TemporalProfile {
    fn record(&mut self, item: &ContentItem) {
        self.hour_histogram[item.timestamp.hour() as usize] += 1;
        if !item.category.trim().is_empty() {
            *self.categories.entry(item.category.clone()).or_insert(0) += 1;
        }
    }
}

/// Everything the extractor learned from one store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalTable {
    pub aggregates: BTreeMap<SignalKey, SignalAggregate>,
    pub poles: BTreeMap<PoleKey, SignalAggregate>,
    pub temporal: TemporalProfile,
    pub items_scanned: usize,
}

impl SignalTable {
    pub fn absorb(&mut self, signal: Signal) {
        let Signal {
            target,
            item_id,
            strength,
        } = signal;
        match target {
            SignalTarget::Trait(key, source) => self
                .aggregates
                .entry(key)
                .or_insert_with(|| SignalAggregate::new(source))
                .absorb(&item_id, strength),
            SignalTarget::Pole(key) => self
                .poles
                .entry(key)
                .or_insert_with(|| SignalAggregate::new(SignalSource::Pole(key)))
                .absorb(&item_id, strength),
        }
    }

    /// Aggregates of a trait dimension
    pub fn dimension(&self, dimension: Dimension) -> impl Iterator<Item = (&SignalKey, &SignalAggregate)> {
        self.aggregates
            .iter()
            .filter(move |(key, _)| key.dimension == dimension)
    }

    /// Aggregates competing for a demographic field
    pub fn field(&self, field: DemographicField) -> impl Iterator<Item = (&SignalKey, &SignalAggregate)> {
        self.aggregates
            .iter()
            .filter(move |(key, _)| key.field == Some(field))
    }

    /// Aggregate for a label, searching every field of the dimension
    pub fn aggregate(&self, dimension: Dimension, label: &str) -> Option<&SignalAggregate> {
        self.dimension(dimension)
            .find(|(key, _)| key.label == label)
            .map(|(_, agg)| agg)
    }

    pub fn pole(&self, axis: usize, side: Pole) -> Option<&SignalAggregate> {
        self.poles.get(&PoleKey { axis, side })
    }
}

// ─────────────────────────────────────────────────────────────────
// Extractor
// ─────────────────────────────────────────────────────────────────

#[derive(Debug)]
struct CompiledLabel {
    index: usize,
    key: SignalKey,
    keywords: Vec<String>,
    hints: Vec<String>,
    markers: Vec<TextMarker>,
    multiplier: f64,
}

#[derive(Debug)]
struct CompiledPole {
    key: PoleKey,
    keywords: Vec<String>,
    multiplier: f64,
}

/// Applies a rule table to a content store
///
/// Keywords and hints are normalized once at construction so scanning only
/// normalizes item text.
#[derive(Debug)]
pub struct SignalExtractor<'r> {
    rules: &'r RuleTable,
    base_hit: f64,
    hint_strength: f64,
    labels: Vec<CompiledLabel>,
    poles: Vec<CompiledPole>,
}

fn compile_keywords(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .map(|k| normalize_text(k))
        .filter(|k| !k.is_empty())
        .collect()
}

impl<'r> SignalExtractor<'r> {
    pub fn new(rules: &'r RuleTable, settings: &AnalysisSettings) -> Self {
        let labels = rules
            .labels
            .iter()
            .enumerate()
            .map(|(index, rule)| CompiledLabel {
                index,
                key: SignalKey::new(rule.dimension, rule.field, rule.label.clone()),
                keywords: compile_keywords(&rule.keywords),
                hints: rule
                    .category_hints
                    .iter()
                    .map(|h| normalize_category(h))
                    .filter(|h| !h.is_empty())
                    .collect(),
                markers: rule.markers.clone(),
                multiplier: rule.weight_multiplier,
            })
            .collect();

        let poles = rules
            .axes
            .iter()
            .enumerate()
            .flat_map(|(axis, rule)| {
                [(Pole::Left, &rule.left), (Pole::Right, &rule.right)]
                    .into_iter()
                    .map(move |(side, pole)| CompiledPole {
                        key: PoleKey { axis, side },
                        keywords: compile_keywords(&pole.keywords),
                        multiplier: pole.weight_multiplier,
                    })
            })
            .collect();

        Self {
            rules,
            base_hit: settings.base_hit,
            hint_strength: settings.category_hint_strength,
            labels,
            poles,
        }
    }

    /// Signals produced by a single item, at most one per label and pole
    ///
    /// Activity-window signals are emitted unconditionally here; the
    /// `min_share` gate needs the whole store and is applied by `extract`.
    pub fn scan_item(&self, item: &ContentItem) -> Vec<Signal> {
        let text = NormalizedText::new(&item.text);
        let category = normalize_category(&item.category);
        let weighted = self.base_hit * item.weight_factor();
        let mut signals = Vec::new();

        for rule in &self.labels {
            let keyword_hit = rule.keywords.iter().any(|k| text.contains_phrase(k))
                || rule.markers.iter().any(|m| marker_present(*m, &item.text, &text));
            let hint_hit = !category.is_empty() && rule.hints.iter().any(|h| *h == category);
            if !keyword_hit && !hint_hit {
                continue;
            }

            let mut strength = 0.0;
            if keyword_hit {
                strength += weighted * rule.multiplier;
            }
            if hint_hit {
                strength += self.hint_strength;
            }
            signals.push(Signal {
                target: SignalTarget::Trait(rule.key.clone(), SignalSource::Label(rule.index)),
                item_id: item.id.clone(),
                strength,
            });
        }

        for pole in &self.poles {
            if pole.keywords.iter().any(|k| text.contains_phrase(k)) {
                signals.push(Signal {
                    target: SignalTarget::Pole(pole.key),
                    item_id: item.id.clone(),
                    strength: weighted * pole.multiplier,
                });
            }
        }

        let behavior = &self.rules.behavior;
        if let Some(ref community) = behavior.community {
            if !item.category.trim().is_empty() {
                let label = community.label_for(&item.category);
                signals.push(Signal {
                    target: SignalTarget::Trait(
                        SignalKey::new(Dimension::Behavior, None, label),
                        SignalSource::Community(item.category.clone()),
                    ),
                    item_id: item.id.clone(),
                    strength: weighted * community.weight_multiplier,
                });
            }
        }

        let hour = item.timestamp.hour();
        for (index, window) in behavior.windows.iter().enumerate() {
            if window.contains(hour) {
                signals.push(Signal {
                    target: SignalTarget::Trait(
                        SignalKey::new(Dimension::Behavior, None, window.label.clone()),
                        SignalSource::Window(index),
                    ),
                    item_id: item.id.clone(),
                    strength: weighted,
                });
            }
        }

        signals
    }

    /// Scan the whole store
    pub fn extract(&self, store: &ContentStore) -> SignalTable {
        let mut table = SignalTable::default();

        for item in store.iter() {
            table.temporal.record(item);
            let signals = self.scan_item(item);
            trace!(item = %item.id, signals = signals.len(), "Item scanned");
            for signal in signals {
                table.absorb(signal);
            }
        }
        table.items_scanned = store.len();

        self.apply_window_shares(&mut table, store.len());
        self.apply_cadence(&mut table, store);

        debug!(
            items = table.items_scanned,
            aggregates = table.aggregates.len(),
            poles = table.poles.len(),
            "Signal extraction complete"
        );
        table
    }

    fn apply_window_shares(&self, table: &mut SignalTable, total: usize) {
        let windows = &self.rules.behavior.windows;
        table.aggregates.retain(|key, agg| match agg.source {
            SignalSource::Window(index) => {
                let min_share = windows.get(index).map_or(1.0, |w| w.min_share);
                let share = agg.count() as f64 / total.max(1) as f64;
                if share < min_share {
                    trace!(window = %key.label, share, min_share, "Activity window below share");
                    return false;
                }
                true
            }
            _ => true,
        });
    }

    fn apply_cadence(&self, table: &mut SignalTable, store: &ContentStore) {
        for (index, rule) in self.rules.behavior.cadence.iter().enumerate() {
            if !rule.matches(store.count_of(rule.kind)) {
                continue;
            }
            let key = SignalKey::new(Dimension::Behavior, None, rule.label.clone());
            for item in store.items_of(rule.kind) {
                table.absorb(Signal {
                    target: SignalTarget::Trait(key.clone(), SignalSource::Cadence(index)),
                    item_id: item.id.clone(),
                    strength: self.base_hit * item.weight_factor(),
                });
            }
        }
    }
}

fn marker_present(marker: TextMarker, raw: &str, normalized: &NormalizedText) -> bool {
    match marker {
        TextMarker::Question => raw.contains('?'),
        TextMarker::Exclamation => raw.contains('!'),
        TextMarker::LongForm => normalized.word_count() >= TextMarker::LONG_FORM_WORDS,
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
