//! End-to-end analysis run.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::AnalysisSettings;
use crate::content::ContentStore;
use crate::error::{Error, Result};
use crate::persona::{DemographicField, Demographics, Dimension, PersonaRecord};
use crate::rules::{self, RuleTable};

use super::assembler::{PersonaAssembler, PersonaParts};
use super::citation::CitationBinder;
use super::classifier::{Classification, TraitCandidate, TraitClassifier};
use super::signals::{SignalExtractor, SignalTable};

/// Extract → classify → bind → assemble
#[derive(Debug, Clone)]
pub struct PersonaPipeline {
    rules: Arc<RuleTable>,
    settings: AnalysisSettings,
}

impl PersonaPipeline {
    pub fn new(rules: Arc<RuleTable>, settings: AnalysisSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { rules, settings })
    }

    /// Pipeline over the process-wide rule table
    pub fn from_global(settings: AnalysisSettings) -> Result<Self> {
        Self::new(rules::global()?, settings)
    }

    /// Run every stage on the calling thread
    pub fn run(&self, store: &ContentStore, subject: Option<&str>) -> Result<PersonaRecord> {
        info!(items = store.len(), "Starting persona analysis");

        let table = self.extract(store);
        let classification = self.classifier().classify(&table);

        self.finish(store, &table, classification, subject)
    }

    /// Run classification with one blocking task per dimension
    ///
    /// Extraction is a single pass before the fan-out; tasks are joined in
    /// dimension order so the record equals the one `run` produces.
    pub async fn run_parallel(&self, store: Arc<ContentStore>, subject: Option<&str>) -> Result<PersonaRecord> {
        info!(items = store.len(), "Starting parallel persona analysis");

        let table = Arc::new(self.extract(&store));
        let classifier = self.classifier();

        let demographics_task: JoinHandle<BTreeMap<DemographicField, Option<TraitCandidate>>> = {
            let classifier = classifier.clone();
            let table = Arc::clone(&table);
            tokio::task::spawn_blocking(move || classifier.classify_demographics(&table))
        };

        let dimension_tasks: Vec<(Dimension, JoinHandle<Vec<TraitCandidate>>)> = Dimension::trait_dimensions()
            .iter()
            .map(|dimension| {
                let classifier = classifier.clone();
                let table = Arc::clone(&table);
                let dimension = *dimension;
                let handle = tokio::task::spawn_blocking(move || classifier.classify_dimension(&table, dimension));
                (dimension, handle)
            })
            .collect();

        let scales_task = {
            let classifier = classifier.clone();
            let table = Arc::clone(&table);
            tokio::task::spawn_blocking(move || classifier.score_axes(&table))
        };

        let demographics = demographics_task.await.map_err(join_error("demographics"))?;
        let mut traits = BTreeMap::new();
        for (dimension, handle) in dimension_tasks {
            let candidates = handle.await.map_err(join_error(dimension.slug()))?;
            traits.insert(dimension, candidates);
        }
        let scales = scales_task.await.map_err(join_error("scales"))?;
        debug!(tasks = traits.len() + 2, "Dimension tasks joined");

        let classification = Classification {
            demographics,
            traits,
            scales,
        };
        self.finish(&store, &table, classification, subject)
    }

    fn extract(&self, store: &ContentStore) -> SignalTable {
        SignalExtractor::new(&self.rules, &self.settings).extract(store)
    }

    fn classifier(&self) -> TraitClassifier {
        TraitClassifier::new(Arc::clone(&self.rules), self.settings.clone())
    }

    fn finish(
        &self,
        store: &ContentStore,
        table: &SignalTable,
        classification: Classification,
        subject: Option<&str>,
    ) -> Result<PersonaRecord> {
        let binder = CitationBinder::new(self.settings.citation_cap);

        let mut demographics = Demographics::unknown();
        for (field, candidate) in classification.demographics {
            demographics.set(field, binder.bind_demographic(candidate, store)?);
        }

        let mut traits = BTreeMap::new();
        for (dimension, candidates) in classification.traits {
            let mut claims = Vec::with_capacity(candidates.len());
            for candidate in candidates {
                claims.extend(binder.bind(candidate, store)?);
            }
            traits.insert(dimension, claims);
        }

        let mut scales = Vec::with_capacity(classification.scales.len());
        for candidate in classification.scales {
            scales.extend(binder.bind_scale(candidate, store)?);
        }

        let record = PersonaAssembler::new(&self.settings).assemble(
            store,
            &table.temporal,
            PersonaParts {
                subject: subject.map(str::to_string),
                demographics,
                traits,
                scales,
            },
        )?;

        info!(
            claims = record.all_claims().count(),
            scales = record.scales.len(),
            confidence = %record.confidence.level,
            "Persona analysis complete"
        );
        Ok(record)
    }
}

fn join_error(task: &str) -> impl FnOnce(tokio::task::JoinError) -> Error + '_ {
    move |e| Error::Internal(format!("{} task failed: {}", task, e))
}
