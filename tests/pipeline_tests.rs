//! End-to-end analysis tests
//!
//! Runs the full pipeline over small hand-built stores and the JSON fixtures

mod common;

use std::sync::Arc;

use common::*;
use persona_engine::config::InputSettings;
use persona_engine::persona::{ConfidenceLevel, DemographicField, Dimension};
use persona_engine::{ingest, AnalysisSettings, ContentStore, PersonaPipeline, PersonaRecord};

fn fixture_store() -> (Option<String>, ContentStore) {
    let ingested = ingest::load_document(profile_fixture().to_str().unwrap(), &InputSettings::default()).unwrap();
    (ingested.subject, ContentStore::load(ingested.items).unwrap())
}

fn assert_evidence_resolves(record: &PersonaRecord, store: &ContentStore, cap: usize) {
    for claim in record.all_claims() {
        assert!(!claim.evidence_ids.is_empty(), "{} has no evidence", claim.label);
        assert!(claim.evidence_ids.len() <= cap);
        assert!(claim.evidence_ids.iter().all(|id| store.contains(id)));
    }
    for field in DemographicField::all() {
        assert!(record.demographics.get(*field).evidence_ids().iter().all(|id| store.contains(id)));
    }
    for scale in &record.scales {
        assert!(scale.evidence_ids.iter().all(|id| store.contains(id)));
    }
}

// ─────────────────────────────────────────────────────────────────
// Scenarios
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_sparse_profile_reports_insufficient_data() {
    let store = store(vec![
        post("a1", "Blue skies today", "pics", 3, 1),
        post("a2", "Nice shot", "earthporn", 10, 8),
        post("a3", "Red bricks", "architecture", 1, 14),
    ]);

    let record = bundled_pipeline().run(&store, Some("quiet_one")).unwrap();

    assert!(record.all_claims().next().is_none());
    for dimension in Dimension::trait_dimensions() {
        assert!(record.claims(*dimension).is_empty(), "{} should be empty", dimension);
    }
    for field in DemographicField::all() {
        assert!(!record.demographics.get(*field).is_known());
    }
    assert!(record.scales.is_empty());
    assert_eq!(record.confidence.level, ConfidenceLevel::Low);
    assert_eq!(record.confidence.empty_dimensions.len(), Dimension::trait_dimensions().len());
    assert_eq!(record.confidence.insufficient_fields.len(), DemographicField::all().len());
    assert_eq!(record.summary.items_analyzed, 3);
}

#[test]
fn test_repeated_topic_becomes_interest() {
    let store = store(vec![
        post("h1", "Walked the ridge trail", "hiking", 4, 9),
        post("h2", "Muddy trail after rain", "hiking", 2, 9),
        post("h3", "New trail map", "hiking", 7, 9),
        post("h4", "Trail closed for repairs", "hiking", 1, 9),
        post("h5", "Which trail is shaded", "hiking", 3, 9),
    ]);

    let record = bundled_pipeline().run(&store, None).unwrap();

    let claim = record.find_claim(Dimension::Interests, "Outdoor Activities").unwrap();
    assert_eq!(claim.support, 5);
    let mut cited = claim.evidence_ids.clone();
    cited.sort();
    assert_eq!(cited, vec!["h1", "h2", "h3", "h4", "h5"]);
    assert!(claim.description.contains("5 contributions"));
    assert_eq!(record.claims(Dimension::Interests)[0].label, "Outdoor Activities");

    let community = record.find_claim(Dimension::Behavior, "r/hiking Community").unwrap();
    assert_eq!(community.support, 5);
    assert!(record.find_claim(Dimension::Behavior, "Morning Poster").is_some());
}

#[test]
fn test_equal_strength_labels_sorted_by_name() {
    let store = store(vec![
        post("v1", "Fast delivery", "shopping", 5, 12),
        post("v2", "Shipping was fast", "shopping", 5, 13),
    ]);

    let record = bundled_pipeline().run(&store, None).unwrap();
    let values: Vec<&str> = record.claims(Dimension::Values).iter().map(|c| c.label.as_str()).collect();
    assert_eq!(values, vec!["Convenience", "Speed"]);

    let narrow = pipeline_with(AnalysisSettings {
        top_k: 1,
        ..Default::default()
    });
    let record = narrow.run(&store, None).unwrap();
    assert_eq!(record.claims(Dimension::Values).len(), 1);
    assert_eq!(record.claims(Dimension::Values)[0].label, "Convenience");
}

#[test]
fn test_citations_capped_strongest_first() {
    let items = (1..=8)
        .map(|n| post(&format!("p{}", n), "Another trail walk", "pics", n, 10))
        .collect();
    let store = store(items);

    let record = bundled_pipeline().run(&store, None).unwrap();
    let claim = record.find_claim(Dimension::Interests, "Outdoor Activities").unwrap();

    assert_eq!(claim.support, 8);
    assert_eq!(claim.evidence_ids, vec!["p8", "p7", "p6", "p5", "p4"]);
}

#[test]
fn test_demographic_needs_repeated_evidence() {
    let single = store(vec![post("m1", "My wife says hi", "pics", 2, 10)]);
    let record = bundled_pipeline().run(&single, None).unwrap();
    assert!(!record.demographics.relationship.is_known());

    let repeated = store(vec![
        post("m1", "My wife says hi", "pics", 2, 10),
        comment("m2", "Cooked dinner with my wife", "food", 1, 19),
    ]);
    let record = bundled_pipeline().run(&repeated, None).unwrap();
    assert_eq!(record.demographics.relationship.label(), Some("Married"));
    assert_eq!(record.demographics.relationship.evidence_ids().len(), 2);
    assert!(!record.confidence.insufficient_fields.contains(&DemographicField::Relationship));
}

// ─────────────────────────────────────────────────────────────────
// Scales
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_scale_position_between_poles() {
    let store = store(vec![
        post("s1", "A quiet evening alone", "pics", 1, 9),
        post("s2", "Alone on the beach", "pics", 1, 9),
        post("s3", "Quiet morning", "pics", 1, 9),
        post("s4", "Big party tonight", "pics", 1, 9),
    ]);

    let record = bundled_pipeline().run(&store, None).unwrap();
    let scale = record.scale("introvert_extrovert").unwrap();

    assert!((scale.position - 0.25).abs() < 1e-9);
    assert_eq!(scale.axis.left, "Introvert");
    assert_eq!(scale.axis.right, "Extrovert");
    assert_eq!(scale.evidence_ids.len(), 4);
    assert!(record.scale("feeling_thinking").is_none());
}

#[test]
fn test_one_sided_scale_is_clamped() {
    let store = store(vec![
        post("s1", "Alone again", "pics", 50, 9),
        post("s2", "Quiet week", "pics", 50, 9),
    ]);

    let settings = AnalysisSettings::default();
    let record = pipeline_with(settings.clone()).run(&store, None).unwrap();
    let scale = record.scale("introvert_extrovert").unwrap();
    assert_eq!(scale.position, settings.scale_floor);

    for scale in &record.scales {
        assert!(scale.position >= settings.scale_floor && scale.position <= settings.scale_ceiling);
    }
}

// ─────────────────────────────────────────────────────────────────
// Properties
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_fixture_profile_end_to_end() {
    let (subject, store) = fixture_store();
    let record = bundled_pipeline().run(&store, subject.as_deref()).unwrap();

    assert_eq!(record.subject.as_deref(), Some("trail_runner"));
    assert_eq!(record.summary.posts, 4);
    assert_eq!(record.summary.comments, 3);

    let outdoor = record.find_claim(Dimension::Interests, "Outdoor Activities").unwrap();
    assert_eq!(outdoor.support, 7);
    assert_eq!(outdoor.evidence_ids.len(), 5);

    let courteous = record.find_claim(Dimension::CommunicationStyle, "Courteous").unwrap();
    assert_eq!(courteous.support, 2);

    assert_evidence_resolves(&record, &store, AnalysisSettings::default().citation_cap);
}

#[test]
fn test_claims_meet_evidence_threshold() {
    let (_, store) = fixture_store();
    for min_evidence in 1..=4 {
        let settings = AnalysisSettings {
            min_evidence,
            ..Default::default()
        };
        let record = pipeline_with(settings).run(&store, None).unwrap();
        for claim in record.all_claims() {
            assert!(claim.support >= min_evidence, "{} below threshold {}", claim.label, min_evidence);
        }
        assert_evidence_resolves(&record, &store, 5);
    }
}

#[test]
fn test_more_evidence_never_lowers_support() {
    let mut items = vec![
        post("h1", "Trail day", "pics", 2, 9),
        post("h2", "Trail night", "pics", 2, 21),
    ];
    let before = bundled_pipeline().run(&store(items.clone()), None).unwrap();
    items.push(comment("h3", "That trail is great", "pics", 1, 15));
    let after = bundled_pipeline().run(&store(items), None).unwrap();

    let support = |r: &PersonaRecord| {
        r.find_claim(Dimension::Interests, "Outdoor Activities")
            .map_or(0, |c| c.support)
    };
    assert_eq!(support(&before), 2);
    assert_eq!(support(&after), 3);
}

#[test]
fn test_unsupported_new_label_keeps_existing_claims() {
    let mut items = vec![
        post("h1", "Trail day", "pics", 2, 9),
        post("h2", "Trail night", "pics", 2, 21),
    ];
    let before = bundled_pipeline().run(&store(items.clone()), None).unwrap();
    assert!(before.find_claim(Dimension::Interests, "Outdoor Activities").is_some());

    // One strong item for a label with no prior evidence
    items.push(post("v1", "Fast delivery", "pics", 5000, 12));
    let after = bundled_pipeline().run(&store(items), None).unwrap();

    for claim in before.all_claims().filter(|c| c.dimension != Dimension::Behavior) {
        let kept = after.find_claim(claim.dimension, &claim.label).unwrap();
        assert!(kept.support >= claim.support);
    }
    assert!(after.find_claim(Dimension::Values, "Speed").is_none());
}

#[test]
fn test_unsupported_new_demographic_keeps_estimate() {
    let mut items = vec![
        post("m1", "My wife says hi", "pics", 2, 10),
        comment("m2", "Cooked dinner with my wife", "food", 1, 19),
    ];
    let before = bundled_pipeline().run(&store(items.clone()), None).unwrap();
    assert_eq!(before.demographics.relationship.label(), Some("Married"));

    items.push(post("m3", "Swiping on tinder again", "pics", 5000, 22));
    let after = bundled_pipeline().run(&store(items), None).unwrap();

    assert_eq!(after.demographics.relationship.label(), Some("Married"));
    assert_eq!(after.demographics.relationship.evidence_ids().len(), 2);
}

#[test]
fn test_runs_are_deterministic() {
    let (subject, store) = fixture_store();
    let pipeline = bundled_pipeline();

    let first = pipeline.run(&store, subject.as_deref()).unwrap();
    let second = pipeline.run(&store, subject.as_deref()).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.fingerprint().unwrap(), second.fingerprint().unwrap());
    assert_eq!(first.to_canonical_json().unwrap(), second.to_canonical_json().unwrap());
}

#[test]
fn test_custom_rule_table() {
    let pipeline = pipeline_for_rules(
        r#"
[[labels]]
dimension = "interests"
label = "Astronomy"
description = "Watches the night sky ({support} contributions)"
keywords = ["telescope"]
"#,
    );
    let store = store(vec![
        post("t1", "New telescope arrived", "space", 3, 23),
        comment("t2", "Telescope collimation tips", "space", 1, 23),
    ]);

    let record = pipeline.run(&store, None).unwrap();
    let claim = record.find_claim(Dimension::Interests, "Astronomy").unwrap();
    assert_eq!(claim.description, "Watches the night sky (2 contributions)");
    assert!(record.claims(Dimension::Behavior).is_empty());
    assert!(record.scales.is_empty());
}

#[test]
fn test_global_rules_default_to_bundled() {
    let (subject, store) = fixture_store();
    let global = PersonaPipeline::from_global(AnalysisSettings::default()).unwrap();

    let expected = bundled_pipeline().run(&store, subject.as_deref()).unwrap();
    assert_eq!(global.run(&store, subject.as_deref()).unwrap(), expected);
}

#[test]
fn test_empty_store() {
    let store = store(Vec::new());
    let record = bundled_pipeline().run(&store, None).unwrap();

    assert_eq!(record.confidence.level, ConfidenceLevel::Low);
    assert_eq!(record.summary.items_analyzed, 0);
    assert!(record.summary.first_activity.is_none());
    assert!(record.summary.top_categories.is_empty());
}

// ─────────────────────────────────────────────────────────────────
// Parallel Execution
// ─────────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_parallel_run_matches_sequential() {
    let (subject, store) = fixture_store();
    let pipeline = bundled_pipeline();

    let sequential = pipeline.run(&store, subject.as_deref()).unwrap();
    let parallel = pipeline
        .run_parallel(Arc::new(store), subject.as_deref())
        .await
        .unwrap();

    assert_eq!(sequential, parallel);
    assert_eq!(sequential.fingerprint().unwrap(), parallel.fingerprint().unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_parallel_run_on_empty_store() {
    let record = bundled_pipeline()
        .run_parallel(Arc::new(store(Vec::new())), None)
        .await
        .unwrap();
    assert_eq!(record.confidence.level, ConfidenceLevel::Low);
}
