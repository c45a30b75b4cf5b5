//! Common test utilities and fixtures
//!
//! Shared builders for content items, pipelines and temporary files

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use persona_engine::{rules, AnalysisSettings, ContentItem, ContentStore, PersonaPipeline};
use tempfile::TempDir;

/// Get the path to the test fixtures directory
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// Get a path to a specific fixture file
pub fn fixture_path(name: &str) -> PathBuf {
    fixtures_dir().join(name)
}

pub fn profile_fixture() -> PathBuf {
    fixture_path("profile.json")
}

pub fn listing_fixture() -> PathBuf {
    fixture_path("listing.json")
}

pub fn valid_config_fixture() -> PathBuf {
    fixture_path("valid_config.toml")
}

pub fn invalid_config_fixture() -> PathBuf {
    fixture_path("invalid_config.toml")
}

pub fn custom_rules_fixture() -> PathBuf {
    fixture_path("custom_rules.toml")
}

// ─────────────────────────────────────────────────────────────────
// Content Builders
// ─────────────────────────────────────────────────────────────────

/// 2024-05-01 at the given UTC hour, shifted by `day` days
pub fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1 + day, hour, 0, 0).unwrap()
}

pub fn post(id: &str, text: &str, category: &str, score: i64, hour: u32) -> ContentItem {
    ContentItem::post(id, text, category, score, at(0, hour))
}

pub fn comment(id: &str, text: &str, category: &str, score: i64, hour: u32) -> ContentItem {
    ContentItem::comment(id, text, category, score, at(0, hour))
}

pub fn store(items: Vec<ContentItem>) -> ContentStore {
    ContentStore::load(items).expect("test items are valid")
}

// ─────────────────────────────────────────────────────────────────
// Pipelines
// ─────────────────────────────────────────────────────────────────

/// Pipeline over the bundled rules with default settings
pub fn bundled_pipeline() -> PersonaPipeline {
    pipeline_with(AnalysisSettings::default())
}

pub fn pipeline_with(settings: AnalysisSettings) -> PersonaPipeline {
    PersonaPipeline::new(Arc::new(rules::bundled().unwrap()), settings).unwrap()
}

/// Pipeline over an inline TOML rule table
pub fn pipeline_for_rules(toml: &str) -> PersonaPipeline {
    let table = rules::RuleTable::from_toml_str(toml, "test rules").unwrap();
    PersonaPipeline::new(Arc::new(table), AnalysisSettings::default()).unwrap()
}

// ─────────────────────────────────────────────────────────────────
// Temporary Files
// ─────────────────────────────────────────────────────────────────

/// Scratch directory that lives as long as the fixture
pub struct TempFiles {
    temp_dir: TempDir,
}

impl TempFiles {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub fn dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write a file and return its path
    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixtures_exist() {
        for path in [
            profile_fixture(),
            listing_fixture(),
            valid_config_fixture(),
            invalid_config_fixture(),
            custom_rules_fixture(),
        ] {
            assert!(path.exists(), "missing fixture {}", path.display());
        }
    }
}
