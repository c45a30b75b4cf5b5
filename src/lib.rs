//! persona-engine - Evidence-backed persona analysis
//!
//! Turns a user's public posts and comments into a [`PersonaRecord`]:
//! demographic estimates, trait claims per dimension and scale positions,
//! each citing the content items that support it.
//!
//! ```no_run
//! use std::sync::Arc;
//! use persona_engine::{rules, AnalysisSettings, ContentStore, PersonaPipeline};
//!
//! # fn main() -> persona_engine::Result<()> {
//! let ingested = persona_engine::ingest::load_document("profile.json", &Default::default())?;
//! let store = ContentStore::load(ingested.items)?;
//! let pipeline = PersonaPipeline::new(Arc::new(rules::bundled()?), AnalysisSettings::default())?;
//! let record = pipeline.run(&store, ingested.subject.as_deref())?;
//! println!("{}", record.fingerprint()?);
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod config;
pub mod content;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod persona;
pub mod rules;

pub use analysis::PersonaPipeline;
pub use config::{AnalysisSettings, EngineConfig};
pub use content::{ContentItem, ContentKind, ContentStore};
pub use error::{Error, ErrorCode, Result};
pub use persona::PersonaRecord;
