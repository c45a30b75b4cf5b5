//! Persona record: the evidence-linked output of an analysis run.
//!
//! Every claim in a record names the content items that support it. Fields
//! without qualifying evidence are reported as insufficient data rather
//! than guessed.

pub mod types;

pub use types::{
    CategoryCount, Confidence, ConfidenceLevel, DemographicEstimate, DemographicField,
    Demographics, Dimension, PersonaRecord, PersonaSummary, ScaleAxis, ScaleScore, TraitClaim,
};
