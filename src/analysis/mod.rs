//! Persona analysis
//!
//! Data flows one way: a [`ContentStore`](crate::content::ContentStore) is
//! scanned into a [`SignalTable`], classified into candidates, bound to
//! evidence and assembled into a [`PersonaRecord`](crate::persona::PersonaRecord).
//! Every stage reads the previous stage's output and owns its own.

pub mod assembler;
pub mod citation;
pub mod classifier;
pub mod normalize;
pub mod pipeline;
pub mod signals;

pub use assembler::{PersonaAssembler, PersonaParts};
pub use citation::CitationBinder;
pub use classifier::{Classification, ScaleCandidate, TraitCandidate, TraitClassifier};
pub use pipeline::PersonaPipeline;
pub use signals::{
    Contribution, Pole, PoleKey, Signal, SignalAggregate, SignalExtractor, SignalKey, SignalSource,
    SignalTable, SignalTarget, TemporalProfile,
};
