//! Content store: the normalized, immutable view of one subject's posts and
//! comments for the duration of an analysis run.

pub mod item;
pub mod store;

pub use item::{ContentItem, ContentKind};
pub use store::ContentStore;
