//! Immutable, validated storage for one run's content items.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{Error, Result};

use super::item::{ContentItem, ContentKind};

/// Validated, immutable collection of content items
///
/// Storage order is posts before comments, each kind keeping the order it
/// was supplied in. All downstream stages scan in this order and refer to
/// items by id.
#[derive(Debug, Default)]
pub struct ContentStore {
    items: Vec<ContentItem>,
    index: HashMap<String, usize>,
}

impl ContentStore {
    /// Validate and store a sequence of items
    ///
    /// Fails on the first item with an empty id, an empty text, or an id
    /// that was already seen.
    pub fn load(items: impl IntoIterator<Item = ContentItem>) -> Result<Self> {
        let mut posts = Vec::new();
        let mut comments = Vec::new();
        let mut seen = HashSet::new();

        for (position, item) in items.into_iter().enumerate() {
            if item.id.trim().is_empty() {
                return Err(Error::validation(
                    None,
                    format!("item at position {} has an empty id", position),
                ));
            }
            if item.text.trim().is_empty() {
                return Err(Error::validation(Some(&item.id), "text is empty"));
            }
            if !seen.insert(item.id.clone()) {
                return Err(Error::validation(Some(&item.id), "duplicate id"));
            }

            match item.kind {
                ContentKind::Post => posts.push(item),
                ContentKind::Comment => comments.push(item),
            }
        }

        let mut items = posts;
        items.append(&mut comments);

        let index = items
            .iter()
            .enumerate()
            .map(|(i, item)| (item.id.clone(), i))
            .collect();

        debug!(items = items.len(), "Content store loaded");
        Ok(Self { items, index })
    }

    /// Items of one kind in storage order
    ///
    /// The iterator is finite and `Clone`; calling this again starts over.
    pub fn items_of(&self, kind: ContentKind) -> impl Iterator<Item = &ContentItem> + Clone + '_ {
        self.items.iter().filter(move |item| item.kind == kind)
    }

    /// All items in storage order
    pub fn iter(&self) -> std::slice::Iter<'_, ContentItem> {
        self.items.iter()
    }

    /// Look up an item by id
    pub fn get(&self, id: &str) -> Result<&ContentItem> {
        self.index
            .get(id)
            .map(|&i| &self.items[i])
            .ok_or_else(|| Error::NotFound { id: id.to_string() })
    }

    /// Whether an id resolves in this store
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Position of an item in scan order
    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of items of one kind
    pub fn count_of(&self, kind: ContentKind) -> usize {
        self.items_of(kind).count()
    }

    /// Earliest and latest timestamps, if any items exist
    pub fn date_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let first = self.items.iter().map(|i| i.timestamp).min()?;
        let last = self.items.iter().map(|i| i.timestamp).max()?;
        Some((first, last))
    }
}
