//! Input documents
//!
//! Turns a fetched profile or Reddit Listing into content items. Removed
//! bodies are skipped here; everything else is passed on unchanged for
//! `ContentStore::load` to validate.

pub mod document;

use std::fs;
use std::io::Read;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::config::InputSettings;
use crate::content::{ContentItem, ContentKind};
use crate::error::{Error, Result};

pub use document::{InputDocument, Listing, ProfileDocument, RawComment, RawPost};

/// Decoded input, ready for `ContentStore::load`
#[derive(Debug, Clone, Default)]
pub struct Ingested {
    /// Username from the document, when it names one
    pub subject: Option<String>,
    pub items: Vec<ContentItem>,
    /// Items dropped because their body was removed
    pub skipped: usize,
}

impl Ingested {
    pub fn count_of(&self, kind: ContentKind) -> usize {
        self.items.iter().filter(|i| i.kind == kind).count()
    }
}

/// Read an input document from a path, or from stdin for `-`
pub fn read_source(source: &str) -> Result<String> {
    if source == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| Error::input_parse("stdin", e.to_string()))?;
        return Ok(buffer);
    }
    let expanded = shellexpand::tilde(source);
    fs::read_to_string(Path::new(expanded.as_ref()))
        .map_err(|e| Error::input_parse(source, format!("cannot read file: {}", e)))
}

/// Read and decode an input document
pub fn load_document(source: &str, limits: &InputSettings) -> Result<Ingested> {
    let content = read_source(source)?;
    parse_document(&content, source, limits)
}

/// Decode an input document, keeping the first `limits` items of each kind
pub fn parse_document(content: &str, source_name: &str, limits: &InputSettings) -> Result<Ingested> {
    let document: InputDocument =
        serde_json::from_str(content).map_err(|e| Error::input_parse(source_name, e.to_string()))?;

    let (subject, posts, comments) = match document {
        InputDocument::Listing(listing) => split_listing(listing, source_name)?,
        InputDocument::Profile(profile) => {
            if profile.posts.is_none() && profile.comments.is_none() {
                return Err(Error::input_parse(
                    source_name,
                    "document has neither posts nor comments",
                ));
            }
            (
                profile.username,
                profile.posts.unwrap_or_default(),
                profile.comments.unwrap_or_default(),
            )
        }
    };
    debug!(posts = posts.len(), comments = comments.len(), "Input document decoded");

    let mut ingested = Ingested {
        subject: subject.filter(|s| !s.trim().is_empty()),
        ..Default::default()
    };

    for raw in posts.into_iter().take(limits.posts_limit) {
        let id = raw.id.clone();
        match raw.into_item()? {
            Some(item) => ingested.items.push(item),
            None => skip(&mut ingested, &id, ContentKind::Post),
        }
    }
    for raw in comments.into_iter().take(limits.comments_limit) {
        let id = raw.id.clone();
        match raw.into_item()? {
            Some(item) => ingested.items.push(item),
            None => skip(&mut ingested, &id, ContentKind::Comment),
        }
    }

    info!(
        source = source_name,
        posts = ingested.count_of(ContentKind::Post),
        comments = ingested.count_of(ContentKind::Comment),
        skipped = ingested.skipped,
        "Input loaded"
    );
    Ok(ingested)
}

fn skip(ingested: &mut Ingested, id: &str, kind: ContentKind) {
    warn!(item = id, kind = %kind, "Skipping removed item");
    ingested.skipped += 1;
}

type Split = (Option<String>, Vec<RawPost>, Vec<RawComment>);

fn split_listing(listing: Listing, source_name: &str) -> Result<Split> {
    if listing.kind != "Listing" {
        return Err(Error::input_parse(
            source_name,
            format!("expected a Listing, found kind '{}'", listing.kind),
        ));
    }

    let mut author = None;
    let mut posts = Vec::new();
    let mut comments = Vec::new();

    for (index, thing) in listing.data.children.into_iter().enumerate() {
        let decode_error = |e: serde_json::Error| {
            Error::input_parse(source_name, format!("child {} ({}): {}", index, thing.kind, e))
        };
        match thing.kind.as_str() {
            "t3" => {
                let post: RawPost = serde_json::from_value(thing.data).map_err(decode_error)?;
                author = author.or_else(|| post.author.clone());
                posts.push(post);
            }
            "t1" => {
                let comment: RawComment = serde_json::from_value(thing.data).map_err(decode_error)?;
                author = author.or_else(|| comment.author.clone());
                comments.push(comment);
            }
            other => debug!(kind = other, "Ignoring listing child"),
        }
    }

    Ok((author, posts, comments))
}
