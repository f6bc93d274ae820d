/// [crate::properties] contains the basic building blocks shared by every stage of a build:
/// document identifiers, loaded documents, and the reference records extracted from them.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    borrow::Borrow,
    collections::{BTreeMap, BTreeSet},
    fmt::{Display, Formatter},
    ops::Range,
};

/// Timestamps carried by document metadata.
pub type Timestamp = DateTime<Utc>;

/// The canonical path of a document. Unique within a build and immutable once assigned.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocId(String);

impl DocId {
    /// Wrap an already canonical path. Use [crate::paths::canonicalize] for raw input paths.
    pub fn new(canonical_path: impl Into<String>) -> DocId {
        DocId(canonical_path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for DocId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for DocId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for DocId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DocId {
    fn from(value: &str) -> Self {
        DocId(value.to_string())
    }
}

/// Publication state of a graph node.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    #[default]
    Published,
    Draft,
    /// Stands in for a reference target that matched no document.
    Placeholder,
}

impl NodeState {
    pub fn is_published(&self) -> bool {
        matches!(self, NodeState::Published)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    /// `[[target]]` style link to another document.
    Document,
    /// `#tag` reference.
    Tag,
}

/// Where a document's title came from.
///
/// Only a declared title is a name the author chose. A heading title is still looked up, but it
/// never competes with declared names, and a file stem is never a lookup key of its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TitleSource {
    /// The `title` key of the metadata header.
    Header,
    /// The first level-one heading of the body.
    Heading,
    #[default]
    FileStem,
}

/// A reference token as it appears in a document body, before resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawReference {
    pub kind: ReferenceKind,
    /// The token exactly as written, delimiters included.
    pub raw: String,
    /// The part of the token naming the target document (or tag).
    pub target: String,
    /// Heading fragment following `#` inside a document link.
    pub fragment: Option<String>,
    /// Display text following `|` inside a document link.
    pub display: Option<String>,
    /// Byte range of `raw` within the body.
    pub span: Range<usize>,
    /// 1-based (line, column) within the source file.
    pub location: (usize, usize),
}

/// A normalized document, produced by [crate::codec::loader::load_document].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    id: DocId,
    pub title: String,
    pub title_source: TitleSource,
    /// Declared aliases in header order, case-insensitively deduplicated.
    pub aliases: Vec<String>,
    /// Header tags and inline tag references, normalized.
    pub tags: BTreeSet<String>,
    pub created: Option<Timestamp>,
    pub updated: Option<Timestamp>,
    pub draft: bool,
    pub body: String,
    /// Number of source lines preceding the body (header lines).
    pub body_line_offset: usize,
    /// Unrecognized header keys, kept verbatim for emitters.
    pub extra: BTreeMap<String, serde_json::Value>,
    /// Reference tokens in first-occurrence order.
    pub references: Vec<RawReference>,
}

impl Document {
    pub(crate) fn new(id: DocId, title: String, body: String) -> Document {
        Document {
            id,
            title,
            title_source: TitleSource::default(),
            aliases: Vec::new(),
            tags: BTreeSet::new(),
            created: None,
            updated: None,
            draft: false,
            body,
            body_line_offset: 0,
            extra: BTreeMap::new(),
            references: Vec::new(),
        }
    }

    pub fn id(&self) -> &DocId {
        &self.id
    }

    pub fn document_references(&self) -> impl Iterator<Item = &RawReference> {
        self.references
            .iter()
            .filter(|reference| reference.kind == ReferenceKind::Document)
    }

    pub fn tag_references(&self) -> impl Iterator<Item = &RawReference> {
        self.references
            .iter()
            .filter(|reference| reference.kind == ReferenceKind::Tag)
    }
}

/// Outcome of resolving a single document reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "target", rename_all = "snake_case")]
pub enum Resolution {
    Resolved(DocId),
    /// The reference names its own document and self links are disabled.
    SelfSuppressed(DocId),
    Unresolved,
}

impl Resolution {
    pub fn target(&self) -> Option<&DocId> {
        match self {
            Resolution::Resolved(id) | Resolution::SelfSuppressed(id) => Some(id),
            Resolution::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }
}

/// A document reference after resolution against the alias index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub source: DocId,
    pub raw: String,
    pub target_text: String,
    pub fragment: Option<String>,
    pub display: Option<String>,
    pub location: (usize, usize),
    pub resolution: Resolution,
}

impl Reference {
    pub fn from_raw(source: &DocId, raw: &RawReference, resolution: Resolution) -> Reference {
        Reference {
            source: source.clone(),
            raw: raw.raw.clone(),
            target_text: raw.target.clone(),
            fragment: raw.fragment.clone(),
            display: raw.display.clone(),
            location: raw.location,
            resolution,
        }
    }
}
