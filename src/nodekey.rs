/// [crate::nodekey] contains NodeKey and the normalization rules used to match reference tokens
/// against the names a [crate::properties::Document] can be reached by.
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use unicode_normalization::UnicodeNormalization;

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is a valid regex"));

/// Normalize a lookup string: Unicode NFC, trimmed, internal whitespace runs collapsed to one
/// space, lower-cased.
pub fn normalize_key(raw: &str) -> String {
    let composed = raw.nfc().collect::<String>();
    WHITESPACE_RUN
        .replace_all(composed.trim(), " ")
        .to_lowercase()
}

/// Normalize a tag: leading `#` characters removed, trimmed, lower-cased.
pub fn normalize_tag(raw: &str) -> String {
    raw.trim().trim_start_matches('#').trim().nfc().collect::<String>().to_lowercase()
}

/// A name under which a document registers in the alias index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialOrd, Ord, PartialEq, Eq, Hash)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum NodeKey {
    /// The canonical path, or the canonical path with its document extension removed.
    Path(String),
    /// The resolved document title.
    Title(String),
    /// An alias declared in the metadata header.
    Alias(String),
}

impl NodeKey {
    pub fn raw(&self) -> &str {
        match self {
            NodeKey::Path(raw) | NodeKey::Title(raw) | NodeKey::Alias(raw) => raw,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            NodeKey::Path(_) => "path",
            NodeKey::Title(_) => "title",
            NodeKey::Alias(_) => "alias",
        }
    }

    /// The normalized lookup form of this key.
    pub fn normalized(&self) -> String {
        normalize_key(self.raw())
    }
}

impl Display for NodeKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind(), self.raw())
    }
}
