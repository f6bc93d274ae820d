//! The build-scoped alias index.

use serde::Serialize;
use std::collections::{btree_map::Entry, BTreeMap};

use crate::{
    codec::diagnostic::AliasConflict,
    nodekey::{normalize_key, NodeKey},
    paths::strip_extension,
    properties::{DocId, Document, TitleSource},
};

/// Precedence of a registered key. A higher class takes a slot from a lower one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum KeyClass {
    /// A title read from the first heading. Looked up, never reported.
    Heading,
    /// A header title or declared alias.
    Declared,
    Path,
}

#[derive(Debug, Clone, Serialize)]
struct Slot {
    id: DocId,
    key: NodeKey,
    #[serde(skip)]
    class: KeyClass,
}

/// Maps every normalized name a document can be referenced by to exactly one document.
///
/// The index is constructed per build and handed to the
/// [`GraphBuilder`](crate::graph::builder::GraphBuilder); nothing about it outlives the build.
///
/// Keys come in three classes: paths, then declared names (header title and aliases), then
/// heading titles. A path always beats a name, whichever registered first. Within a class the
/// first registration keeps the slot. Every time a declared name or path loses its slot to
/// another document an [`AliasConflict`] is reported; heading titles give way silently. File
/// stems are never keys on their own, only as part of the extensionless path.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AliasIndex {
    entries: BTreeMap<String, Slot>,
    #[serde(skip)]
    extensions: Vec<String>,
}

impl AliasIndex {
    /// `extensions` are the document extensions stripped to form extensionless path keys.
    pub fn new(extensions: Vec<String>) -> Self {
        AliasIndex {
            entries: BTreeMap::new(),
            extensions,
        }
    }

    /// Build an index by registering documents in canonical load order.
    pub fn build<'a, I>(documents: I, extensions: Vec<String>) -> (AliasIndex, Vec<AliasConflict>)
    where
        I: IntoIterator<Item = &'a Document>,
    {
        let mut index = AliasIndex::new(extensions);
        let conflicts = documents
            .into_iter()
            .flat_map(|document| index.register(document))
            .collect::<Vec<_>>();
        tracing::debug!(
            "Alias index built: {} keys, {} conflicts",
            index.len(),
            conflicts.len()
        );
        (index, conflicts)
    }

    /// Register a single document: its canonical path, its extensionless path, its title and each
    /// declared alias. Returns the conflicts this registration caused.
    ///
    /// Registering documents one by one yields the same index as [`AliasIndex::build`] over the
    /// same sequence.
    pub fn register(&mut self, document: &Document) -> Vec<AliasConflict> {
        let id = document.id();
        let mut keys = vec![(NodeKey::Path(id.as_str().to_string()), KeyClass::Path)];
        if let Some(stripped) = strip_extension(id.as_str(), &self.extensions) {
            keys.push((NodeKey::Path(stripped.to_string()), KeyClass::Path));
        }
        match document.title_source {
            TitleSource::Header => {
                keys.push((NodeKey::Title(document.title.clone()), KeyClass::Declared))
            }
            TitleSource::Heading => {
                keys.push((NodeKey::Title(document.title.clone()), KeyClass::Heading))
            }
            TitleSource::FileStem => {}
        }
        keys.extend(
            document
                .aliases
                .iter()
                .map(|alias| (NodeKey::Alias(alias.clone()), KeyClass::Declared)),
        );
        keys.into_iter()
            .filter_map(|(key, class)| self.insert(key, class, id))
            .collect()
    }

    /// Exact lookup of a reference token.
    ///
    /// The token is normalized first. A token carrying a leading `./` or `/`, or ending in a
    /// document extension, also matches the bare form.
    pub fn resolve(&self, token: &str) -> Option<&DocId> {
        let normalized = normalize_key(token);
        let trimmed = normalized.trim_start_matches("./").trim_start_matches('/');
        self.entries
            .get(normalized.as_str())
            .or_else(|| self.entries.get(trimmed))
            .or_else(|| {
                strip_extension(trimmed, &self.extensions)
                    .and_then(|stripped| self.entries.get(stripped))
            })
            .map(|slot| &slot.id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &DocId)> {
        self.entries.iter().map(|(key, slot)| (key, &slot.id))
    }

    fn insert(&mut self, key: NodeKey, class: KeyClass, id: &DocId) -> Option<AliasConflict> {
        let normalized = key.normalized();
        if normalized.is_empty() {
            return None;
        }
        let slot = match self.entries.entry(normalized) {
            Entry::Vacant(vacant) => {
                vacant.insert(Slot {
                    id: id.clone(),
                    key,
                    class,
                });
                return None;
            }
            Entry::Occupied(slot) => slot,
        };
        let normalized = slot.key().clone();
        let held = slot.into_mut();

        // A document reaching the same key twice (title equal to path) is not a conflict.
        if &held.id == id {
            if class > held.class {
                held.key = key;
                held.class = class;
            }
            return None;
        }

        let (kept, dropped, dropped_key, dropped_class) = if class > held.class {
            let evicted = std::mem::replace(
                held,
                Slot {
                    id: id.clone(),
                    key,
                    class,
                },
            );
            (id.clone(), evicted.id, evicted.key, evicted.class)
        } else {
            (held.id.clone(), id.clone(), key, class)
        };
        if dropped_class == KeyClass::Heading {
            return None;
        }
        tracing::warn!(
            "[AliasIndex] '{}' maps to {}, dropping {} from {}",
            normalized,
            kept,
            dropped_key,
            dropped
        );
        Some(AliasConflict {
            key: dropped_key,
            normalized,
            kept,
            dropped,
        })
    }
}
