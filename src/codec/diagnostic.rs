//! Diagnostic types for document loading and reference resolution.
//!
//! Every recoverable problem found during a build is recorded as a [`Diagnostic`] rather than
//! raised, so a caller can report all problems from one run instead of stopping at the first.

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter},
    ops::Deref,
};

use crate::{nodekey::NodeKey, properties::DocId};

/// A document reference that matched no known path, title, or alias.
///
/// The reference is kept in the graph as present-but-inert; the build continues.
///
/// # Examples
///
/// ```
/// # use notegraph::{codec::UnresolvedReference, properties::DocId};
/// // Document a.md links to a note that does not exist yet:
/// let unresolved = UnresolvedReference {
///     source: DocId::new("a.md"),
///     token: "missing".to_string(),
///     raw: "[[missing]]".to_string(),
///     location: (3, 5),
/// };
/// assert_eq!(unresolved.token, "missing");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedReference {
    /// The document containing the reference
    pub source: DocId,
    /// The target text as written, without delimiters, fragment, or display text
    pub token: String,
    /// The full token as written
    pub raw: String,
    /// Location in the source file (line, column)
    pub location: (usize, usize),
}

/// Two documents registered the same lookup key. The first registration keeps it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasConflict {
    /// The key as declared by the dropped document
    pub key: NodeKey,
    /// Normalized form both documents collided on
    pub normalized: String,
    /// Document holding the index slot
    pub kept: DocId,
    /// Document whose key was dropped
    pub dropped: DocId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// The affected document was left out of the graph.
    Error,
    /// The graph is complete but something may not render as the author intended.
    Warning,
}

/// Diagnostic information produced during a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Diagnostic {
    /// The metadata header of a document could not be interpreted; the document is dropped.
    MalformedMetadata { path: String, message: String },

    /// The document source could not read one item; the document is dropped.
    UnreadableDocument { path: String, message: String },

    /// A second document normalized to an already loaded canonical path; it is dropped.
    DuplicateDocument { path: DocId },

    /// A lookup key was declared by more than one document.
    AliasConflict(AliasConflict),

    /// A document reference could not be resolved.
    UnresolvedReference(UnresolvedReference),
}

impl Diagnostic {
    pub fn malformed_metadata(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedMetadata {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn unreadable(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnreadableDocument {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::MalformedMetadata { .. }
            | Self::UnreadableDocument { .. }
            | Self::DuplicateDocument { .. } => Severity::Error,
            Self::AliasConflict(_) | Self::UnresolvedReference(_) => Severity::Warning,
        }
    }

    /// The path of the document this diagnostic is about.
    pub fn path(&self) -> &str {
        match self {
            Self::MalformedMetadata { path, .. } | Self::UnreadableDocument { path, .. } => path,
            Self::DuplicateDocument { path } => path.as_str(),
            Self::AliasConflict(conflict) => conflict.dropped.as_str(),
            Self::UnresolvedReference(unresolved) => unresolved.source.as_str(),
        }
    }

    pub fn is_unresolved_reference(&self) -> bool {
        matches!(self, Self::UnresolvedReference(_))
    }

    pub fn as_unresolved_reference(&self) -> Option<&UnresolvedReference> {
        match self {
            Self::UnresolvedReference(unresolved) => Some(unresolved),
            _ => None,
        }
    }

    pub fn as_alias_conflict(&self) -> Option<&AliasConflict> {
        match self {
            Self::AliasConflict(conflict) => Some(conflict),
            _ => None,
        }
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedMetadata { path, message } => {
                write!(f, "Malformed metadata in {path}: {message}")
            }
            Self::UnreadableDocument { path, message } => {
                write!(f, "Could not read {path}: {message}")
            }
            Self::DuplicateDocument { path } => {
                write!(f, "Duplicate document path {path}, later copy dropped")
            }
            Self::AliasConflict(conflict) => write!(
                f,
                "Alias conflict on '{}': {} keeps it, {} ({}) dropped",
                conflict.normalized, conflict.kept, conflict.dropped, conflict.key
            ),
            Self::UnresolvedReference(unresolved) => write!(
                f,
                "Unresolved reference in {} at {}:{}: {}",
                unresolved.source, unresolved.location.0, unresolved.location.1, unresolved.raw
            ),
        }
    }
}

/// The ordered diagnostics list of one build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    pub fn extend<I: IntoIterator<Item = Diagnostic>>(&mut self, diagnostics: I) {
        self.0.extend(diagnostics);
    }

    pub fn has_errors(&self) -> bool {
        self.0.iter().any(|d| d.severity() == Severity::Error)
    }

    pub fn unresolved_references(&self) -> impl Iterator<Item = &UnresolvedReference> {
        self.0.iter().filter_map(Diagnostic::as_unresolved_reference)
    }

    pub fn alias_conflicts(&self) -> impl Iterator<Item = &AliasConflict> {
        self.0.iter().filter_map(Diagnostic::as_alias_conflict)
    }

    pub fn for_path<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.0.iter().filter(move |d| d.path() == path)
    }

    pub fn into_inner(self) -> Vec<Diagnostic> {
        self.0
    }
}

impl Deref for Diagnostics {
    type Target = [Diagnostic];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
