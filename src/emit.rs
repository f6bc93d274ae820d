//! The boundary between a build and whatever renders it.
//!
//! The core never produces output formats itself. It hands a finished [`BuildOutput`] to an
//! [`Emitter`], and computes [`PageContext`] values so every renderer agrees on which links are
//! navigable, which point at unpublished content, and which resolve to nothing.

use serde::Serialize;
use std::{
    collections::{BTreeMap, BTreeSet},
    io::Write,
};

use crate::{
    codec::compiler::BuildOutput,
    error::NotegraphError,
    graph::Graph,
    paths::to_anchor,
    properties::{DocId, NodeState, Resolution, Timestamp},
};

/// Consumes a finished build. Implemented by renderers outside this crate.
pub trait Emitter {
    fn emit(&mut self, output: &BuildOutput) -> Result<(), NotegraphError>;
}

/// How one link occurrence should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    Navigable,
    /// The target is a draft: render the text without a link.
    Unpublished,
    /// The target matched no document.
    Unresolved,
    /// A self link dropped by configuration.
    SelfSuppressed,
}

/// A single reference occurrence, in body order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedLink {
    pub raw: String,
    /// Display text, falling back to the target as written.
    pub text: String,
    pub target: Option<DocId>,
    /// Heading fragment converted to an anchor id.
    pub fragment: Option<String>,
    pub status: LinkStatus,
    pub location: (usize, usize),
}

impl RenderedLink {
    pub fn is_navigable(&self) -> bool {
        self.status == LinkStatus::Navigable
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BacklinkEntry {
    pub source: DocId,
    pub title: String,
    /// False when the linking document is itself a draft.
    pub navigable: bool,
}

/// Everything a renderer needs for one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageContext {
    pub id: DocId,
    pub title: String,
    pub state: NodeState,
    pub tags: BTreeSet<String>,
    pub aliases: Vec<String>,
    pub created: Option<Timestamp>,
    pub updated: Option<Timestamp>,
    pub extra: BTreeMap<String, serde_json::Value>,
    pub body: String,
    pub links: Vec<RenderedLink>,
    pub backlinks: Vec<BacklinkEntry>,
}

impl Graph {
    pub fn page_context(&self, id: &DocId) -> Option<PageContext> {
        let node = self.node(id)?;
        let links = self
            .references(id)
            .iter()
            .map(|reference| {
                let status = match &reference.resolution {
                    Resolution::Resolved(target) => match self.edge(id, target) {
                        Some(edge) if edge.navigable => LinkStatus::Navigable,
                        _ => LinkStatus::Unpublished,
                    },
                    Resolution::SelfSuppressed(_) => LinkStatus::SelfSuppressed,
                    Resolution::Unresolved => LinkStatus::Unresolved,
                };
                RenderedLink {
                    raw: reference.raw.clone(),
                    text: reference
                        .display
                        .clone()
                        .unwrap_or_else(|| reference.target_text.clone()),
                    target: reference.resolution.target().cloned(),
                    fragment: reference.fragment.as_deref().map(to_anchor),
                    status,
                    location: reference.location,
                }
            })
            .collect();

        let backlinks = self
            .backlinks_of(id)
            .filter_map(|source| self.node(source))
            .map(|source| BacklinkEntry {
                source: source.id.clone(),
                title: source.title.clone(),
                navigable: source.state.is_published(),
            })
            .collect();

        Some(PageContext {
            id: node.id.clone(),
            title: node.title.clone(),
            state: node.state,
            tags: node.tags.clone(),
            aliases: node.aliases.clone(),
            created: node.created,
            updated: node.updated,
            extra: node.extra.clone(),
            body: node.body.clone(),
            links,
            backlinks,
        })
    }

    /// Page contexts of every node, drafts included, in canonical path order.
    pub fn page_contexts(&self) -> Vec<PageContext> {
        self.nodes()
            .filter_map(|node| self.page_context(&node.id))
            .collect()
    }
}

/// Writes the build as one JSON document: page contexts, tag groups and diagnostics.
pub struct JsonEmitter<W: Write> {
    writer: W,
}

#[derive(Serialize)]
struct JsonSnapshot<'a> {
    fingerprint: &'a str,
    pages: Vec<PageContext>,
    tags: &'a crate::graph::TagIndex,
    diagnostics: &'a crate::codec::Diagnostics,
}

impl<W: Write> JsonEmitter<W> {
    pub fn new(writer: W) -> Self {
        JsonEmitter { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Emitter for JsonEmitter<W> {
    fn emit(&mut self, output: &BuildOutput) -> Result<(), NotegraphError> {
        let snapshot = JsonSnapshot {
            fingerprint: &output.fingerprint,
            pages: output.graph.page_contexts(),
            tags: output.graph.tags(),
            diagnostics: &output.diagnostics,
        };
        serde_json::to_writer_pretty(&mut self.writer, &snapshot)?;
        self.writer
            .flush()
            .map_err(|e| NotegraphError::Emit(format!("flush failed: {e}")))?;
        tracing::debug!("[JsonEmitter] wrote {} pages", snapshot.pages.len());
        Ok(())
    }
}
