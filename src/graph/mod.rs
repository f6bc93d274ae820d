//! The resolved content graph.
//!
//! A [`Graph`] is the final artifact of a build: document nodes tagged with their publication
//! state, the forward edge arena, backlinks derived from it, tag groups, every resolved reference
//! in first-occurrence order, and placeholders for targets that matched nothing.
//!
//! Backlinks are never stored independently of the edges: [`Backlinks::derive`] is their only
//! constructor, so "A links to B" and "B lists A as a backlink" cannot disagree.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::{
    error::NotegraphError,
    properties::{DocId, Document, NodeState, Reference, Timestamp},
};

pub mod alias;
pub mod builder;
pub mod draft;
pub mod tags;
pub mod traverse;

pub use alias::AliasIndex;
pub use builder::GraphBuilder;
pub use draft::DraftFilter;
pub use tags::TagIndex;

/// A document node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub id: DocId,
    pub title: String,
    pub state: NodeState,
    /// The draft flag as declared in the document header.
    pub draft: bool,
    pub aliases: Vec<String>,
    pub tags: BTreeSet<String>,
    pub created: Option<Timestamp>,
    pub updated: Option<Timestamp>,
    pub extra: BTreeMap<String, serde_json::Value>,
    pub body: String,
}

impl From<&Document> for Node {
    fn from(document: &Document) -> Self {
        Node {
            id: document.id().clone(),
            title: document.title.clone(),
            state: NodeState::Published,
            draft: document.draft,
            aliases: document.aliases.clone(),
            tags: document.tags.clone(),
            created: document.created,
            updated: document.updated,
            extra: document.extra.clone(),
            body: document.body.clone(),
        }
    }
}

/// A directed link between two documents. Repeated references collapse into one edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub source: DocId,
    pub target: DocId,
    /// Number of raw references this edge stands for.
    pub multiplicity: usize,
    /// Publication state of the target. Only the draft filter changes it.
    pub target_state: NodeState,
    /// Whether an emitter may render this edge as a navigable link.
    pub navigable: bool,
}

impl Edge {
    pub fn is_unpublished(&self) -> bool {
        self.target_state == NodeState::Draft
    }
}

/// Reverse lookup over the edge arena: target → sources, sorted by canonical path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Backlinks(BTreeMap<DocId, BTreeSet<DocId>>);

impl Backlinks {
    /// Derive backlinks from the forward edges in one pass.
    pub fn derive(edges: &[Edge]) -> Backlinks {
        let mut reverse: BTreeMap<DocId, BTreeSet<DocId>> = BTreeMap::new();
        for edge in edges {
            reverse
                .entry(edge.target.clone())
                .or_default()
                .insert(edge.source.clone());
        }
        Backlinks(reverse)
    }

    /// Documents linking to `target`, sorted by canonical path.
    pub fn get(&self, target: &DocId) -> impl Iterator<Item = &DocId> {
        self.0.get(target).into_iter().flatten()
    }

    pub fn contains(&self, target: &DocId, source: &DocId) -> bool {
        self.0
            .get(target)
            .map(|sources| sources.contains(source))
            .unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DocId, &BTreeSet<DocId>)> {
        self.0.iter()
    }
}

/// A reference target that matched no document. Never an edge target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Placeholder {
    /// Target spellings as written
    pub tokens: BTreeSet<String>,
    pub referenced_by: BTreeSet<DocId>,
}

impl Placeholder {
    pub fn state(&self) -> NodeState {
        NodeState::Placeholder
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Graph {
    nodes: BTreeMap<DocId, Node>,
    edges: Vec<Edge>,
    backlinks: Backlinks,
    references: BTreeMap<DocId, Vec<Reference>>,
    /// Keyed by normalized token
    placeholders: BTreeMap<String, Placeholder>,
    tags: TagIndex,
}

impl Graph {
    pub(crate) fn new(
        nodes: BTreeMap<DocId, Node>,
        edges: Vec<Edge>,
        references: BTreeMap<DocId, Vec<Reference>>,
        placeholders: BTreeMap<String, Placeholder>,
    ) -> Graph {
        let backlinks = Backlinks::derive(&edges);
        Graph {
            nodes,
            edges,
            backlinks,
            references,
            placeholders,
            tags: TagIndex::default(),
        }
    }

    pub fn node(&self, id: &DocId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn published(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values().filter(|node| node.state.is_published())
    }

    pub fn drafts(&self) -> impl Iterator<Item = &Node> {
        self.nodes
            .values()
            .filter(|node| node.state == NodeState::Draft)
    }

    /// Forward edges sorted by (source, target).
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge(&self, source: &DocId, target: &DocId) -> Option<&Edge> {
        self.edges
            .binary_search_by(|edge| (&edge.source, &edge.target).cmp(&(source, target)))
            .ok()
            .map(|idx| &self.edges[idx])
    }

    pub fn outgoing(&self, source: &DocId) -> impl Iterator<Item = &Edge> {
        let start = self.edges.partition_point(|edge| &edge.source < source);
        let source = source.clone();
        self.edges[start..]
            .iter()
            .take_while(move |edge| edge.source == source)
    }

    pub fn backlinks(&self) -> &Backlinks {
        &self.backlinks
    }

    pub fn backlinks_of(&self, target: &DocId) -> impl Iterator<Item = &DocId> {
        self.backlinks.get(target)
    }

    /// Resolved references of `source` in first-occurrence order, duplicates included.
    pub fn references(&self, source: &DocId) -> &[Reference] {
        self.references
            .get(source)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn placeholders(&self) -> &BTreeMap<String, Placeholder> {
        &self.placeholders
    }

    pub fn tags(&self) -> &TagIndex {
        &self.tags
    }

    pub(crate) fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.values_mut()
    }

    pub(crate) fn edges_mut(&mut self) -> &mut [Edge] {
        &mut self.edges
    }

    pub(crate) fn set_tags(&mut self, tags: TagIndex) {
        self.tags = tags;
    }

    /// Deterministic JSON snapshot of the whole graph.
    pub fn to_json(&self) -> Result<String, NotegraphError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
