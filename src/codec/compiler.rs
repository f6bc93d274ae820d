//! Build orchestration.
//!
//! A build runs in two passes over a fresh snapshot of the input:
//!
//! 1. Every document is loaded and scanned independently (fanned out over rayon), then the
//!    results are fanned back in and ordered by canonical path.
//! 2. With the complete document set in hand, the [`AliasIndex`] is built and the
//!    [`GraphBuilder`] resolves every reference against it. Resolution needs the complete index
//!    because a document may link to one that loads after it.
//!
//! The draft filter and tag index run last. Nothing recoverable fails a build: the result is
//! always a graph plus an ordered [`Diagnostics`] list.

use rayon::prelude::*;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

use crate::{
    codec::{
        diagnostic::{Diagnostic, Diagnostics},
        extract::ScanOptions,
        loader::load_and_scan,
    },
    config::BuildConfig,
    error::NotegraphError,
    event::BuildEvent,
    graph::{AliasIndex, DraftFilter, Graph, GraphBuilder, TagIndex},
    properties::Document,
    source::{fingerprint, DocumentSource, SourceItem},
};

/// The result of one build.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildOutput {
    pub graph: Graph,
    /// Load problems first, then alias conflicts, then unresolved references; each group in
    /// canonical path order.
    pub diagnostics: Diagnostics,
    /// See [crate::source::fingerprint]
    pub fingerprint: String,
}

pub struct GraphCompiler {
    config: BuildConfig,
    tx: Option<UnboundedSender<BuildEvent>>,
}

impl GraphCompiler {
    /// Create a compiler.
    ///
    /// # Arguments
    /// * `config` - Build options
    /// * `tx` - Optional channel sender for [`BuildEvent`]s (if None, events are not transmitted)
    pub fn new(config: BuildConfig, tx: Option<UnboundedSender<BuildEvent>>) -> Self {
        GraphCompiler { config, tx }
    }

    /// A compiler with default options and no event listener.
    pub fn simple() -> Self {
        GraphCompiler::new(BuildConfig::default(), None)
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Enumerate `source` and build. Fails only when the source itself is unavailable.
    pub fn build<S: DocumentSource + ?Sized>(
        &self,
        source: &S,
    ) -> Result<BuildOutput, NotegraphError> {
        let items = source.enumerate()?;
        self.send(BuildEvent::SourceEnumerated(items.len()));
        Ok(self.build_items(items))
    }

    /// Convenience for in-memory corpora.
    pub fn build_from_pairs<P: AsRef<str>, T: AsRef<str>>(&self, pairs: &[(P, T)]) -> BuildOutput {
        self.build_items(
            pairs
                .iter()
                .map(|(path, text)| SourceItem::document(path.as_ref(), text.as_ref()))
                .collect(),
        )
    }

    #[tracing::instrument(skip_all, fields(items = items.len()))]
    pub fn build_items(&self, mut items: Vec<SourceItem>) -> BuildOutput {
        let fingerprint = fingerprint(&items);
        items.sort_by(|a, b| a.path().cmp(b.path()));

        let mut diagnostics = Diagnostics::default();
        let documents = self.load_all(&items, &mut diagnostics);

        let (index, conflicts) =
            AliasIndex::build(documents.iter(), self.config.extensions.clone());
        diagnostics.extend(conflicts.into_iter().map(Diagnostic::AliasConflict));

        let (mut graph, unresolved) = GraphBuilder::new(&index)
            .with_self_links(self.config.self_links)
            .build(&documents);
        diagnostics.extend(unresolved.into_iter().map(Diagnostic::UnresolvedReference));

        DraftFilter::new(self.config.include_drafts).apply(&mut graph);
        let tags = TagIndex::build(graph.nodes());
        graph.set_tags(tags);

        for diagnostic in diagnostics.iter() {
            self.send(BuildEvent::Diagnostic(diagnostic.clone()));
        }
        self.send(BuildEvent::BuildComplete {
            nodes: graph.node_count(),
            edges: graph.edges().len(),
            diagnostics: diagnostics.len(),
        });
        tracing::info!(
            "Build complete: {} nodes, {} edges, {} diagnostics",
            graph.node_count(),
            graph.edges().len(),
            diagnostics.len()
        );

        BuildOutput {
            graph,
            diagnostics,
            fingerprint,
        }
    }

    /// Pass one. Returns documents sorted by canonical path with duplicates removed.
    fn load_all(&self, items: &[SourceItem], diagnostics: &mut Diagnostics) -> Vec<Document> {
        let options = ScanOptions::from(&self.config);
        let load = |item: &SourceItem| -> Result<Document, Diagnostic> {
            match item {
                SourceItem::Document(doc) => load_and_scan(&doc.path, &doc.text, &options)
                    .map_err(|e| Diagnostic::malformed_metadata(doc.path.clone(), e.to_string())),
                SourceItem::Unreadable { path, message } => {
                    Err(Diagnostic::unreadable(path.clone(), message.clone()))
                }
            }
        };
        let loaded = if self.config.parallel {
            items.par_iter().map(load).collect::<Vec<_>>()
        } else {
            items.iter().map(load).collect::<Vec<_>>()
        };

        let mut documents = Vec::with_capacity(loaded.len());
        for result in loaded {
            match result {
                Ok(document) => documents.push(document),
                Err(diagnostic) => {
                    tracing::warn!("{}", diagnostic);
                    diagnostics.push(diagnostic);
                }
            }
        }

        // Stable, so the first of several inputs canonicalizing to the same path survives.
        documents.sort_by(|a, b| a.id().cmp(b.id()));
        let mut unique: Vec<Document> = Vec::with_capacity(documents.len());
        for document in documents {
            if unique.last().map(|last| last.id() == document.id()) == Some(true) {
                tracing::warn!("Duplicate document path {}, dropping", document.id());
                diagnostics.push(Diagnostic::DuplicateDocument {
                    path: document.id().clone(),
                });
                continue;
            }
            self.send(BuildEvent::DocumentLoaded(document.id().clone()));
            unique.push(document);
        }
        unique
    }

    fn send(&self, event: BuildEvent) {
        if let Some(tx) = &self.tx {
            if let Err(e) = tx.send(event) {
                tracing::warn!("{}", NotegraphError::from(e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::DocId;
    use test_log::test;

    #[test]
    fn test_load_failures_do_not_stop_the_build() {
        let output = GraphCompiler::simple().build_items(vec![
            SourceItem::document("a.md", "[[b]] [[c]]"),
            SourceItem::document("b.md", "---\ntags: 7\n---\n"),
            SourceItem::Unreadable {
                path: "c.md".to_string(),
                message: "denied".to_string(),
            },
        ]);
        assert_eq!(output.graph.node_count(), 1);
        let kinds = output
            .diagnostics
            .iter()
            .map(|d| match d {
                Diagnostic::MalformedMetadata { .. } => "malformed",
                Diagnostic::UnreadableDocument { .. } => "unreadable",
                Diagnostic::UnresolvedReference(_) => "unresolved",
                _ => "other",
            })
            .collect::<Vec<_>>();
        assert_eq!(kinds, vec!["malformed", "unreadable", "unresolved", "unresolved"]);
        assert!(output.diagnostics.has_errors());
    }

    #[test]
    fn test_duplicate_canonical_path() {
        let output = GraphCompiler::simple()
            .build_from_pairs(&[("./a.md", "first"), ("a.md", "second")]);
        assert_eq!(output.graph.node_count(), 1);
        // "./a.md" sorts before "a.md" and is kept.
        assert_eq!(output.graph.node(&DocId::new("a.md")).unwrap().body, "first");
        assert!(matches!(
            output.diagnostics[0],
            Diagnostic::DuplicateDocument { .. }
        ));
    }

    #[test]
    fn test_events_sent_in_order() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let compiler = GraphCompiler::new(BuildConfig::default(), Some(tx));
        compiler.build_from_pairs(&[("b.md", "[[x]]"), ("a.md", "")]);
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert_eq!(
            events,
            vec![
                BuildEvent::DocumentLoaded(DocId::new("a.md")),
                BuildEvent::DocumentLoaded(DocId::new("b.md")),
                events[2].clone(),
                BuildEvent::BuildComplete {
                    nodes: 2,
                    edges: 0,
                    diagnostics: 1
                },
            ]
        );
        assert!(matches!(events[2], BuildEvent::Diagnostic(_)));
    }

    #[test]
    fn test_closed_channel_is_not_fatal() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        drop(rx);
        let output = GraphCompiler::new(BuildConfig::default(), Some(tx))
            .build_from_pairs(&[("a.md", "")]);
        assert_eq!(output.graph.node_count(), 1);
    }
}
