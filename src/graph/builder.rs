use std::collections::BTreeMap;

use crate::{
    codec::diagnostic::UnresolvedReference,
    graph::{alias::AliasIndex, Edge, Graph, Node, Placeholder},
    nodekey::normalize_key,
    properties::{DocId, Document, NodeState, Reference, Resolution},
};

/// Resolves every document reference against a complete [`AliasIndex`] and accumulates the
/// forward edge arena.
///
/// Resolution is the second pass of a build: the index must already hold every document, since
/// any document may be the forward target of any other. References that resolve to nothing are
/// kept in the graph as inert references and reported; they never fail the build.
pub struct GraphBuilder<'a> {
    index: &'a AliasIndex,
    self_links: bool,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(index: &'a AliasIndex) -> Self {
        GraphBuilder {
            index,
            self_links: true,
        }
    }

    /// Whether a reference from a document to itself becomes an edge.
    pub fn with_self_links(mut self, self_links: bool) -> Self {
        self.self_links = self_links;
        self
    }

    #[tracing::instrument(skip_all)]
    pub fn build(&self, documents: &[Document]) -> (Graph, Vec<UnresolvedReference>) {
        let mut ordered = documents.iter().collect::<Vec<&Document>>();
        ordered.sort_by(|a, b| a.id().cmp(b.id()));

        let nodes = ordered
            .iter()
            .map(|document| (document.id().clone(), Node::from(*document)))
            .collect::<BTreeMap<DocId, Node>>();

        let mut edges = Vec::new();
        let mut references = BTreeMap::new();
        let mut placeholders: BTreeMap<String, Placeholder> = BTreeMap::new();
        let mut unresolved = Vec::new();

        for document in ordered {
            let source = document.id();
            // Sorted by target so the arena stays ordered by (source, target).
            let mut targets: BTreeMap<DocId, usize> = BTreeMap::new();
            let mut resolved_refs = Vec::new();

            for raw in document.document_references() {
                let resolution = match self
                    .index
                    .resolve(&raw.target)
                    .filter(|target| nodes.contains_key(*target))
                {
                    Some(target) if target == source && !self.self_links => {
                        Resolution::SelfSuppressed(target.clone())
                    }
                    Some(target) => {
                        *targets.entry(target.clone()).or_insert(0) += 1;
                        Resolution::Resolved(target.clone())
                    }
                    None => {
                        tracing::debug!(
                            "[GraphBuilder] {} at {:?}: no document matches '{}'",
                            source,
                            raw.location,
                            raw.target
                        );
                        let placeholder = placeholders
                            .entry(normalize_key(&raw.target))
                            .or_default();
                        placeholder.tokens.insert(raw.target.clone());
                        placeholder.referenced_by.insert(source.clone());
                        unresolved.push(UnresolvedReference {
                            source: source.clone(),
                            token: raw.target.clone(),
                            raw: raw.raw.clone(),
                            location: raw.location,
                        });
                        Resolution::Unresolved
                    }
                };
                resolved_refs.push(Reference::from_raw(source, raw, resolution));
            }

            edges.extend(targets.into_iter().map(|(target, multiplicity)| Edge {
                source: source.clone(),
                target,
                multiplicity,
                target_state: NodeState::Published,
                navigable: true,
            }));
            references.insert(source.clone(), resolved_refs);
        }

        tracing::info!(
            "[GraphBuilder] {} nodes, {} edges, {} unresolved references",
            nodes.len(),
            edges.len(),
            unresolved.len()
        );
        (Graph::new(nodes, edges, references, placeholders), unresolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{extract::ScanOptions, loader::load_and_scan};
    use test_log::test;

    fn docs(pairs: &[(&str, &str)]) -> Vec<Document> {
        pairs
            .iter()
            .map(|(path, text)| load_and_scan(path, text, &ScanOptions::default()).unwrap())
            .collect()
    }

    fn index(documents: &[Document]) -> AliasIndex {
        AliasIndex::build(documents.iter(), vec!["md".to_string()]).0
    }

    #[test]
    fn test_forward_reference_resolves() {
        // a.md is processed before z.md but links to it.
        let documents = docs(&[("a.md", "see [[z]]"), ("z.md", "---\naliases: [Zed]\n---\nend")]);
        let index = index(&documents);
        let (graph, unresolved) = GraphBuilder::new(&index).build(&documents);
        assert!(unresolved.is_empty());
        let a = DocId::new("a.md");
        let z = DocId::new("z.md");
        assert!(graph.edge(&a, &z).is_some());
        assert!(graph.backlinks().contains(&z, &a));
    }

    #[test]
    fn test_multiplicity_and_reference_order() {
        let documents = docs(&[
            ("a.md", "[[b]] [[c]] [[B]] [[missing]] [[b|again]]"),
            ("b.md", ""),
            ("c.md", ""),
        ]);
        let index = index(&documents);
        let (graph, unresolved) = GraphBuilder::new(&index).build(&documents);
        let a = DocId::new("a.md");
        let b = DocId::new("b.md");

        assert_eq!(graph.edge(&a, &b).unwrap().multiplicity, 3);
        assert_eq!(graph.edges().len(), 2);
        let targets = graph
            .references(&a)
            .iter()
            .map(|r| r.target_text.as_str())
            .collect::<Vec<_>>();
        assert_eq!(targets, vec!["b", "c", "B", "missing", "b"]);
        assert_eq!(unresolved.len(), 1);
        assert_eq!(unresolved[0].token, "missing");
        assert!(graph.placeholders().contains_key("missing"));
    }

    #[test]
    fn test_self_links() {
        let documents = docs(&[("a.md", "I am [[a]]")]);
        let index = index(&documents);
        let a = DocId::new("a.md");

        let (graph, _) = GraphBuilder::new(&index).build(&documents);
        assert!(graph.edge(&a, &a).is_some());
        assert_eq!(graph.backlinks_of(&a).collect::<Vec<_>>(), vec![&a]);

        let (graph, unresolved) = GraphBuilder::new(&index)
            .with_self_links(false)
            .build(&documents);
        assert!(graph.edges().is_empty());
        assert!(unresolved.is_empty());
        assert_eq!(
            graph.references(&a)[0].resolution,
            Resolution::SelfSuppressed(a.clone())
        );
    }

    #[test]
    fn test_edges_sorted_regardless_of_input_order() {
        let documents = docs(&[("c.md", "[[a]]"), ("b.md", "[[c]] [[a]]"), ("a.md", "[[c]]")]);
        let index = index(&documents);
        let (graph, _) = GraphBuilder::new(&index).build(&documents);
        let pairs = graph
            .edges()
            .iter()
            .map(|e| (e.source.as_str(), e.target.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(
            pairs,
            vec![("a.md", "c.md"), ("b.md", "a.md"), ("b.md", "c.md"), ("c.md", "a.md")]
        );
    }
}
