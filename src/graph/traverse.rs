//! Link traversal queries over a built [`Graph`].

use petgraph::{
    algo::is_cyclic_directed,
    graphmap::GraphMap,
    visit::{depth_first_search, DfsEvent},
    Directed, Direction,
};
use std::collections::BTreeSet;

use crate::{graph::Graph, properties::DocId};

/// Borrowed view of the forward edges, weighted by multiplicity.
pub type LinkSubGraph<'a> = GraphMap<&'a str, usize, Directed>;

impl Graph {
    /// The edge arena as a petgraph graph. Nodes without edges are included.
    ///
    /// With `reverse` set every edge points from target to source.
    pub fn link_subgraph(&self, reverse: bool) -> LinkSubGraph<'_> {
        let mut subgraph = LinkSubGraph::new();
        for node in self.nodes() {
            subgraph.add_node(node.id.as_str());
        }
        for edge in self.edges() {
            let (from, to) = if reverse {
                (edge.target.as_str(), edge.source.as_str())
            } else {
                (edge.source.as_str(), edge.target.as_str())
            };
            subgraph.add_edge(from, to, edge.multiplicity);
        }
        subgraph
    }

    /// Documents reachable from `start` by following links in `direction`.
    ///
    /// `Outgoing` follows links forward; `Incoming` follows backlinks. `start` is part of the
    /// result only when it lies on a cycle.
    pub fn reachable(&self, start: &DocId, direction: Direction) -> BTreeSet<DocId> {
        let subgraph = self.link_subgraph(direction == Direction::Incoming);
        let mut found = BTreeSet::new();
        if subgraph.contains_node(start.as_str()) {
            depth_first_search(
                &subgraph,
                subgraph.neighbors(start.as_str()),
                |event| {
                    if let DfsEvent::Discover(id, _) = event {
                        found.insert(DocId::from(id));
                    }
                },
            );
        }
        found
    }

    /// Whether any chain of links leads back to where it started. Self links count.
    pub fn is_cyclic(&self) -> bool {
        is_cyclic_directed(&self.link_subgraph(false))
    }

    /// Published documents nothing links to.
    pub fn orphans(&self) -> impl Iterator<Item = &DocId> {
        self.published()
            .map(|node| &node.id)
            .filter(|id| self.backlinks_of(id).next().is_none())
    }
}
