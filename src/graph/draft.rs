use crate::{graph::Graph, properties::NodeState};

/// Partitions the graph into published and draft nodes.
///
/// Drafts stay in the graph as nodes and keep their outgoing edges. Every edge pointing into a
/// draft is marked unpublished and non-navigable; no edge is ever removed.
#[derive(Debug, Clone, Copy, Default)]
pub struct DraftFilter {
    include_drafts: bool,
}

impl DraftFilter {
    /// With `include_drafts` set, drafts are treated as published (preview builds).
    pub fn new(include_drafts: bool) -> Self {
        DraftFilter { include_drafts }
    }

    /// Returns the number of edges marked unpublished.
    #[tracing::instrument(skip_all)]
    pub fn apply(&self, graph: &mut Graph) -> usize {
        for node in graph.nodes_mut() {
            node.state = if node.draft && !self.include_drafts {
                NodeState::Draft
            } else {
                NodeState::Published
            };
        }

        let states = graph
            .nodes()
            .map(|node| (node.id.clone(), node.state))
            .collect::<std::collections::BTreeMap<_, _>>();

        let mut unpublished = 0;
        for edge in graph.edges_mut() {
            edge.target_state = states
                .get(&edge.target)
                .copied()
                .unwrap_or(NodeState::Placeholder);
            edge.navigable = edge.target_state.is_published();
            if !edge.navigable {
                unpublished += 1;
            }
        }
        tracing::debug!("[DraftFilter] {} edges point into unpublished content", unpublished);
        unpublished
    }
}
