use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::{graph::Node, properties::DocId};

/// Groups published documents by normalized tag.
///
/// Every tag any node carries gets a group, so a tag used only by drafts maps to an empty set
/// instead of disappearing. Draft nodes are never members.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TagIndex(BTreeMap<String, BTreeSet<DocId>>);

impl TagIndex {
    /// Build the index over nodes whose publication state is already final.
    pub fn build<'a>(nodes: impl IntoIterator<Item = &'a Node>) -> TagIndex {
        let mut groups: BTreeMap<String, BTreeSet<DocId>> = BTreeMap::new();
        for node in nodes {
            for tag in node.tags.iter() {
                let group = groups.entry(tag.clone()).or_default();
                if node.state.is_published() {
                    group.insert(node.id.clone());
                }
            }
        }
        tracing::debug!("[TagIndex] {} tag groups", groups.len());
        TagIndex(groups)
    }

    /// Members of `tag`, sorted by canonical path. `tag` must already be normalized.
    pub fn get(&self, tag: &str) -> Option<&BTreeSet<DocId>> {
        self.0.get(tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeSet<DocId>)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Tags whose group contains `id`.
    pub fn groups_of<'a>(&'a self, id: &'a DocId) -> impl Iterator<Item = &'a String> + 'a {
        self.0
            .iter()
            .filter(move |(_, members)| members.contains(id))
            .map(|(tag, _)| tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::NodeState;
    use test_log::test;

    fn node(id: &str, state: NodeState, tags: &[&str]) -> Node {
        Node {
            id: DocId::new(id),
            title: id.to_string(),
            state,
            draft: state == NodeState::Draft,
            aliases: vec![],
            tags: tags.iter().map(|t| t.to_string()).collect(),
            created: None,
            updated: None,
            extra: BTreeMap::new(),
            body: String::new(),
        }
    }

    #[test]
    fn test_drafts_excluded_but_tag_kept() {
        let nodes = vec![
            node("b.md", NodeState::Published, &["rust", "notes"]),
            node("a.md", NodeState::Published, &["rust"]),
            node("d.md", NodeState::Draft, &["rust", "secret"]),
        ];
        let index = TagIndex::build(&nodes);

        let rust = index.get("rust").unwrap().iter().map(DocId::as_str).collect::<Vec<_>>();
        assert_eq!(rust, vec!["a.md", "b.md"]);
        assert!(index.get("secret").unwrap().is_empty());
        assert_eq!(index.tags().collect::<Vec<_>>(), vec!["notes", "rust", "secret"]);

        let b = DocId::new("b.md");
        assert_eq!(index.groups_of(&b).collect::<Vec<_>>(), vec!["notes", "rust"]);
        let d = DocId::new("d.md");
        assert_eq!(index.groups_of(&d).count(), 0);
    }
}
