use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::{codec::diagnostic::Diagnostic, properties::DocId};

/// Progress notifications a build sends to an optional listener.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BuildEvent {
    /// Source enumeration finished with this many items.
    SourceEnumerated(usize),
    /// A document was loaded and scanned.
    DocumentLoaded(DocId),
    /// A recoverable problem was recorded.
    Diagnostic(Diagnostic),
    /// Nodes, edges, diagnostics count.
    BuildComplete {
        nodes: usize,
        edges: usize,
        diagnostics: usize,
    },
}

impl Display for BuildEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildEvent::SourceEnumerated(count) => write!(f, "Enumerated {count} source items"),
            BuildEvent::DocumentLoaded(id) => write!(f, "Loaded {id}"),
            BuildEvent::Diagnostic(diagnostic) => write!(f, "{diagnostic}"),
            BuildEvent::BuildComplete {
                nodes,
                edges,
                diagnostics,
            } => write!(
                f,
                "Build complete: {nodes} nodes, {edges} edges, {diagnostics} diagnostics"
            ),
        }
    }
}
