//! # notegraph
//!
//! A library for turning a folder of interlinked notes into a resolved content graph.
//!
//! ## Overview
//!
//! notegraph reads Markdown documents with an optional metadata header, finds every
//! `[[wiki link]]` and `#tag` in their bodies, and resolves those references against the paths,
//! titles and aliases of the whole corpus. The result is a [`Graph`](graph::Graph) of document
//! nodes, forward edges, backlinks, tag groups and draft state, plus a list of diagnostics
//! describing everything that could not be resolved. Rendering that graph (HTML, feeds, search
//! indexes) is left to an [`Emitter`](emit::Emitter).
//!
//! ### Key Features
//!
//! - **Two-pass resolution**: every document is loaded before any reference is resolved, so
//!   forward references always work
//! - **Error tolerance**: broken headers, unresolved links and alias collisions become
//!   diagnostics; the build always produces a graph
//! - **Deterministic output**: the same input yields a byte-identical graph, whether documents
//!   are loaded in parallel or not
//! - **Draft awareness**: drafts stay in the graph but every link into them is marked
//!   non-navigable
//!
//! ## Architecture
//!
//! - **[`codec`]**: Document loading, reference extraction, build orchestration (`GraphCompiler`)
//! - **[`graph`]**: Alias index, graph builder, draft filter, tag index, traversal
//! - **[`emit`]**: Emitter trait and per-page rendering context
//! - **[`source`]**: Input enumeration (`MemorySource`, `DirectorySource`)
//! - **[`properties`]**: Document, identifier and reference types
//! - **[`event`]**: Build progress events
//! - **[`config`]**: Build options
//!
//! ## Quick Start
//!
//! ```rust
//! use notegraph::{codec::GraphCompiler, properties::DocId, source::MemorySource};
//!
//! let source = [
//!     ("index.md", "---\ntitle: Home\n---\nStart at [[Getting Started]]."),
//!     ("guide.md", "---\naliases: [Getting Started]\n---\nBack [[home]]. See [[nowhere]]."),
//! ]
//! .into_iter()
//! .collect::<MemorySource>();
//!
//! let output = GraphCompiler::simple().build(&source)?;
//! let index = DocId::new("index.md");
//! let guide = DocId::new("guide.md");
//!
//! assert!(output.graph.edge(&index, &guide).is_some());
//! assert!(output.graph.backlinks().contains(&index, &guide));
//! assert_eq!(output.diagnostics.unresolved_references().count(), 1);
//! # Ok::<(), notegraph::NotegraphError>(())
//! ```
//!
//! ### Working with Diagnostics
//!
//! ```rust
//! use notegraph::codec::{Diagnostic, GraphCompiler};
//!
//! let output = GraphCompiler::simple().build_from_pairs(&[
//!     ("a.md", "---\naliases: [shared]\n---\n[[missing]]"),
//!     ("b.md", "---\naliases: [shared]\n---\n"),
//! ]);
//!
//! for diagnostic in output.diagnostics.iter() {
//!     match diagnostic {
//!         Diagnostic::AliasConflict(conflict) => assert_eq!(conflict.kept.as_str(), "a.md"),
//!         Diagnostic::UnresolvedReference(unresolved) => assert_eq!(unresolved.token, "missing"),
//!         other => panic!("unexpected {other}"),
//!     }
//! }
//! ```
//!
//! ### Building a directory
//!
//! ```rust,no_run
//! use notegraph::{codec::GraphCompiler, config::BuildConfig, source::DirectorySource};
//!
//! # fn main() -> Result<(), notegraph::NotegraphError> {
//! let config = BuildConfig::load("notegraph.toml")?;
//! let source = DirectorySource::new("./notes", &config);
//! let output = GraphCompiler::new(config, None).build(&source)?;
//! for page in output.graph.page_contexts() {
//!     println!("{}: {} links, {} backlinks", page.id, page.links.len(), page.backlinks.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod emit;
pub mod error;
pub mod event;
pub mod graph;
pub mod nodekey;
pub mod paths;
pub mod properties;
pub mod source;
#[cfg(test)]
mod tests;

pub use error::*;
