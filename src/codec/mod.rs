//! Document parsing and build orchestration.
//!
//! This module turns raw (path, text) pairs into [`Document`](crate::properties::Document)s and
//! drives a whole build.
//!
//! ## Key Components
//!
//! - [`load_document`] / [`load_and_scan`] - Header parsing, title resolution, reference scan
//! - [`frontmatter`] - `---` YAML and `+++` TOML metadata headers
//! - [`extract`] - Permissive single-pass reference scanner producing [`Scanned`] tokens
//! - [`GraphCompiler`] - Runs the two-pass build and returns a [`BuildOutput`]
//! - [`Diagnostic`] - Recoverable problems recorded during a build
//!
//! ## Reference syntax
//!
//! | Form | Meaning |
//! |------|---------|
//! | `[[target]]` | link to the document whose path, title or alias is `target` |
//! | `[[target\|text]]` | same, rendered with `text` |
//! | `[[target#Heading]]` | link to a heading inside `target` |
//! | `#tag` | tag reference (at start of text, after whitespace or `(`) |
//!
//! Anything that does not match one of these forms is plain text. Scanning never fails.
//!
//! ```rust
//! use notegraph::codec::{extract_references, ScanOptions};
//!
//! let refs = extract_references("See [[Other Note|this]] and #ideas", &ScanOptions::default(), 0);
//! assert_eq!(refs.len(), 2);
//! assert_eq!(refs[0].target, "Other Note");
//! assert_eq!(refs[0].display.as_deref(), Some("this"));
//! assert_eq!(refs[1].target, "ideas");
//! ```

pub mod compiler;
pub mod diagnostic;
pub mod extract;
pub mod frontmatter;
pub mod loader;

pub use compiler::{BuildOutput, GraphCompiler};
pub use diagnostic::{AliasConflict, Diagnostic, Diagnostics, Severity, UnresolvedReference};
pub use extract::{extract_references, scan, ScanOptions, Scanned};
pub use frontmatter::{Metadata, MetadataFormat};
pub use loader::{load_and_scan, load_document};
