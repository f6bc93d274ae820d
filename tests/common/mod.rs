//! Shared test utilities for integration tests.
//!
//! Import from integration test files as:
//! ```ignore
//! mod common;
//! ```

use std::path::PathBuf;
use tempfile::TempDir;

/// Initialize tracing for tests, respecting RUST_LOG env var.
///
/// Safe to call multiple times; subsequent calls are no-ops.
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// Write `files` (relative path, contents) under `<temp_dir>/notes/` and return that directory.
#[allow(dead_code)]
pub fn write_corpus(temp_dir: &TempDir, files: &[(&str, &str)]) -> PathBuf {
    let root = temp_dir.path().join("notes");
    std::fs::create_dir_all(&root).unwrap();
    for (path, text) in files {
        let full = root.join(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(full, text).unwrap();
    }
    root
}

/// A small publication with a home page, two posts, a draft and a broken link.
#[allow(dead_code)]
pub fn blog_corpus() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "index.md",
            "---\ntitle: Home\n---\nLatest: [[posts/first]] and [[Second Post]].\n",
        ),
        (
            "posts/first.md",
            concat!(
                "+++\ntitle = \"First Post\"\ntags = [\"rust\", \"intro\"]\ncreated = 2024-03-01\n",
                "+++\nHello! Read [[second]] next. #Rust\n",
            ),
        ),
        (
            "posts/second.md",
            concat!(
                "---\ntitle: Second Post\naliases: [second]\ntags: [rust]\n",
                "updated: 2024-03-05 10:30\n",
                "---\nBack to [[First Post]]. Coming soon: [[upcoming]].\n",
            ),
        ),
        (
            "posts/upcoming.md",
            concat!(
                "---\ndraft: true\ntags: [rust, teaser]\n---\n",
                "# Upcoming\nSee [[Home]] and [[not written yet]].\n",
            ),
        ),
    ]
}
