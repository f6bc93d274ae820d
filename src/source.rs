//! Document sources: where the (path, text) pairs of a build come from.

use sha2::{Digest, Sha256};
use std::{
    fs::read_to_string,
    path::{Path, PathBuf},
};
use walkdir::{DirEntry, WalkDir};

use crate::{config::BuildConfig, error::NotegraphError};

/// One raw input document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// Path relative to the source root, `/`-separated. Canonicalized later by the loader.
    pub path: String,
    pub text: String,
}

/// A single enumerated item. A failure to read one item never fails the enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceItem {
    Document(SourceDocument),
    Unreadable { path: String, message: String },
}

impl SourceItem {
    pub fn document(path: impl Into<String>, text: impl Into<String>) -> SourceItem {
        SourceItem::Document(SourceDocument {
            path: path.into(),
            text: text.into(),
        })
    }

    pub fn path(&self) -> &str {
        match self {
            SourceItem::Document(doc) => &doc.path,
            SourceItem::Unreadable { path, .. } => path,
        }
    }
}

/// Enumerates the input of one build.
///
/// An `Err` means the input as a whole is unavailable and aborts the build; per-document
/// problems are reported as [`SourceItem::Unreadable`].
pub trait DocumentSource {
    fn enumerate(&self) -> Result<Vec<SourceItem>, NotegraphError>;
}

/// In-memory (path, text) pairs.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    items: Vec<SourceItem>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: impl Into<String>, text: impl Into<String>) -> &mut Self {
        self.items.push(SourceItem::document(path, text));
        self
    }

    pub fn push_item(&mut self, item: SourceItem) -> &mut Self {
        self.items.push(item);
        self
    }
}

impl<P: Into<String>, T: Into<String>> FromIterator<(P, T)> for MemorySource {
    fn from_iter<I: IntoIterator<Item = (P, T)>>(iter: I) -> Self {
        MemorySource {
            items: iter
                .into_iter()
                .map(|(path, text)| SourceItem::document(path, text))
                .collect(),
        }
    }
}

impl DocumentSource for MemorySource {
    fn enumerate(&self) -> Result<Vec<SourceItem>, NotegraphError> {
        Ok(self.items.clone())
    }
}

/// Every file under a root directory whose extension is a configured document extension.
///
/// Hidden files and directories are skipped. Items come back in lexicographic path order.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    extensions: Vec<String>,
}

impl DirectorySource {
    pub fn new<P: AsRef<Path>>(root: P, config: &BuildConfig) -> Self {
        DirectorySource {
            root: root.as_ref().to_path_buf(),
            extensions: config.extensions.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_document(&self, entry: &DirEntry) -> bool {
        entry.file_type().is_file()
            && entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .filter(|&e| self.extensions.iter().any(|ext| ext == e))
                .is_some()
    }

    fn relative_path(&self, path: &Path) -> Result<String, NotegraphError> {
        let relative = path.strip_prefix(&self.root)?;
        Ok(relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"))
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

impl DocumentSource for DirectorySource {
    #[tracing::instrument(skip(self), fields(root = %self.root.display()))]
    fn enumerate(&self) -> Result<Vec<SourceItem>, NotegraphError> {
        if !self.root.is_dir() {
            return Err(NotegraphError::Source(format!(
                "'{}' is not a readable directory",
                self.root.display()
            )));
        }
        let mut items = Vec::new();
        for entry in WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err
                        .path()
                        .and_then(|p| self.relative_path(p).ok())
                        .unwrap_or_default();
                    let message = NotegraphError::from(err).to_string();
                    tracing::warn!("[DirectorySource] skipping '{}': {}", path, message);
                    items.push(SourceItem::Unreadable { path, message });
                    continue;
                }
            };
            if !self.is_document(&entry) {
                continue;
            }
            let path = self.relative_path(entry.path())?;
            match read_to_string(entry.path()) {
                Ok(text) => items.push(SourceItem::document(path, text)),
                Err(err) => {
                    let message = NotegraphError::from(err).to_string();
                    tracing::warn!("[DirectorySource] could not read '{}': {}", path, message);
                    items.push(SourceItem::Unreadable { path, message });
                }
            }
        }
        tracing::debug!("[DirectorySource] enumerated {} items", items.len());
        Ok(items)
    }
}

/// SHA-256 over the input, independent of enumeration order.
///
/// Two builds over inputs with the same fingerprint produce the same graph and diagnostics
/// under the same configuration.
pub fn fingerprint(items: &[SourceItem]) -> String {
    let mut ordered = items.iter().collect::<Vec<_>>();
    ordered.sort_by(|a, b| a.path().cmp(b.path()));
    let mut hasher = Sha256::new();
    for item in ordered {
        match item {
            SourceItem::Document(doc) => {
                hasher.update(b"D");
                hasher.update(doc.path.as_bytes());
                hasher.update([0u8]);
                hasher.update(doc.text.as_bytes());
            }
            SourceItem::Unreadable { path, message } => {
                hasher.update(b"U");
                hasher.update(path.as_bytes());
                hasher.update([0u8]);
                hasher.update(message.as_bytes());
            }
        }
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{create_dir_all, write};
    use tempfile::tempdir;
    use test_log::test;

    #[test]
    fn test_fingerprint_ignores_order() {
        let a = vec![SourceItem::document("a.md", "x"), SourceItem::document("b.md", "y")];
        let b = vec![SourceItem::document("b.md", "y"), SourceItem::document("a.md", "x")];
        assert_eq!(fingerprint(&a), fingerprint(&b));
        assert_eq!(fingerprint(&a).len(), 64);

        let c = vec![SourceItem::document("a.md", "x"), SourceItem::document("b.md", "z")];
        assert_ne!(fingerprint(&a), fingerprint(&c));
    }

    #[test]
    fn test_memory_source() {
        let source = [("b.md", "b"), ("a.md", "a")]
            .into_iter()
            .collect::<MemorySource>();
        let items = source.enumerate().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].path(), "b.md");
    }

    #[test]
    fn test_directory_source_filters_and_orders() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        create_dir_all(root.join("sub")).unwrap();
        create_dir_all(root.join(".hidden")).unwrap();
        write(root.join("b.md"), "b").unwrap();
        write(root.join("a.markdown"), "a").unwrap();
        write(root.join("sub/c.md"), "c").unwrap();
        write(root.join(".hidden/d.md"), "d").unwrap();
        write(root.join(".e.md"), "e").unwrap();
        write(root.join("notes.txt"), "txt").unwrap();

        let source = DirectorySource::new(root, &BuildConfig::default());
        let paths = source
            .enumerate()
            .unwrap()
            .iter()
            .map(|item| item.path().to_string())
            .collect::<Vec<_>>();
        assert_eq!(paths, vec!["a.markdown", "b.md", "sub/c.md"]);
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let dir = tempdir().unwrap();
        let source = DirectorySource::new(dir.path().join("nope"), &BuildConfig::default());
        assert!(matches!(source.enumerate(), Err(NotegraphError::Source(_))));
    }
}
