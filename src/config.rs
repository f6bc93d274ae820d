use serde::{Deserialize, Serialize};
use std::{fs::read_to_string, path::Path};

use crate::error::NotegraphError;

/// Build-wide options. Loaded from a TOML file; every key is optional.
///
/// ```toml
/// extensions = ["md"]
/// parallel = true
/// self_links = true
/// include_drafts = false
/// inline_tags = true
/// skip_code = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Document file extensions. Used by [crate::source::DirectorySource] and to resolve
    /// `[[note.md]]` and `[[note]]` to the same document.
    pub extensions: Vec<String>,
    /// Load and scan documents on the rayon thread pool.
    pub parallel: bool,
    /// Keep references from a document to itself as edges.
    pub self_links: bool,
    /// Treat drafts as published (preview builds).
    pub include_drafts: bool,
    /// Extract `#tag` references from bodies.
    pub inline_tags: bool,
    /// Ignore references inside code spans and fenced code blocks.
    pub skip_code: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            extensions: vec!["md".to_string(), "markdown".to_string()],
            parallel: true,
            self_links: true,
            include_drafts: false,
            inline_tags: true,
            skip_code: true,
        }
    }
}

impl BuildConfig {
    pub fn from_toml_str(content: &str) -> Result<BuildConfig, NotegraphError> {
        let config: BuildConfig = toml::from_str(content)
            .map_err(|e| NotegraphError::Config(format!("{e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read the configuration at `path`, falling back to defaults when the file is absent.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<BuildConfig, NotegraphError> {
        let path = path.as_ref();
        tracing::debug!("Attempting to read build config from: {:?}", path);
        if !path.exists() {
            tracing::debug!("Config file not found, using defaults.");
            return Ok(BuildConfig::default());
        }
        let content = read_to_string(path)?;
        BuildConfig::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String, NotegraphError> {
        Ok(toml::to_string(self)?)
    }

    fn validate(&self) -> Result<(), NotegraphError> {
        if let Some(bad) = self
            .extensions
            .iter()
            .find(|ext| ext.is_empty() || ext.starts_with('.') || ext.contains('/'))
        {
            return Err(NotegraphError::Config(format!(
                "extension '{bad}' must be a bare extension such as \"md\""
            )));
        }
        Ok(())
    }
}
