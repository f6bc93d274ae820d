use std::{io, path::StripPrefixError};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event::BuildEvent;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum NotegraphError {
    #[error("Invalid build configuration: {0}")]
    Config(String),
    #[error("Emitter error: {0}")]
    Emit(String),
    #[error("Invalid document path '{0}'")]
    InvalidPath(String),
    #[error("File System error: {0}")]
    Io(String),
    #[error("Malformed metadata header: {0}")]
    MalformedMetadata(String),
    #[error("Item Not Found: {0}")]
    NotFound(String),
    #[error("You do not have permission to access this resource")]
    PermissionDenied,
    #[error("(De)Serialization error: {0}")]
    Serialization(String),
    #[error("Document source unavailable: {0}")]
    Source(String),
}

impl From<StripPrefixError> for NotegraphError {
    fn from(src: StripPrefixError) -> NotegraphError {
        NotegraphError::InvalidPath(format!("Strip prefix failed for path. Error: {src}"))
    }
}

impl From<toml::de::Error> for NotegraphError {
    fn from(src: toml::de::Error) -> NotegraphError {
        NotegraphError::Serialization(format!("Toml deserialization error: {src}"))
    }
}

impl From<toml::ser::Error> for NotegraphError {
    fn from(src: toml::ser::Error) -> NotegraphError {
        NotegraphError::Serialization(format!("Toml serialization error: {src}"))
    }
}

impl From<serde_json::Error> for NotegraphError {
    fn from(src: serde_json::Error) -> NotegraphError {
        NotegraphError::Serialization(format!("JSON (de)serialization error: {src}"))
    }
}

impl From<serde_yaml::Error> for NotegraphError {
    fn from(src: serde_yaml::Error) -> NotegraphError {
        NotegraphError::Serialization(format!("YAML (de)serialization error: {src}"))
    }
}

impl From<io::Error> for NotegraphError {
    fn from(x: io::Error) -> Self {
        match x.kind() {
            io::ErrorKind::NotFound => NotegraphError::NotFound(format!("{x}")),
            io::ErrorKind::PermissionDenied => NotegraphError::PermissionDenied,
            _ => NotegraphError::Io(format!("IOError: {}", x.kind())),
        }
    }
}

impl From<walkdir::Error> for NotegraphError {
    fn from(x: walkdir::Error) -> Self {
        let path = x.path().map(|p| p.display().to_string()).unwrap_or_default();
        match x.into_io_error() {
            Some(io_error) => NotegraphError::from(io_error),
            None => NotegraphError::Io(format!("directory walk failed at '{path}'")),
        }
    }
}

impl From<tokio::sync::mpsc::error::SendError<BuildEvent>> for NotegraphError {
    fn from(x: tokio::sync::mpsc::error::SendError<BuildEvent>) -> Self {
        NotegraphError::Io(format!(
            "Channel update send Error, could not transmit build event {:?}",
            x.0
        ))
    }
}
