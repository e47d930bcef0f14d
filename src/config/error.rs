use std::path::PathBuf;
use thiserror::Error;

/// Broad classification of a [`ConfigError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller passed a value of the wrong shape.
    InvalidArgument,
    /// A path was missing, of the wrong type, or unreadable.
    Io,
    /// A source was read but its contents could not be used.
    InvalidFormat,
    /// A named class is not registered.
    NotFound,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("the value must be a mapping to set the entire configuration")]
    RootNotMapping,

    #[error("class '{0}' must export a mapping")]
    ClassNotMapping(String),

    #[error("failed to export class '{name}': {source}")]
    ClassExport {
        name: String,
        source: serde_json::Error,
    },

    #[error("class '{0}' not found")]
    ClassNotFound(String),

    #[error("configuration store is closed")]
    Closed,

    #[error("'{0}' is not a valid directory")]
    NotADirectory(PathBuf),

    #[error("could not read directory '{path}': {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("'{0}' must be a TOML file")]
    UnsupportedFormat(PathBuf),

    #[error("failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("failed to deserialize '{key}': {source}")]
    Deserialize {
        key: String,
        source: serde_json::Error,
    },

    #[error("circular reference detected in configuration")]
    CircularReference,

    #[error("referenced path not found: {0}")]
    ReferenceNotFound(String),

    #[error("invalid reference path: {0}")]
    InvalidReferencePath(String),

    #[error("cannot reference non-scalar value: {0}")]
    NonScalarReference(String),

    #[error("unclosed reference (missing '}}')")]
    UnclosedReference,
}

impl ConfigError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RootNotMapping
            | Self::ClassNotMapping(_)
            | Self::ClassExport { .. }
            | Self::Closed => ErrorKind::InvalidArgument,
            Self::NotADirectory(_)
            | Self::ReadDir { .. }
            | Self::FileNotFound(_)
            | Self::ReadError { .. } => ErrorKind::Io,
            Self::UnsupportedFormat(_)
            | Self::ParseError { .. }
            | Self::Deserialize { .. }
            | Self::CircularReference
            | Self::ReferenceNotFound(_)
            | Self::InvalidReferencePath(_)
            | Self::NonScalarReference(_)
            | Self::UnclosedReference => ErrorKind::InvalidFormat,
            Self::ClassNotFound(_) => ErrorKind::NotFound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(ConfigError::RootNotMapping.kind(), ErrorKind::InvalidArgument);
        assert_eq!(
            ConfigError::NotADirectory(PathBuf::from("/x")).kind(),
            ErrorKind::Io
        );
        assert_eq!(
            ConfigError::UnsupportedFormat(PathBuf::from("a.ini")).kind(),
            ErrorKind::InvalidFormat
        );
        assert_eq!(
            ConfigError::ClassNotFound("Widget".into()).kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_display() {
        let err = ConfigError::NotADirectory(PathBuf::from("/nope"));
        assert_eq!(err.to_string(), "'/nope' is not a valid directory");
        assert_eq!(
            ConfigError::ClassNotFound("Widget".into()).to_string(),
            "class 'Widget' not found"
        );
    }
}
