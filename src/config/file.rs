//! File-based configuration sources.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::trace;

use super::source::{from_toml_table, ConfigEntry, ConfigSource};
use super::ConfigError;

/// Extension recognized for config files, both for single files and directory scans.
pub const CONFIG_EXTENSION: &str = "toml";

/// A configuration source that loads from a TOML file.
///
/// Files can be marked as required or optional. Required files that don't exist
/// cause an error; optional files that don't exist are silently skipped.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    required: bool,
}

impl FileSource {
    pub fn new(path: impl AsRef<Path>, required: bool) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            required,
        }
    }
}

impl ConfigSource for FileSource {
    fn entries(&self) -> Result<Vec<ConfigEntry>, ConfigError> {
        if !self.required && !self.path.exists() {
            return Ok(vec![]);
        }
        load_config_file(&self.path).map(|map| vec![ConfigEntry::root(map)])
    }
}

/// Loads a config file into a mapping.
///
/// The path must be a regular file with the `.toml` extension. A TOML
/// document is always a table, so a successful parse is always a mapping.
pub fn load_config_file(path: &Path) -> Result<Map<String, Value>, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::FileNotFound(path.to_path_buf()));
    }
    if path.extension().and_then(|ext| ext.to_str()) != Some(CONFIG_EXTENSION) {
        return Err(ConfigError::UnsupportedFormat(path.to_path_buf()));
    }

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let table: toml::Table = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    trace!(path = %path.display(), keys = table.len(), "Loaded config file");
    Ok(from_toml_table(table))
}

/// Lists the `*.toml` files directly inside `dir`, sorted by file name.
pub fn list_config_files(dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let read_dir_error = |e: std::io::Error| ConfigError::ReadDir {
        path: dir.to_path_buf(),
        source: e,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_dir_error)? {
        let path = entry.map_err(read_dir_error)?.path();
        let is_config = path.extension().and_then(|ext| ext.to_str()) == Some(CONFIG_EXTENSION);
        if path.is_file() && is_config {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Lower-cased file name with a trailing `.toml` removed.
///
/// Used both for the import name of a file and for matching exclusions, so
/// `Skip`, `skip.toml` and `SKIP.toml` all name the same file.
pub fn import_stem(name: &str) -> String {
    let file_name = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(name);
    let suffix = format!(".{CONFIG_EXTENSION}");
    file_name
        .strip_suffix(suffix.as_str())
        .unwrap_or(file_name)
        .to_lowercase()
}
