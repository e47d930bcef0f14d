use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use super::bag::{BagOptions, ParameterBag};
use super::class::{export_defaults, ClassRegistry, ConfigClass};
use super::env::EnvSource;
use super::file::{import_stem, list_config_files, load_config_file};
use super::node::Node;
use super::repository::Repository;
use super::resolve::resolve_references;
use super::source::{collect_entries, ConfigSource};
use super::ConfigError;

/// Fixed version identifier reported by [`Library::version`].
pub const VERSION: &str = "1.0";

/// A dot-addressable configuration tree fed from several kinds of sources.
///
/// Every import ends up as a mapping stored at an optional key. Passing `None`
/// as the key replaces the entire configuration instead.
///
/// ## Example
///
/// ```no_run
/// use dotted_config::Library;
/// use serde_json::json;
///
/// let mut config = Library::new();
/// config
///     .set_dir(None, "config", &["local"])?
///     .set(Some("app.debug"), json!(true))?;
///
/// let port = config.get_or("database.port", json!(5432));
/// # Ok::<(), dotted_config::ConfigError>(())
/// ```
pub struct Library {
    bag: ParameterBag,
    classes: ClassRegistry,
}

impl Default for Library {
    fn default() -> Self {
        Self::new()
    }
}

impl Library {
    pub fn new() -> Self {
        Self::with_data(Map::new())
    }

    pub fn with_data(data: Map<String, Value>) -> Self {
        Self::with_options(data, BagOptions::default())
    }

    pub fn with_options(data: Map<String, Value>, options: BagOptions) -> Self {
        Self {
            bag: ParameterBag::new(data, options),
            classes: ClassRegistry::default(),
        }
    }

    pub fn version(&self) -> &'static str {
        VERSION
    }

    /// Sets `value` at `key`, or replaces the whole configuration when `key` is `None`.
    ///
    /// Replacing requires `value` to be a mapping; otherwise
    /// [`ConfigError::RootNotMapping`] is returned and nothing changes.
    /// Replacing also reopens a closed library.
    pub fn set(
        &mut self,
        key: Option<&str>,
        value: impl Into<Value>,
    ) -> Result<&mut Self, ConfigError> {
        let value = value.into();
        match key {
            Some(key) => {
                trace!(key, "Setting config value");
                self.bag.set(key, value)?;
            }
            None => {
                let Value::Object(data) = value else {
                    return Err(ConfigError::RootNotMapping);
                };
                debug!(keys = data.len(), "Replacing entire configuration");
                let options = self.bag.options().clone();
                self.bag.close();
                self.bag = ParameterBag::new(data, options);
            }
        }
        Ok(self)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.bag.get(key)
    }

    /// Returns the value at `key`, or `default` when it does not resolve.
    pub fn get_or(&self, key: &str, default: impl Into<Value>) -> Value {
        self.bag.get_or(key, default.into())
    }

    /// Deserializes the value at `key` into `T`. Missing keys give `Ok(None)`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        self.get(key)
            .map(|value| {
                T::deserialize(value).map_err(|source| ConfigError::Deserialize {
                    key: key.to_string(),
                    source,
                })
            })
            .transpose()
    }

    /// Deserializes the entire configuration into `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        serde_json::from_value(Value::Object(self.all())).map_err(|source| {
            ConfigError::Deserialize {
                key: String::new(),
                source,
            }
        })
    }

    pub fn has(&self, key: &str) -> bool {
        self.bag.has(key)
    }

    pub fn remove(&mut self, key: &str) -> Result<&mut Self, ConfigError> {
        self.bag.remove(key)?;
        Ok(self)
    }

    pub fn all(&self) -> Map<String, Value> {
        self.bag.all()
    }

    /// Stores a literal mapping under `name`, or as the whole configuration.
    pub fn set_array(
        &mut self,
        name: Option<&str>,
        assoc: Map<String, Value>,
    ) -> Result<&mut Self, ConfigError> {
        self.set(name, Value::Object(assoc))
    }

    /// Deep-merges `overlay` at `name` (the root when `None`), keeping
    /// sibling keys that `overlay` does not mention.
    pub fn merge(
        &mut self,
        name: Option<&str>,
        overlay: Map<String, Value>,
    ) -> Result<&mut Self, ConfigError> {
        self.bag.merge(name, overlay)?;
        Ok(self)
    }

    /// Imports every `*.toml` file in `path`, each under its lower-cased file stem.
    ///
    /// With a non-empty `name`, files land under `name.<stem>` (joined with the
    /// configured separator). Files whose stem
    /// matches an entry of `exclude` (compared case-insensitively, `.toml`
    /// optional) are skipped. The first failing file aborts the call; files
    /// imported before it are kept.
    pub fn set_dir(
        &mut self,
        name: Option<&str>,
        path: impl AsRef<Path>,
        exclude: &[&str],
    ) -> Result<&mut Self, ConfigError> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(ConfigError::NotADirectory(path.to_path_buf()));
        }
        let files = list_config_files(path)?;

        let excluded: HashSet<String> = exclude.iter().map(|row| import_stem(row)).collect();

        debug!(dir = %path.display(), files = files.len(), "Importing config directory");
        for file in files {
            let Some(file_name) = file.file_name() else {
                continue;
            };
            let stem = import_stem(&file_name.to_string_lossy());
            if excluded.contains(&stem) {
                trace!(file = %file.display(), "Skipping excluded config file");
                continue;
            }
            let key = match name {
                Some(name) if !name.is_empty() => self.bag.options().join(name, &stem),
                _ => stem,
            };
            self.set_file(Some(key.as_str()), &file)?;
        }
        Ok(self)
    }

    /// Loads a TOML file and stores it under the lower-cased `name`.
    ///
    /// With `name == None` the file's contents replace the entire configuration.
    pub fn set_file(
        &mut self,
        name: Option<&str>,
        path: impl AsRef<Path>,
    ) -> Result<&mut Self, ConfigError> {
        let path = path.as_ref();
        let data = load_config_file(path)?;
        let name = name.map(str::to_lowercase);
        debug!(
            file = %path.display(),
            name = name.as_deref().unwrap_or(""),
            "Importing config file"
        );
        self.set(name.as_deref(), Value::Object(data))
    }

    /// Imports environment variables `PREFIX<sep>A<sep>B=v` as `a.b = v`,
    /// deep-merged at `name`.
    pub fn set_env(
        &mut self,
        name: Option<&str>,
        prefix: &str,
        separator: &str,
    ) -> Result<&mut Self, ConfigError> {
        self.import(name, &EnvSource::new(prefix, separator))
    }

    /// Deep-merges everything `source` produces at `name`.
    pub fn import(
        &mut self,
        name: Option<&str>,
        source: &dyn ConfigSource,
    ) -> Result<&mut Self, ConfigError> {
        let entries = source.entries()?;
        debug!(source = ?source, entries = entries.len(), "Importing config source");
        self.merge(name, collect_entries(entries))
    }

    /// Imports the default fields of `T` under `T::class_name()`.
    pub fn set_class<T: ConfigClass>(&mut self) -> Result<&mut Self, ConfigError> {
        let name = T::class_name();
        let defaults = export_defaults::<T>()?;
        debug!(class = %name, "Importing class defaults");
        self.set(Some(name.as_str()), Value::Object(defaults))
    }

    /// Same as [`set_class`](Self::set_class) for the type of `_instance`.
    ///
    /// Field values of the instance are ignored; only declared defaults are imported.
    pub fn set_class_of<T: ConfigClass>(
        &mut self,
        _instance: &T,
    ) -> Result<&mut Self, ConfigError> {
        self.set_class::<T>()
    }

    /// Makes `T` importable through [`set_class_named`](Self::set_class_named).
    pub fn register_class<T: ConfigClass>(&mut self) -> &mut Self {
        self.classes.register::<T>();
        self
    }

    /// Imports a registered class by its full type path or class name.
    pub fn set_class_named(&mut self, class: &str) -> Result<&mut Self, ConfigError> {
        let (name, defaults) = self.classes.export(class)?;
        debug!(class = %name, "Importing class defaults");
        self.set(Some(name.as_str()), Value::Object(defaults))
    }

    /// Expands `${path.to.key}` references inside string values.
    ///
    /// Fails with [`ConfigError::Closed`] once the library is closed.
    pub fn resolve_references(&mut self) -> Result<&mut Self, ConfigError> {
        if self.bag.is_closed() {
            return Err(ConfigError::Closed);
        }
        let mut data = self.bag.all();
        resolve_references(&mut data, self.bag.options())?;
        let options = self.bag.options().clone();
        self.bag = ParameterBag::new(data, options);
        Ok(self)
    }

    /// Attribute-style access: a typed view of the value at `path`.
    ///
    /// Absent keys and explicit nulls both give `None`.
    pub fn navigate(&self, path: &str) -> Option<Node> {
        match self.get(path)? {
            Value::Null => None,
            value => Some(Node::from_value(value)),
        }
    }

    /// Releases all held data. Reads then behave as an empty store and keyed
    /// writes fail with [`ConfigError::Closed`].
    pub fn close(&mut self) {
        if !self.bag.is_closed() {
            debug!("Closing configuration");
            self.bag.close();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.bag.is_closed()
    }
}

impl fmt::Debug for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Library")
            .field("version", &VERSION)
            .field("data", &self.bag.all())
            .finish()
    }
}

impl Repository for Library {
    fn set(&mut self, key: &str, value: Value) -> Result<(), ConfigError> {
        Library::set(self, Some(key), value).map(|_| ())
    }

    fn get(&self, key: &str) -> Option<&Value> {
        Library::get(self, key)
    }

    fn remove(&mut self, key: &str) -> Result<(), ConfigError> {
        Library::remove(self, key).map(|_| ())
    }

    fn all(&self) -> Map<String, Value> {
        Library::all(self)
    }
}
