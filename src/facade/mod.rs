//! Shared handle over one configuration library.

use std::cell::RefCell;
use std::fmt;
use std::path::Path;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::config::{ConfigClass, ConfigError, ConfigSource, Library, Node};

thread_local! {
    static GLOBAL: Config = Config::new();
}

/// A cheaply cloned handle to a [`Library`].
///
/// Every clone reads and writes the same configuration, so one store can be
/// created at startup and handed to whatever needs it. [`Config::global`]
/// returns a lazily created instance shared by the whole thread.
///
/// ## Example
///
/// ```
/// use dotted_config::Config;
/// use serde_json::json;
///
/// let config = Config::new();
/// let view = config.clone();
///
/// config.set(Some("app.name"), "demo")?;
/// assert_eq!(view.get("app.name"), Some(json!("demo")));
/// # Ok::<(), dotted_config::ConfigError>(())
/// ```
///
/// The handle is not `Send`. Threads that need configuration either build their
/// own [`Library`] or wrap one in their own lock.
#[derive(Clone, Default)]
pub struct Config {
    inner: Rc<RefCell<Library>>,
}

impl Config {
    /// Creates a handle to a fresh, empty library.
    pub fn new() -> Self {
        Self::from_library(Library::new())
    }

    pub fn from_library(library: Library) -> Self {
        Self {
            inner: Rc::new(RefCell::new(library)),
        }
    }

    /// The library shared by every `Config::global()` call on this thread.
    pub fn global() -> Self {
        GLOBAL.with(Config::clone)
    }

    /// True when both handles point at the same library.
    pub fn ptr_eq(&self, other: &Config) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Runs `f` with shared access to the underlying library.
    pub fn with<R>(&self, f: impl FnOnce(&Library) -> R) -> R {
        f(&self.inner.borrow())
    }

    /// Runs `f` with exclusive access to the underlying library.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut Library) -> R) -> R {
        f(&mut self.inner.borrow_mut())
    }

    pub fn version(&self) -> &'static str {
        self.inner.borrow().version()
    }

    pub fn set(&self, key: Option<&str>, value: impl Into<Value>) -> Result<&Self, ConfigError> {
        self.inner.borrow_mut().set(key, value)?;
        Ok(self)
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.borrow().get(key).cloned()
    }

    pub fn get_or(&self, key: &str, default: impl Into<Value>) -> Value {
        self.inner.borrow().get_or(key, default)
    }

    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        self.inner.borrow().get_as(key)
    }

    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        self.inner.borrow().deserialize()
    }

    pub fn has(&self, key: &str) -> bool {
        self.inner.borrow().has(key)
    }

    pub fn remove(&self, key: &str) -> Result<&Self, ConfigError> {
        self.inner.borrow_mut().remove(key)?;
        Ok(self)
    }

    pub fn all(&self) -> Map<String, Value> {
        self.inner.borrow().all()
    }

    pub fn set_array(
        &self,
        name: Option<&str>,
        assoc: Map<String, Value>,
    ) -> Result<&Self, ConfigError> {
        self.inner.borrow_mut().set_array(name, assoc)?;
        Ok(self)
    }

    pub fn merge(
        &self,
        name: Option<&str>,
        overlay: Map<String, Value>,
    ) -> Result<&Self, ConfigError> {
        self.inner.borrow_mut().merge(name, overlay)?;
        Ok(self)
    }

    pub fn set_dir(
        &self,
        name: Option<&str>,
        path: impl AsRef<Path>,
        exclude: &[&str],
    ) -> Result<&Self, ConfigError> {
        self.inner.borrow_mut().set_dir(name, path, exclude)?;
        Ok(self)
    }

    pub fn set_file(
        &self,
        name: Option<&str>,
        path: impl AsRef<Path>,
    ) -> Result<&Self, ConfigError> {
        self.inner.borrow_mut().set_file(name, path)?;
        Ok(self)
    }

    pub fn set_env(
        &self,
        name: Option<&str>,
        prefix: &str,
        separator: &str,
    ) -> Result<&Self, ConfigError> {
        self.inner.borrow_mut().set_env(name, prefix, separator)?;
        Ok(self)
    }

    /// Deep-merges the entries of `source` at `name`.
    ///
    /// The entries are collected before the library is borrowed, so a source
    /// may itself read from this handle.
    pub fn import(
        &self,
        name: Option<&str>,
        source: &dyn ConfigSource,
    ) -> Result<&Self, ConfigError> {
        let entries = source.entries()?;
        self.inner
            .borrow_mut()
            .merge(name, crate::config::collect_entries(entries))?;
        Ok(self)
    }

    pub fn set_class<T: ConfigClass>(&self) -> Result<&Self, ConfigError> {
        self.inner.borrow_mut().set_class::<T>()?;
        Ok(self)
    }

    pub fn set_class_of<T: ConfigClass>(&self, instance: &T) -> Result<&Self, ConfigError> {
        self.inner.borrow_mut().set_class_of(instance)?;
        Ok(self)
    }

    pub fn register_class<T: ConfigClass>(&self) -> &Self {
        self.inner.borrow_mut().register_class::<T>();
        self
    }

    pub fn set_class_named(&self, class: &str) -> Result<&Self, ConfigError> {
        self.inner.borrow_mut().set_class_named(class)?;
        Ok(self)
    }

    pub fn resolve_references(&self) -> Result<&Self, ConfigError> {
        self.inner.borrow_mut().resolve_references()?;
        Ok(self)
    }

    pub fn navigate(&self, path: &str) -> Option<Node> {
        self.inner.borrow().navigate(path)
    }

    /// Closes the shared library for every handle.
    pub fn close(&self) {
        self.inner.borrow_mut().close();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.borrow().is_closed()
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.inner.borrow(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FileSource;
    use serde::Serialize;
    use serde_json::json;
    use tempfile::TempDir;

    #[derive(Serialize)]
    struct Widget {
        size: u32,
    }

    impl Default for Widget {
        fn default() -> Self {
            Self { size: 10 }
        }
    }

    impl ConfigClass for Widget {}

    #[test]
    fn test_clones_share_state() {
        let config = Config::new();
        let other = config.clone();

        config.set(Some("a.b"), 1).unwrap();
        assert_eq!(other.get("a.b"), Some(json!(1)));

        other.remove("a.b").unwrap();
        assert!(!config.has("a.b"));
        assert!(config.ptr_eq(&other));
    }

    #[test]
    fn test_new_handles_are_independent() {
        let first = Config::new();
        let second = Config::new();

        first.set(Some("only.here"), true).unwrap();
        assert!(!second.has("only.here"));
        assert!(!first.ptr_eq(&second));
    }

    #[test]
    fn test_global_is_lazy_singleton() {
        let first = Config::global();
        let second = Config::global();
        assert!(first.ptr_eq(&second));

        first.set(Some("facade.global"), "yes").unwrap();
        assert_eq!(second.get_or("facade.global", "no"), json!("yes"));
        first.remove("facade.global").unwrap();
    }

    #[test]
    fn test_forwarded_imports() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("one.toml"), "x = 1").unwrap();
        std::fs::write(dir.path().join("skip.toml"), "y = 2").unwrap();
        std::fs::write(dir.path().join("extra.toml"), "[db]\nport = 1").unwrap();

        let config = Config::new();
        config
            .set_array(None, json!({"a": {"b": 1}}).as_object().unwrap().clone())
            .unwrap()
            .set_dir(Some("dir"), dir.path(), &["skip", "extra"])
            .unwrap()
            .set_file(Some("Extra"), dir.path().join("extra.toml"))
            .unwrap()
            .set_class::<Widget>()
            .unwrap();

        assert_eq!(config.get("a.b"), Some(json!(1)));
        assert_eq!(config.get("dir.one.x"), Some(json!(1)));
        assert!(!config.has("dir.skip"));
        assert_eq!(config.get_as::<u16>("extra.db.port").unwrap(), Some(1));
        assert_eq!(config.get("Widget.size"), Some(json!(10)));
        assert!(config.navigate("extra.db").is_some_and(|node| node.is_branch()));
    }

    #[test]
    fn test_import_from_source() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("base.toml");
        std::fs::write(&path, "[db]\nhost = \"a\"").unwrap();

        let config = Config::new();
        config.set(Some("db.port"), 5432).unwrap();
        config.import(None, &FileSource::new(&path, true)).unwrap();

        assert_eq!(config.get("db"), Some(json!({"port": 5432, "host": "a"})));
    }

    #[test]
    fn test_class_registry_through_facade() {
        let config = Config::new();
        config.register_class::<Widget>().set_class_named("Widget").unwrap();
        assert_eq!(config.get("Widget.size"), Some(json!(10)));
        assert!(config.set_class_named("Missing").is_err());
    }

    #[test]
    fn test_close_affects_every_handle() {
        let config = Config::new();
        let other = config.clone();
        config.set(Some("a"), 1).unwrap();

        other.close();
        assert!(config.is_closed());
        assert!(!config.has("a"));
        assert!(matches!(config.set(Some("a"), 2), Err(ConfigError::Closed)));
    }

    #[test]
    fn test_dropping_a_handle_keeps_data() {
        let config = Config::new();
        {
            let temporary = config.clone();
            temporary.set(Some("kept"), true).unwrap();
        }
        assert_eq!(config.get("kept"), Some(json!(true)));
        assert!(!config.is_closed());
    }

    #[test]
    fn test_version_and_with() {
        let config = Config::from_library(Library::new());
        assert_eq!(config.version(), "1.0");

        config.with_mut(|library| library.set(Some("n"), 3).map(|_| ())).unwrap();
        assert_eq!(config.with(|library| library.get("n").cloned()), Some(json!(3)));
    }
}
