//! Nested key/value container addressed by separator-joined keys.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::ConfigError;

/// Addressing options for a [`ParameterBag`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BagOptions {
    /// Walk nested mappings segment by segment. When off, every key is a
    /// literal top-level name.
    pub multi: bool,
    /// Segment separator. An empty separator disables nesting.
    pub separator: String,
}

impl BagOptions {
    /// Joins `parent` and `child` into one key addressing `child` below `parent`.
    ///
    /// Without nesting there is no separator to join with, so `.` is used and
    /// the result is a literal top-level name.
    pub fn join(&self, parent: &str, child: &str) -> String {
        let separator = if self.multi && !self.separator.is_empty() {
            self.separator.as_str()
        } else {
            "."
        };
        format!("{parent}{separator}{child}")
    }
}

impl Default for BagOptions {
    fn default() -> Self {
        Self {
            multi: true,
            separator: ".".to_string(),
        }
    }
}

/// A nested mapping from dotted keys to JSON values.
///
/// `a.b.c` addresses `c` inside `b` inside `a`. Writes create the intermediate
/// mappings they need; a non-mapping value found on the way is replaced.
#[derive(Debug, Clone, Default)]
pub struct ParameterBag {
    data: Map<String, Value>,
    options: BagOptions,
    closed: bool,
}

impl ParameterBag {
    pub fn new(data: Map<String, Value>, options: BagOptions) -> Self {
        Self {
            data,
            options,
            closed: false,
        }
    }

    pub fn options(&self) -> &BagOptions {
        &self.options
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        let segments = split_key(&self.options, key);
        let (first, rest) = segments.split_first()?;
        let mut current = self.data.get(*first)?;
        for segment in rest {
            current = current.as_object()?.get(*segment)?;
        }
        Some(current)
    }

    /// Returns the value at `key`, or `default` when the path does not resolve.
    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.get(key).cloned().unwrap_or(default)
    }

    /// True when the full path resolves, explicit nulls included.
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn set(&mut self, key: &str, value: Value) -> Result<(), ConfigError> {
        if self.closed {
            return Err(ConfigError::Closed);
        }
        let segments = split_key(&self.options, key);
        insert_at(&mut self.data, &segments, value);
        Ok(())
    }

    /// Deep-merges `overlay` into the mapping at `key` (the root when `None`).
    ///
    /// Nested mappings merge recursively; any other value replaces what was there.
    pub fn merge(
        &mut self,
        key: Option<&str>,
        overlay: Map<String, Value>,
    ) -> Result<(), ConfigError> {
        if self.closed {
            return Err(ConfigError::Closed);
        }
        match key {
            None => deep_merge(&mut self.data, overlay),
            Some(key) => {
                let mut base = match self.get(key) {
                    Some(Value::Object(existing)) => existing.clone(),
                    _ => Map::new(),
                };
                deep_merge(&mut base, overlay);
                self.set(key, Value::Object(base))?;
            }
        }
        Ok(())
    }

    /// Removes the leaf or subtree at `key`. Absent keys are ignored.
    pub fn remove(&mut self, key: &str) -> Result<(), ConfigError> {
        if self.closed {
            return Err(ConfigError::Closed);
        }
        let segments = split_key(&self.options, key);
        remove_at(&mut self.data, &segments);
        Ok(())
    }

    pub fn all(&self) -> Map<String, Value> {
        self.data.clone()
    }

    /// Drops all held data. Later writes fail with [`ConfigError::Closed`].
    pub fn close(&mut self) {
        self.data.clear();
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

fn split_key<'a>(options: &BagOptions, key: &'a str) -> Vec<&'a str> {
    if !options.multi || options.separator.is_empty() {
        return vec![key];
    }
    key.split(options.separator.as_str()).collect()
}

fn insert_at(map: &mut Map<String, Value>, path: &[&str], value: Value) {
    let Some((first, rest)) = path.split_first() else {
        return;
    };

    if rest.is_empty() {
        map.insert((*first).to_string(), value);
        return;
    }

    let slot = map
        .entry((*first).to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    if let Value::Object(nested) = slot {
        insert_at(nested, rest, value);
    }
}

fn remove_at(map: &mut Map<String, Value>, path: &[&str]) -> Option<Value> {
    let (first, rest) = path.split_first()?;
    if rest.is_empty() {
        return map.shift_remove(*first);
    }
    match map.get_mut(*first)? {
        Value::Object(nested) => remove_at(nested, rest),
        _ => None,
    }
}

pub(crate) fn deep_merge(base: &mut Map<String, Value>, overlay: Map<String, Value>) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(Value::Object(base_map)), Value::Object(overlay_map)) => {
                deep_merge(base_map, overlay_map);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bag(value: Value) -> ParameterBag {
        match value {
            Value::Object(map) => ParameterBag::new(map, BagOptions::default()),
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn test_get_nested_path() {
        let bag = bag(json!({"db": {"host": "localhost", "port": 5432}}));
        assert_eq!(bag.get("db.host"), Some(&json!("localhost")));
        assert_eq!(bag.get("db"), Some(&json!({"host": "localhost", "port": 5432})));
    }

    #[test]
    fn test_get_unresolved_returns_default() {
        let bag = bag(json!({"db": {"host": "localhost"}, "name": "app"}));
        assert_eq!(bag.get("db.user"), None);
        assert_eq!(bag.get("name.first"), None);
        assert_eq!(bag.get_or("missing", json!("x")), json!("x"));
    }

    #[test]
    fn test_set_creates_intermediate_levels() {
        let mut bag = ParameterBag::default();
        bag.set("a.b.c", json!(1)).unwrap();
        assert_eq!(bag.all(), json!({"a": {"b": {"c": 1}}}).as_object().unwrap().clone());
    }

    #[test]
    fn test_set_replaces_scalar_intermediate() {
        let mut bag = bag(json!({"a": 5}));
        bag.set("a.b", json!(true)).unwrap();
        assert_eq!(bag.get("a"), Some(&json!({"b": true})));
    }

    #[test]
    fn test_set_overwrites_subtree() {
        let mut bag = bag(json!({"a": {"b": 1, "c": 2}}));
        bag.set("a", json!("flat")).unwrap();
        assert_eq!(bag.get("a"), Some(&json!("flat")));
        assert!(!bag.has("a.b"));
    }

    #[test]
    fn test_has_explicit_null() {
        let mut bag = ParameterBag::default();
        bag.set("nothing", Value::Null).unwrap();
        assert!(bag.has("nothing"));
        assert_eq!(bag.get("nothing"), Some(&Value::Null));
    }

    #[test]
    fn test_remove_leaf_and_absent() {
        let mut bag = bag(json!({"a": {"b": 1, "c": 2}}));
        bag.remove("a.b").unwrap();
        assert!(!bag.has("a.b"));
        assert!(bag.has("a.c"));

        bag.remove("a.zzz.deeper").unwrap();
        bag.remove("nope").unwrap();
        assert_eq!(bag.get("a"), Some(&json!({"c": 2})));
    }

    #[test]
    fn test_merge_keeps_siblings() {
        let mut bag = bag(json!({"db": {"host": "localhost", "port": 5432}}));
        let overlay = json!({"port": 6543, "pool": {"max": 4}});
        bag.merge(Some("db"), overlay.as_object().unwrap().clone()).unwrap();
        assert_eq!(
            bag.get("db"),
            Some(&json!({"host": "localhost", "port": 6543, "pool": {"max": 4}}))
        );
    }

    #[test]
    fn test_single_level_mode_uses_literal_keys() {
        let options = BagOptions {
            multi: false,
            ..BagOptions::default()
        };
        let mut bag = ParameterBag::new(Map::new(), options);
        bag.set("a.b", json!(1)).unwrap();
        assert_eq!(bag.get("a.b"), Some(&json!(1)));
        assert!(!bag.has("a"));
    }

    #[test]
    fn test_custom_separator() {
        let options = BagOptions {
            separator: "/".to_string(),
            ..BagOptions::default()
        };
        let mut bag = ParameterBag::new(Map::new(), options);
        bag.set("server/http/port", json!(80)).unwrap();
        assert_eq!(bag.get("server/http/port"), Some(&json!(80)));
        assert!(!bag.has("server.http.port"));
    }

    #[test]
    fn test_close_drops_data_and_rejects_writes() {
        let mut bag = bag(json!({"a": 1}));
        bag.close();
        assert!(bag.is_closed());
        assert!(!bag.has("a"));
        assert!(matches!(bag.set("a", json!(2)), Err(ConfigError::Closed)));
        assert!(matches!(bag.remove("a"), Err(ConfigError::Closed)));
    }

    #[test]
    fn test_join_follows_separator() {
        let colon = BagOptions {
            separator: ":".to_string(),
            ..BagOptions::default()
        };
        assert_eq!(colon.join("app", "db"), "app:db");
        assert_eq!(BagOptions::default().join("app", "db"), "app.db");

        let flat = BagOptions {
            multi: false,
            separator: ":".to_string(),
        };
        assert_eq!(flat.join("app", "db"), "app.db");
    }

    #[test]
    fn test_options_from_toml() {
        let options: BagOptions = toml::from_str("separator = \"::\"").unwrap();
        assert!(options.multi);
        assert_eq!(options.separator, "::");
    }
}
