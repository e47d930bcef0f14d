use serde_json::{Map, Number, Value};

use super::bag::deep_merge;
use super::ConfigError;

/// A value produced by a source, positioned at `path` below the import point.
#[derive(Debug, Clone)]
pub struct ConfigEntry {
    pub path: Vec<String>,
    pub value: Value,
}

impl ConfigEntry {
    pub fn root(map: Map<String, Value>) -> Self {
        Self {
            path: Vec::new(),
            value: Value::Object(map),
        }
    }

    pub fn at_path(path: Vec<String>, value: Value) -> Self {
        Self { path, value }
    }
}

/// Anything that can be turned into configuration entries.
pub trait ConfigSource: Send + Sync + std::fmt::Debug {
    fn entries(&self) -> Result<Vec<ConfigEntry>, ConfigError>;
}

/// Folds entries into one mapping, later entries overriding earlier ones.
pub fn collect_entries(entries: Vec<ConfigEntry>) -> Map<String, Value> {
    let mut map = Map::new();
    for entry in entries {
        merge_at_path(&mut map, &entry.path, entry.value);
    }
    map
}

pub fn merge_at_path(map: &mut Map<String, Value>, path: &[String], value: Value) {
    let Some((first, rest)) = path.split_first() else {
        if let Value::Object(overlay) = value {
            deep_merge(map, overlay);
        }
        return;
    };

    if rest.is_empty() {
        match (map.get_mut(first), value) {
            (Some(Value::Object(base)), Value::Object(overlay)) => deep_merge(base, overlay),
            (_, value) => {
                map.insert(first.clone(), value);
            }
        }
        return;
    }

    if !matches!(map.get(first), Some(Value::Object(_))) {
        map.insert(first.clone(), Value::Object(Map::new()));
    }

    if let Some(Value::Object(nested)) = map.get_mut(first) {
        merge_at_path(nested, rest, value);
    }
}

/// Converts a parsed TOML value into the in-memory value model.
///
/// Datetimes become their RFC 3339 string form. Non-finite floats have no JSON
/// representation and become null.
pub fn from_toml(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(from_toml).collect()),
        toml::Value::Table(table) => Value::Object(from_toml_table(table)),
    }
}

pub fn from_toml_table(table: toml::Table) -> Map<String, Value> {
    table
        .into_iter()
        .map(|(key, value)| (key, from_toml(value)))
        .collect()
}
