use serde_json::{Map, Value};

use super::bag::ParameterBag;
use super::ConfigError;

/// Keyed read/write access shared by every configuration store.
pub trait Repository {
    fn set(&mut self, key: &str, value: Value) -> Result<(), ConfigError>;

    fn get(&self, key: &str) -> Option<&Value>;

    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    fn remove(&mut self, key: &str) -> Result<(), ConfigError>;

    fn all(&self) -> Map<String, Value>;
}

impl Repository for ParameterBag {
    fn set(&mut self, key: &str, value: Value) -> Result<(), ConfigError> {
        ParameterBag::set(self, key, value)
    }

    fn get(&self, key: &str) -> Option<&Value> {
        ParameterBag::get(self, key)
    }

    fn has(&self, key: &str) -> bool {
        ParameterBag::has(self, key)
    }

    fn remove(&mut self, key: &str) -> Result<(), ConfigError> {
        ParameterBag::remove(self, key)
    }

    fn all(&self) -> Map<String, Value> {
        ParameterBag::all(self)
    }
}
