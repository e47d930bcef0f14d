//! Importing the default fields of Rust types as configuration.

use std::collections::BTreeMap;
use std::marker::PhantomData;

use serde::Serialize;
use serde_json::{Map, Value};

use super::bag::{BagOptions, ParameterBag};
use super::repository::Repository;
use super::ConfigError;

/// A type whose default field values can be imported as configuration.
///
/// The exported mapping is `Self::default()` serialized with serde, so it is a
/// snapshot of declared defaults and never of a live instance. The type must
/// serialize to a map (a struct with named fields, or a map type).
///
/// ```
/// use dotted_config::{ConfigClass, Library};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Widget {
///     size: u32,
/// }
///
/// impl Default for Widget {
///     fn default() -> Self {
///         Self { size: 10 }
///     }
/// }
///
/// impl ConfigClass for Widget {}
///
/// let mut library = Library::new();
/// library.set_class::<Widget>()?;
/// assert_eq!(library.get("Widget.size"), Some(&serde_json::json!(10)));
/// # Ok::<(), dotted_config::ConfigError>(())
/// ```
pub trait ConfigClass: Serialize + Default + 'static {
    /// Import name: the last path segment of the type name, case preserved.
    fn class_name() -> String {
        short_type_name(std::any::type_name::<Self>())
    }
}

/// Serializes `T::default()` into a mapping.
pub fn export_defaults<T: ConfigClass>() -> Result<Map<String, Value>, ConfigError> {
    let name = T::class_name();
    let value = serde_json::to_value(T::default()).map_err(|source| ConfigError::ClassExport {
        name: name.clone(),
        source,
    })?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ConfigError::ClassNotMapping(name)),
    }
}

fn short_type_name(full: &str) -> String {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

type Exporter = fn() -> Result<Map<String, Value>, ConfigError>;

#[derive(Debug, Clone)]
struct RegisteredClass {
    name: String,
    export: Exporter,
}

/// Classes that can be imported by name.
#[derive(Debug, Clone, Default)]
pub struct ClassRegistry {
    classes: BTreeMap<String, RegisteredClass>,
}

impl ClassRegistry {
    /// Registers `T` under both its full type path and its class name.
    pub fn register<T: ConfigClass>(&mut self) {
        let class = RegisteredClass {
            name: T::class_name(),
            export: export_defaults::<T>,
        };
        self.classes
            .insert(std::any::type_name::<T>().to_string(), class.clone());
        self.classes.insert(class.name.clone(), class);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Exports a registered class, returning its import name and defaults.
    pub fn export(&self, name: &str) -> Result<(String, Map<String, Value>), ConfigError> {
        let class = self
            .classes
            .get(name)
            .ok_or_else(|| ConfigError::ClassNotFound(name.to_string()))?;
        Ok((class.name.clone(), (class.export)()?))
    }
}

/// A store seeded from the default fields of `T`.
///
/// Lets a settings type act as its own configuration: keys start out as the
/// type's fields and can be read, overridden or removed through [`Repository`].
#[derive(Debug)]
pub struct ClassStore<T> {
    bag: ParameterBag,
    _class: PhantomData<T>,
}

impl<T: ConfigClass> ClassStore<T> {
    pub fn new() -> Result<Self, ConfigError> {
        Ok(Self {
            bag: ParameterBag::new(export_defaults::<T>()?, BagOptions::default()),
            _class: PhantomData,
        })
    }

    /// Deserializes the current values back into `T`.
    pub fn to_class(&self) -> Result<T, ConfigError>
    where
        T: serde::de::DeserializeOwned,
    {
        serde_json::from_value(Value::Object(self.bag.all())).map_err(|source| {
            ConfigError::Deserialize {
                key: T::class_name(),
                source,
            }
        })
    }
}

impl<T> Repository for ClassStore<T> {
    fn set(&mut self, key: &str, value: Value) -> Result<(), ConfigError> {
        self.bag.set(key, value)
    }

    fn get(&self, key: &str) -> Option<&Value> {
        self.bag.get(key)
    }

    fn remove(&mut self, key: &str) -> Result<(), ConfigError> {
        self.bag.remove(key)
    }

    fn all(&self) -> Map<String, Value> {
        self.bag.all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    mod widgets {
        use super::*;

        #[derive(Debug, Serialize, Deserialize, PartialEq)]
        pub struct Widget {
            pub size: u32,
            pub label: String,
        }

        impl Default for Widget {
            fn default() -> Self {
                Self {
                    size: 10,
                    label: "plain".to_string(),
                }
            }
        }

        impl ConfigClass for Widget {}
    }

    use widgets::Widget;

    #[derive(Serialize, Default)]
    struct Wrapper<T>(T);

    impl ConfigClass for Wrapper<u8> {}

    #[derive(Serialize, Default)]
    struct Renamed {
        enabled: bool,
    }

    impl ConfigClass for Renamed {
        fn class_name() -> String {
            "features".to_string()
        }
    }

    #[test]
    fn test_class_name_is_last_segment() {
        assert_eq!(Widget::class_name(), "Widget");
        assert_eq!(Wrapper::<u8>::class_name(), "Wrapper");
        assert_eq!(Renamed::class_name(), "features");
    }

    #[test]
    fn test_export_defaults() {
        let map = export_defaults::<Widget>().unwrap();
        assert_eq!(Value::Object(map), json!({"size": 10, "label": "plain"}));
    }

    #[test]
    fn test_export_rejects_non_mapping() {
        let result = export_defaults::<Wrapper<u8>>();
        assert!(matches!(result, Err(ConfigError::ClassNotMapping(name)) if name == "Wrapper"));
    }

    #[test]
    fn test_registry_lookup_by_either_name() {
        let mut registry = ClassRegistry::default();
        registry.register::<Widget>();

        assert!(registry.contains("Widget"));
        assert!(registry.contains(std::any::type_name::<Widget>()));

        let (name, defaults) = registry.export(std::any::type_name::<Widget>()).unwrap();
        assert_eq!(name, "Widget");
        assert_eq!(defaults.get("size"), Some(&json!(10)));

        let missing = registry.export("Gadget");
        assert!(matches!(missing, Err(ConfigError::ClassNotFound(name)) if name == "Gadget"));
    }

    #[test]
    fn test_class_store_round_trip() {
        let mut store = ClassStore::<Widget>::new().unwrap();
        assert_eq!(store.get("size"), Some(&json!(10)));

        store.set("label", json!("fancy")).unwrap();
        assert_eq!(
            store.to_class().unwrap(),
            Widget {
                size: 10,
                label: "fancy".to_string()
            }
        );

        store.remove("label").unwrap();
        assert!(!store.has("label"));
        assert!(store.to_class().is_err());
    }
}
