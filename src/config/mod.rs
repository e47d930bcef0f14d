//! Configuration storage, sources and imports.

mod bag;
mod class;
mod env;
mod error;
mod file;
mod library;
mod node;
mod repository;
mod resolve;
mod source;

pub use bag::{BagOptions, ParameterBag};
pub use class::{export_defaults, ClassRegistry, ClassStore, ConfigClass};
pub use env::EnvSource;
pub use error::{ConfigError, ErrorKind};
pub use file::{FileSource, CONFIG_EXTENSION};
pub use library::{Library, VERSION};
pub use node::Node;
pub use repository::Repository;
pub use source::{collect_entries, ConfigEntry, ConfigSource};
