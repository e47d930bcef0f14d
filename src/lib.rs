//! Hierarchical, dot-addressable configuration assembled from literal maps,
//! TOML files and directories, environment variables and type defaults.

pub mod config;
pub mod facade;

pub use config::{
    BagOptions, ConfigClass, ConfigError, ConfigSource, ErrorKind, Library, Node, ParameterBag,
    Repository,
};
pub use facade::Config;
