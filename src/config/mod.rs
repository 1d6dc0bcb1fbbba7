// src/config/mod.rs

//! Project file loading and validation.
//!
//! - `model.rs`: the TOML-backed data model.
//! - `loader.rs`: reading the file from disk.
//! - `validate.rs`: reference, cycle and sanity checks.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{
    AggregateConfig, CacheMode, ConfigFile, ConfigSection, RawConfigFile, ServeSection,
    TaskConfig, WatchConfig,
};
pub use validate::validate_config;
