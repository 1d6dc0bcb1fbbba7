// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{PipelineError, Result};

/// Load a project file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; use [`load_and_validate`] for
/// the semantic checks.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| {
        PipelineError::ConfigError(format!("reading project file at {:?}: {}", path, e))
    })?;

    let config: RawConfigFile =
        toml::from_str(&contents).map_err(|source| PipelineError::TomlError {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(config)
}

/// Load a project file, validate it, and root it at the file's directory.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let raw = load_from_path(path)?;
    let config = ConfigFile::try_from(raw)?;
    Ok(config.with_root(config_root_dir(path)))
}

/// Directory containing the project file.
///
/// A bare filename like "Assetpipe.toml" has an empty parent; fall back to
/// the current working directory then.
pub fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
