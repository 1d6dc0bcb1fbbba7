// src/watch/patterns.rs

use std::fmt;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::config::model::{ConfigFile, WatchConfig};
use crate::errors::{PipelineError, Result};
use crate::graph::TaskName;

/// Paths under these prefixes never trigger a rebuild.
const IGNORED_PREFIXES: &[&str] = &[".assetpipe/", ".git/"];

/// Association between glob patterns and the target to re-run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchBinding {
    pub glob: Vec<String>,
    pub exclude: Vec<String>,
    pub target: TaskName,
}

impl WatchBinding {
    pub fn new<T, I, S>(target: T, glob: I) -> Self
    where
        T: Into<TaskName>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            glob: glob.into_iter().map(Into::into).collect(),
            exclude: Vec::new(),
            target: target.into(),
        }
    }

    pub fn excluding<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(patterns.into_iter().map(Into::into));
        self
    }
}

impl From<&WatchConfig> for WatchBinding {
    fn from(cfg: &WatchConfig) -> Self {
        WatchBinding::new(cfg.run.clone(), cfg.glob.iter().cloned()).excluding(cfg.exclude.iter().cloned())
    }
}

/// All `[[watch]]` bindings of a project file, in declaration order.
pub fn bindings_from_config(cfg: &ConfigFile) -> Vec<WatchBinding> {
    cfg.watch.iter().map(WatchBinding::from).collect()
}

/// Compiled form of a [`WatchBinding`].
///
/// Patterns are relative to the project root; the watcher passes relative
/// paths such as `"assets/scss/main.scss"` into [`matches`](Self::matches).
#[derive(Clone)]
pub struct WatchProfile {
    target: TaskName,
    watch_set: GlobSet,
    exclude_set: Option<GlobSet>,
}

impl fmt::Debug for WatchProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchProfile")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl WatchProfile {
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn matches(&self, rel_path: &str) -> bool {
        let rel_path = rel_path.trim_start_matches("./");
        if IGNORED_PREFIXES.iter().any(|p| rel_path.starts_with(p)) {
            return false;
        }
        if !self.watch_set.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude_set {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }
}

pub fn build_watch_profiles(bindings: &[WatchBinding]) -> Result<Vec<WatchProfile>> {
    bindings
        .iter()
        .map(|binding| {
            let watch_set = build_globset(&binding.glob).map_err(|e| {
                PipelineError::ConfigError(format!(
                    "building watch globset for '{}': {e}",
                    binding.target
                ))
            })?;

            let exclude_set = if binding.exclude.is_empty() {
                None
            } else {
                Some(build_globset(&binding.exclude).map_err(|e| {
                    PipelineError::ConfigError(format!(
                        "building exclude globset for '{}': {e}",
                        binding.target
                    ))
                })?)
            };

            Ok(WatchProfile {
                target: binding.target.clone(),
                watch_set,
                exclude_set,
            })
        })
        .collect()
}

fn build_globset(patterns: &[String]) -> std::result::Result<GlobSet, globset::Error> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let pat = pat.trim_start_matches("./");
        builder.add(GlobBuilder::new(pat).literal_separator(true).build()?);
    }
    builder.build()
}
