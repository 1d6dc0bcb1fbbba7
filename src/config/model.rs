// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::PipelineError;
use crate::graph::Step;

/// Configuration exactly as read from a TOML project file.
///
/// ```toml
/// [config]
/// image_cache = "file"
///
/// [serve]
/// port = 3000
/// proxy = "http://127.0.0.1:5000"
///
/// [task.bootstrap-js]
/// src = ["node_modules/bootstrap/dist/js/bootstrap.bundle.min.js"]
/// dest = "static/js"
///
/// [task.styles]
/// src = ["assets/scss/main.scss"]
/// dest = "static/css"
/// steps = ["sass", "postcss"]
///
/// [aggregate.build]
/// parallel = ["bootstrap-js", "styles"]
///
/// [[watch]]
/// glob = ["assets/scss/**/*.scss"]
/// run = "styles"
/// ```
///
/// All sections are optional at parse time; [`ConfigFile::try_from`] runs
/// the semantic checks.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub serve: ServeSection,

    /// All tasks from `[task.<name>]`, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,

    /// All aggregates from `[aggregate.<name>]`.
    #[serde(default)]
    pub aggregate: BTreeMap<String, AggregateConfig>,

    /// Watch bindings from `[[watch]]`, in declaration order.
    #[serde(default)]
    pub watch: Vec<WatchConfig>,
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>` (or the loader), so code
/// holding a `ConfigFile` can rely on every reference resolving.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub serve: ServeSection,
    pub task: BTreeMap<String, TaskConfig>,
    pub aggregate: BTreeMap<String, AggregateConfig>,
    pub watch: Vec<WatchConfig>,

    /// Directory all relative paths are resolved against.
    pub root: PathBuf,
}

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = PipelineError;

    fn try_from(raw: RawConfigFile) -> Result<Self, Self::Error> {
        crate::config::validate::validate_config(&raw)?;
        Ok(Self {
            config: raw.config,
            serve: raw.serve,
            task: raw.task,
            aggregate: raw.aggregate,
            watch: raw.watch,
            root: PathBuf::from("."),
        })
    }
}

impl ConfigFile {
    /// Re-root the configuration, e.g. at the directory of the file it was
    /// loaded from.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Where compressed images are cached between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheMode {
    /// Persist under `.assetpipe/image-cache/`, keyed by content hash.
    #[default]
    File,
    /// Keep entries for the lifetime of the process only.
    Memory,
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigSection {
    #[serde(default)]
    pub image_cache: CacheMode,

    /// Browserslist queries used as vendor-prefix targets by `postcss`.
    #[serde(default = "default_browsers")]
    pub browsers: Vec<String>,

    /// JPEG re-encode quality for `compress-images` (1..=100).
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// Inserted by `concat` after any non-final input that does not already
    /// end with it. Empty by default, which gives a raw byte join.
    #[serde(default = "default_concat_separator")]
    pub concat_separator: String,

    /// Quiet period after a file change before the watch session starts a
    /// rebuild, so bursts of editor events collapse into one run.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_browsers() -> Vec<String> {
    vec!["defaults".to_string()]
}

fn default_jpeg_quality() -> u8 {
    90
}

fn default_concat_separator() -> String {
    String::new()
}

fn default_debounce_ms() -> u64 {
    100
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            image_cache: CacheMode::default(),
            browsers: default_browsers(),
            jpeg_quality: default_jpeg_quality(),
            concat_separator: default_concat_separator(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// `[serve]` section: the preview server started by `watch`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServeSection {
    #[serde(default = "default_port")]
    pub port: u16,

    /// Backend the preview server forwards every request to.
    #[serde(default = "default_proxy")]
    pub proxy: String,
}

fn default_port() -> u16 {
    3000
}

fn default_proxy() -> String {
    "http://127.0.0.1:5000".to_string()
}

impl Default for ServeSection {
    fn default() -> Self {
        Self {
            port: default_port(),
            proxy: default_proxy(),
        }
    }
}

/// `[task.<name>]` section.
///
/// A task is either a transform task (`src` + `dest` + `steps`) or a clean
/// task (`clean`). Mixing the two is rejected during validation.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TaskConfig {
    /// Source globs or literal paths, in the order inputs are processed.
    #[serde(default)]
    pub src: Vec<String>,

    /// Destination directory.
    #[serde(default)]
    pub dest: Option<String>,

    /// Directory output paths are made relative to. Defaults to the literal
    /// prefix of each glob.
    #[serde(default)]
    pub base: Option<String>,

    /// Transform steps, applied in order. Empty means plain copy.
    #[serde(default)]
    pub steps: Vec<Step>,

    /// Extra Sass load paths.
    #[serde(default)]
    pub include_paths: Vec<String>,

    /// Paths removed by a clean task.
    #[serde(default)]
    pub clean: Vec<String>,
}

impl TaskConfig {
    pub fn is_clean(&self) -> bool {
        !self.clean.is_empty()
    }
}

/// `[aggregate.<name>]` section. Exactly one of `series` / `parallel`.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct AggregateConfig {
    #[serde(default)]
    pub series: Option<Vec<String>>,

    #[serde(default)]
    pub parallel: Option<Vec<String>>,
}

impl AggregateConfig {
    /// Names of all children regardless of mode.
    pub fn children(&self) -> &[String] {
        self.series
            .as_deref()
            .or(self.parallel.as_deref())
            .unwrap_or(&[])
    }
}

/// `[[watch]]` entry: re-run `run` when a file matching `glob` changes.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchConfig {
    pub glob: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<String>,

    /// Task or aggregate to re-run.
    pub run: String,
}
