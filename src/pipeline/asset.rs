// src/pipeline/asset.rs

use std::path::{Path, PathBuf};

/// One file flowing through a task's steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Output path, relative to the task's destination directory.
    pub path: PathBuf,
    /// File the contents were read from, when there is exactly one.
    pub origin: Option<PathBuf>,
    pub contents: Vec<u8>,
}

impl Asset {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            origin: None,
            contents: contents.into(),
        }
    }

    pub fn with_origin(mut self, origin: impl Into<PathBuf>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Lower-cased extension of the output path.
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }

    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }

    /// Directory the source came from, used as a Sass load path.
    pub fn origin_dir(&self) -> Option<&Path> {
        self.origin.as_deref().and_then(Path::parent)
    }
}
