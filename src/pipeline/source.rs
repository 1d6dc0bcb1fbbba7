// src/pipeline/source.rs

//! Resolve a task's source selector into an ordered list of files.
//!
//! Ordering rules:
//! - patterns are processed in the order given;
//! - files matched by one glob are sorted by path;
//! - a file matched by several patterns keeps its first position;
//! - patterns starting with `!` exclude matches of every other pattern.
//!
//! Output paths are relative to the glob's literal prefix (for a literal
//! path, its parent directory), or to the task's `base` when one is set.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};
use tracing::debug;

use crate::errors::{PipelineError, Result};
use crate::pipeline::asset::Asset;

/// A matched source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    /// Path on disk (project root joined with the match).
    pub path: PathBuf,
    /// Output path relative to the destination directory.
    pub relative: PathBuf,
}

/// Split `pattern` into its literal directory prefix.
///
/// Returns the prefix and whether any glob syntax follows it. For a literal
/// path the whole path is returned with `false`.
pub fn glob_base(pattern: &str) -> (PathBuf, bool) {
    let mut base = PathBuf::new();
    for component in pattern.split('/') {
        if is_glob_component(component) {
            return (base, true);
        }
        if !component.is_empty() {
            base.push(component);
        }
    }
    (base, false)
}

fn is_glob_component(component: &str) -> bool {
    component.contains(['*', '?', '[', '{'])
}

fn normalize(pattern: &str) -> &str {
    pattern.trim_start_matches("./")
}

fn compile(pattern: &str) -> Result<GlobMatcher> {
    Ok(GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()?
        .compile_matcher())
}

fn compile_excludes(patterns: &[String]) -> Result<Option<GlobSet>> {
    let negated: Vec<&str> = patterns
        .iter()
        .filter_map(|p| p.strip_prefix('!'))
        .map(normalize)
        .collect();

    if negated.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for pat in negated {
        builder.add(GlobBuilder::new(pat).literal_separator(true).build()?);
    }
    Ok(Some(builder.build()?))
}

/// Match `patterns` against the tree under `root`.
///
/// Patterns that match nothing are skipped silently.
pub fn collect_sources(
    root: &Path,
    patterns: &[String],
    base: Option<&Path>,
) -> Result<Vec<SourceEntry>> {
    let excludes = compile_excludes(patterns)?;
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut entries = Vec::new();

    for raw in patterns.iter().filter(|p| !p.starts_with('!')) {
        let pattern = normalize(raw);
        let (literal, has_glob) = glob_base(pattern);

        let (matches, glob_root) = if has_glob {
            let walk_root = root.join(&literal);
            if !walk_root.is_dir() {
                debug!(pattern = %raw, "glob base does not exist; nothing matched");
                continue;
            }
            let matcher = compile(pattern)?;
            let mut matched: Vec<PathBuf> = walk_files(&walk_root)?
                .into_iter()
                .filter(|p| relative_str(root, p).is_some_and(|rel| matcher.is_match(rel)))
                .collect();
            matched.sort();
            (matched, literal)
        } else {
            let path = root.join(&literal);
            if !path.is_file() {
                debug!(pattern = %raw, "source file does not exist; skipping");
                continue;
            }
            let parent = literal.parent().map(Path::to_path_buf).unwrap_or_default();
            (vec![path], parent)
        };

        if matches.is_empty() {
            debug!(pattern = %raw, "glob matched no files");
        }

        let rel_root = root.join(base.unwrap_or(glob_root.as_path()));

        for path in matches {
            let excluded = excludes.as_ref().is_some_and(|set| {
                relative_str(root, &path).is_some_and(|rel| set.is_match(rel))
            });
            if excluded || !seen.insert(path.clone()) {
                continue;
            }

            let relative = match path.strip_prefix(&rel_root) {
                Ok(rel) => rel.to_path_buf(),
                Err(_) => PathBuf::from(path.file_name().unwrap_or_default()),
            };
            entries.push(SourceEntry { path, relative });
        }
    }

    Ok(entries)
}

/// Resolve and read a task's sources. Runs the directory walk on the
/// blocking pool and reads files with `tokio::fs`, preserving order.
pub async fn read_sources(
    task: &str,
    root: &Path,
    patterns: &[String],
    base: Option<&Path>,
) -> Result<Vec<Asset>> {
    let entries = {
        let root = root.to_path_buf();
        let patterns = patterns.to_vec();
        let base = base.map(Path::to_path_buf);
        tokio::task::spawn_blocking(move || collect_sources(&root, &patterns, base.as_deref()))
            .await
            .map_err(|e| PipelineError::Other(e.into()))??
    };

    let mut assets = Vec::with_capacity(entries.len());
    for entry in entries {
        let contents = tokio::fs::read(&entry.path)
            .await
            .map_err(|source| PipelineError::FsError {
                task: task.to_string(),
                path: entry.path.clone(),
                source,
            })?;
        debug!(task = %task, path = ?entry.path, bytes = contents.len(), "read source");
        assets.push(Asset::new(entry.relative, contents).with_origin(entry.path));
    }
    Ok(assets)
}

fn walk_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut stack = vec![dir.to_path_buf()];

    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.is_file() {
                files.push(path);
            }
        }
    }

    Ok(files)
}

/// `path` relative to `root`, with forward slashes.
pub(crate) fn relative_str(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    Some(rel.to_string_lossy().replace('\\', "/"))
}
