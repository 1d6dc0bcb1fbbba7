// src/pipeline/writer.rs

//! Destination side effects: writing task output and cleaning.

use std::collections::HashSet;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};

use crate::errors::{PipelineError, Result};
use crate::pipeline::asset::Asset;

fn fs_error(task: &str, path: &Path, source: std::io::Error) -> PipelineError {
    PipelineError::FsError {
        task: task.to_string(),
        path: path.to_path_buf(),
        source,
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(path.file_name().unwrap_or_default());
    name.push(".assetpipe-tmp");
    path.with_file_name(name)
}

/// Write `assets` under `dest`.
///
/// Every file is first written to a temporary sibling; only when all of
/// them succeeded are they renamed into place. On failure the temporaries
/// are removed and existing destination files are left untouched.
///
/// Two assets mapping to the same target path are rejected before anything
/// is written.
pub async fn write_assets(task: &str, dest: &Path, assets: &[Asset]) -> Result<Vec<PathBuf>> {
    let mut targets = HashSet::with_capacity(assets.len());
    for asset in assets {
        if !targets.insert(dest.join(&asset.path)) {
            return Err(PipelineError::StepError {
                task: task.to_string(),
                step: "write".to_string(),
                message: format!("more than one output maps to {:?}", asset.path),
            });
        }
    }

    let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(assets.len());

    for asset in assets {
        let target = dest.join(&asset.path);
        let tmp = temp_sibling(&target);

        let result = async {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).await?;
            }
            fs::write(&tmp, &asset.contents).await
        }
        .await;

        if let Err(err) = result {
            discard(&staged).await;
            let _ = fs::remove_file(&tmp).await;
            return Err(fs_error(task, &target, err));
        }
        staged.push((tmp, target));
    }

    let mut written = Vec::with_capacity(staged.len());
    for (idx, (tmp, target)) in staged.iter().enumerate() {
        if let Err(err) = fs::rename(tmp, target).await {
            discard(&staged[idx..]).await;
            return Err(fs_error(task, target, err));
        }
        debug!(task = %task, path = ?target, "wrote");
        written.push(target.clone());
    }

    Ok(written)
}

async fn discard(staged: &[(PathBuf, PathBuf)]) {
    for (tmp, _) in staged {
        let _ = fs::remove_file(tmp).await;
    }
}

/// Recursively delete each target under `root`.
///
/// Targets that do not exist are skipped, so cleaning twice is the same as
/// cleaning once. Returns the paths actually removed.
pub async fn clean_targets(task: &str, root: &Path, targets: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();

    for target in targets {
        let path = root.join(target);
        let meta = match fs::symlink_metadata(&path).await {
            Ok(meta) => meta,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(task = %task, path = ?path, "clean target absent");
                continue;
            }
            Err(err) => return Err(fs_error(task, &path, err)),
        };

        let result = if meta.is_dir() {
            fs::remove_dir_all(&path).await
        } else {
            fs::remove_file(&path).await
        };

        match result {
            Ok(()) => {
                info!(task = %task, path = ?path, "removed");
                removed.push(path);
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(fs_error(task, &path, err)),
        }
    }

    Ok(removed)
}
