// src/pipeline/transform.rs

use std::path::PathBuf;

use tracing::debug;

use crate::config::model::ConfigSection;
use crate::errors::{PipelineError, Result};
use crate::graph::Step;
use crate::pipeline::asset::Asset;
use crate::pipeline::cache::ImageCache;
use crate::pipeline::{images, scripts, styles};

/// Settings shared by every task of a run.
#[derive(Debug, Clone)]
pub struct TransformOptions {
    pub browsers: Vec<String>,
    pub jpeg_quality: u8,
    pub concat_separator: String,
}

impl Default for TransformOptions {
    fn default() -> Self {
        TransformOptions::from(&ConfigSection::default())
    }
}

impl From<&ConfigSection> for TransformOptions {
    fn from(cfg: &ConfigSection) -> Self {
        Self {
            browsers: cfg.browsers.clone(),
            jpeg_quality: cfg.jpeg_quality,
            concat_separator: cfg.concat_separator.clone(),
        }
    }
}

/// Everything a step may look at besides its input assets.
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    pub task: &'a str,
    /// Extra Sass load paths, already joined with the project root.
    pub include_paths: &'a [PathBuf],
    pub options: &'a TransformOptions,
    pub cache: &'a ImageCache,
}

impl StepContext<'_> {
    pub(crate) fn step_error(&self, step: &Step, message: impl Into<String>) -> PipelineError {
        PipelineError::StepError {
            task: self.task.to_string(),
            step: step.label().to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn compile_error(&self, asset: &Asset, message: impl Into<String>) -> PipelineError {
        PipelineError::CompileError {
            task: self.task.to_string(),
            file: asset.origin.clone().unwrap_or_else(|| asset.path.clone()),
            message: message.into(),
        }
    }
}

/// Run `steps` in order; each step sees the previous step's output.
pub fn apply_steps(steps: &[Step], assets: Vec<Asset>, ctx: &StepContext<'_>) -> Result<Vec<Asset>> {
    steps
        .iter()
        .try_fold(assets, |assets, step| apply_step(step, assets, ctx))
}

pub fn apply_step(step: &Step, assets: Vec<Asset>, ctx: &StepContext<'_>) -> Result<Vec<Asset>> {
    debug!(task = %ctx.task, step = %step, inputs = assets.len(), "applying step");
    match step {
        Step::Copy => Ok(assets),
        Step::Concat(file) => Ok(concat(&assets, file, &ctx.options.concat_separator)
            .into_iter()
            .collect()),
        Step::Sass => styles::compile_sass(assets, ctx),
        Step::Postcss => styles::postcss(step, assets, ctx),
        Step::MinifyJs => scripts::minify_scripts(assets, ctx),
        Step::CompressImages => images::compress_images(assets, ctx),
        Step::Rename(file) => rename(step, assets, file, ctx),
    }
}

/// Join `assets` in the given order into one asset named `file`.
///
/// `separator` is inserted after any input that does not already end with
/// it. Returns `None` for an empty input list.
pub fn concat(assets: &[Asset], file: &str, separator: &str) -> Option<Asset> {
    if assets.is_empty() {
        return None;
    }

    let total: usize = assets.iter().map(|a| a.contents.len() + separator.len()).sum();
    let mut out = Vec::with_capacity(total);

    for (idx, asset) in assets.iter().enumerate() {
        out.extend_from_slice(&asset.contents);
        let last = idx + 1 == assets.len();
        if !last && !separator.is_empty() && !asset.contents.ends_with(separator.as_bytes()) {
            out.extend_from_slice(separator.as_bytes());
        }
    }

    Some(Asset::new(file, out))
}

fn rename(step: &Step, mut assets: Vec<Asset>, file: &str, ctx: &StepContext<'_>) -> Result<Vec<Asset>> {
    match assets.len() {
        0 => Ok(assets),
        1 => {
            let asset = &mut assets[0];
            asset.path = asset.path.with_file_name(file);
            Ok(assets)
        }
        n => Err(ctx.step_error(step, format!("expected a single input, got {n}"))),
    }
}
