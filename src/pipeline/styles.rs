// src/pipeline/styles.rs

//! Stylesheet steps: Sass compilation (`grass`) and prefix + minify
//! (`lightningcss`).

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use tracing::debug;

use crate::errors::Result;
use crate::graph::Step;
use crate::pipeline::asset::Asset;
use crate::pipeline::transform::StepContext;

/// Compile `.scss` / `.sass` inputs to CSS.
///
/// Partials (`_name.scss`) are dropped from the output; they are only
/// reachable through `@use` / `@import`. Other inputs pass through.
pub fn compile_sass(assets: Vec<Asset>, ctx: &StepContext<'_>) -> Result<Vec<Asset>> {
    let mut out = Vec::with_capacity(assets.len());

    for asset in assets {
        let ext = asset.extension();
        let syntax = match ext.as_deref() {
            Some("scss") => grass::InputSyntax::Scss,
            Some("sass") => grass::InputSyntax::Sass,
            _ => {
                out.push(asset);
                continue;
            }
        };

        if asset.file_name().is_some_and(|n| n.starts_with('_')) {
            debug!(task = %ctx.task, path = ?asset.path, "skipping Sass partial");
            continue;
        }

        let mut options = grass::Options::default()
            .style(grass::OutputStyle::Expanded)
            .input_syntax(syntax);
        if let Some(dir) = asset.origin_dir() {
            options = options.load_path(dir);
        }
        for path in ctx.include_paths {
            options = options.load_path(path);
        }

        let source = std::str::from_utf8(&asset.contents)
            .map_err(|e| ctx.compile_error(&asset, format!("source is not UTF-8: {e}")))?;
        let css = grass::from_string(source.to_owned(), &options)
            .map_err(|e| ctx.compile_error(&asset, e.to_string()))?;

        out.push(Asset {
            path: asset.path.with_extension("css"),
            origin: asset.origin,
            contents: css.into_bytes(),
        });
    }

    Ok(out)
}

/// Resolve browserslist queries into `lightningcss` targets.
pub fn browser_targets(queries: &[String]) -> std::result::Result<Targets, String> {
    let browsers = Browsers::from_browserslist(queries.iter().map(String::as_str))
        .map_err(|e| e.to_string())?;
    Ok(Targets {
        browsers,
        ..Targets::default()
    })
}

/// Add vendor prefixes for the configured browsers, then minify. Non-CSS
/// inputs pass through.
pub fn postcss(step: &Step, assets: Vec<Asset>, ctx: &StepContext<'_>) -> Result<Vec<Asset>> {
    let targets = browser_targets(&ctx.options.browsers)
        .map_err(|e| ctx.step_error(step, format!("invalid browsers query: {e}")))?;

    let mut out = Vec::with_capacity(assets.len());
    for mut asset in assets {
        if asset.extension().as_deref() != Some("css") {
            out.push(asset);
            continue;
        }

        let code = {
            let source = std::str::from_utf8(&asset.contents)
                .map_err(|e| ctx.compile_error(&asset, format!("source is not UTF-8: {e}")))?;

            let mut sheet = StyleSheet::parse(
                source,
                ParserOptions {
                    filename: asset.path.display().to_string(),
                    ..ParserOptions::default()
                },
            )
            .map_err(|e| ctx.compile_error(&asset, e.to_string()))?;

            sheet
                .minify(MinifyOptions {
                    targets,
                    ..MinifyOptions::default()
                })
                .map_err(|e| ctx.compile_error(&asset, e.to_string()))?;

            sheet
                .to_css(PrinterOptions {
                    minify: true,
                    targets,
                    ..PrinterOptions::default()
                })
                .map_err(|e| ctx.compile_error(&asset, e.to_string()))?
                .code
        };

        asset.contents = code.into_bytes();
        out.push(asset);
    }

    Ok(out)
}
