// src/pipeline/scripts.rs

use minify_js::{minify, Session, TopLevelMode};
use tracing::debug;

use crate::errors::Result;
use crate::pipeline::asset::Asset;
use crate::pipeline::transform::StepContext;

/// Minify `.js` inputs. Files already named `*.min.js` and non-script
/// inputs pass through.
pub fn minify_scripts(assets: Vec<Asset>, ctx: &StepContext<'_>) -> Result<Vec<Asset>> {
    let mut out = Vec::with_capacity(assets.len());

    for mut asset in assets {
        let is_script = matches!(asset.extension().as_deref(), Some("js" | "mjs"));
        let already_min = asset.file_name().is_some_and(|n| n.ends_with(".min.js"));
        if !is_script || already_min {
            out.push(asset);
            continue;
        }

        let mut minified = Vec::with_capacity(asset.contents.len());
        {
            let session = Session::new();
            minify(&session, TopLevelMode::Global, &asset.contents, &mut minified)
                .map_err(|e| ctx.compile_error(&asset, format!("{e:?}")))?;
        }

        debug!(
            task = %ctx.task,
            path = ?asset.path,
            before = asset.contents.len(),
            after = minified.len(),
            "minified script"
        );
        asset.contents = minified;
        out.push(asset);
    }

    Ok(out)
}
