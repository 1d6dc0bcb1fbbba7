// src/pipeline/images.rs

use std::io::Cursor;
use std::sync::LazyLock;

use anyhow::Context;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ImageFormat};
use regex::Regex;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::pipeline::asset::Asset;
use crate::pipeline::cache::ImageCache;
use crate::pipeline::transform::StepContext;

static SVG_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("static regex"));
static SVG_GAP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r">\s+<").expect("static regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
    Svg,
}

impl ImageKind {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "png" => Some(ImageKind::Png),
            "jpg" | "jpeg" => Some(ImageKind::Jpeg),
            "svg" => Some(ImageKind::Svg),
            _ => None,
        }
    }
}

/// Shrink every recognised image; other inputs pass through.
///
/// The smaller of input and re-encoded output is kept, so running the step
/// on its own output is a no-op up to encoder noise.
pub fn compress_images(assets: Vec<Asset>, ctx: &StepContext<'_>) -> Result<Vec<Asset>> {
    let mut out = Vec::with_capacity(assets.len());

    for mut asset in assets {
        let Some(kind) = asset.extension().as_deref().and_then(ImageKind::from_extension) else {
            out.push(asset);
            continue;
        };

        let settings = format!("{kind:?}:q{}", ctx.options.jpeg_quality);
        let key = ImageCache::key(&settings, &asset.contents);

        let compressed = match ctx.cache.get(&key) {
            Some(bytes) => {
                debug!(task = %ctx.task, path = ?asset.path, "image cache hit");
                bytes
            }
            None => {
                let encoded = compress_image(&asset.contents, kind, ctx.options.jpeg_quality)
                    .map_err(|e| ctx.compile_error(&asset, format!("{e:#}")))?;
                let best = if encoded.len() < asset.contents.len() {
                    encoded
                } else {
                    asset.contents.clone()
                };
                if let Err(err) = ctx.cache.put(&key, &best) {
                    warn!(task = %ctx.task, error = %err, "failed to store image cache entry");
                }
                best
            }
        };

        debug!(
            task = %ctx.task,
            path = ?asset.path,
            before = asset.contents.len(),
            after = compressed.len(),
            "compressed image"
        );
        asset.contents = compressed;
        out.push(asset);
    }

    Ok(out)
}

/// Re-encode one image. The result may be larger than the input; callers
/// decide which to keep.
pub fn compress_image(bytes: &[u8], kind: ImageKind, jpeg_quality: u8) -> anyhow::Result<Vec<u8>> {
    match kind {
        ImageKind::Png => {
            let img = image::load_from_memory_with_format(bytes, ImageFormat::Png)
                .context("decoding PNG")?;
            let mut out = Vec::new();
            let encoder =
                PngEncoder::new_with_quality(&mut out, CompressionType::Best, FilterType::Adaptive);
            img.write_with_encoder(encoder).context("encoding PNG")?;
            Ok(out)
        }
        ImageKind::Jpeg => {
            let img = image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)
                .context("decoding JPEG")?;
            let img = match img {
                DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => img,
                other => DynamicImage::ImageRgb8(other.to_rgb8()),
            };
            let mut out = Cursor::new(Vec::new());
            let encoder = JpegEncoder::new_with_quality(&mut out, jpeg_quality);
            img.write_with_encoder(encoder).context("encoding JPEG")?;
            Ok(out.into_inner())
        }
        ImageKind::Svg => {
            let text = std::str::from_utf8(bytes).context("SVG is not UTF-8")?;
            let text = SVG_COMMENT.replace_all(text, "");
            let text = SVG_GAP.replace_all(&text, "><");
            Ok(text.trim().as_bytes().to_vec())
        }
    }
}
