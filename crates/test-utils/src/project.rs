#![allow(dead_code)]

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use assetpipe::config::CacheMode;
use assetpipe::engine::{RunSettings, Runner};
use assetpipe::graph::TaskGraph;
use assetpipe::pipeline::TransformOptions;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use tempfile::TempDir;

/// A throwaway project directory.
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp project dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Write `contents` to `rel`, creating parent directories.
    pub fn write(&self, rel: &str, contents: impl AsRef<[u8]>) -> &Self {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, contents).expect("write project file");
        self
    }

    pub fn read(&self, rel: &str) -> Vec<u8> {
        fs::read(self.path(rel)).unwrap_or_else(|e| panic!("read {rel}: {e}"))
    }

    pub fn read_string(&self, rel: &str) -> String {
        String::from_utf8(self.read(rel)).expect("utf-8 file")
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.path(rel).exists()
    }

    /// Files under `rel`, relative to it, sorted. Empty if `rel` is absent.
    pub fn list(&self, rel: &str) -> Vec<String> {
        let base = self.path(rel);
        let mut out = Vec::new();
        let mut stack = vec![base.clone()];
        while let Some(dir) = stack.pop() {
            let Ok(entries) = fs::read_dir(&dir) else {
                continue;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    stack.push(path);
                } else if let Ok(rel) = path.strip_prefix(&base) {
                    out.push(rel.to_string_lossy().replace('\\', "/"));
                }
            }
        }
        out.sort();
        out
    }

    /// A runner over `graph` rooted here, with an in-memory image cache.
    pub fn runner(&self, graph: TaskGraph) -> Runner {
        self.runner_with(graph, TransformOptions::default())
    }

    pub fn runner_with(&self, graph: TaskGraph, options: TransformOptions) -> Runner {
        let settings = RunSettings::new(self.root())
            .with_options(options)
            .with_cache_mode(CacheMode::Memory);
        Runner::new(graph, settings)
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}

/// A small PNG with a deterministic, mildly compressible pattern.
pub fn sample_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 16 % 256) as u8, (y * 16 % 256) as u8, ((x + y) % 4 * 60) as u8, 255])
    });
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).expect("encode sample png");
    out.into_inner()
}

/// A smooth RGB gradient saved as a high-quality JPEG, so re-encoding at a
/// normal quality shrinks it.
pub fn sample_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 255 / width.max(1)) as u8, (y * 255 / height.max(1)) as u8, 128])
    });
    let mut out = Cursor::new(Vec::new());
    img.write_with_encoder(JpegEncoder::new_with_quality(&mut out, 100))
        .expect("encode sample jpeg");
    out.into_inner()
}
