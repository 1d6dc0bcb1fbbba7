// src/pipeline/mod.rs

//! File-level work of a single task.
//!
//! - [`source`] resolves globs into ordered inputs.
//! - [`transform`] sequences the pure steps; the steps themselves live in
//!   [`styles`], [`scripts`] and [`images`].
//! - [`cache`] is the content-addressed image cache.
//! - [`writer`] writes outputs and performs `clean`.

pub mod asset;
pub mod cache;
pub mod images;
pub mod scripts;
pub mod source;
pub mod styles;
pub mod transform;
pub mod writer;

pub use asset::Asset;
pub use cache::ImageCache;
pub use source::{collect_sources, read_sources, SourceEntry};
pub use transform::{apply_step, apply_steps, concat, StepContext, TransformOptions};
pub use writer::{clean_targets, write_assets};
