// tests/images.rs

mod common;
use crate::common::{init_tracing, sample_jpeg, sample_png, with_timeout, Project};

use assetpipe::config::CacheMode;
use assetpipe::engine::{RunSettings, Runner};
use assetpipe::graph::{Step, Task, TaskGraph};
use assetpipe::pipeline::images::{compress_image, ImageKind};
use assetpipe::pipeline::ImageCache;

fn images_graph() -> TaskGraph {
    let mut graph = TaskGraph::new();
    graph
        .define_task(Task::new(
            "images",
            ["assets/img/**/*"],
            "static/img",
            vec![Step::CompressImages],
        ))
        .unwrap();
    graph
}

#[tokio::test]
async fn compressed_png_decodes_to_the_same_pixels() {
    init_tracing();
    let project = Project::new();
    let original = sample_png(64, 48);
    project.write("assets/img/logo.png", &original);

    with_timeout(project.runner(images_graph()).run("images")).await.unwrap();

    let output = project.read("static/img/logo.png");
    assert!(output.len() <= original.len());

    let before = image::load_from_memory(&original).unwrap().to_rgba8();
    let after = image::load_from_memory(&output).unwrap().to_rgba8();
    assert_eq!(before.dimensions(), after.dimensions());
    assert_eq!(before.as_raw(), after.as_raw());
}

fn mean_channel_error(a: &image::RgbImage, b: &image::RgbImage) -> f64 {
    let total: u64 = a
        .as_raw()
        .iter()
        .zip(b.as_raw())
        .map(|(x, y)| u64::from(x.abs_diff(*y)))
        .sum();
    total as f64 / a.as_raw().len() as f64
}

#[tokio::test]
async fn compressed_jpeg_keeps_its_content_and_settles_on_rerun() {
    init_tracing();
    let project = Project::new();
    let original = sample_jpeg(64, 48);
    project.write("assets/img/photo.jpg", &original);

    with_timeout(project.runner(images_graph()).run("images")).await.unwrap();

    let first = project.read("static/img/photo.jpg");
    assert!(first.len() < original.len(), "quality 90 should beat quality 100");

    let before = image::load_from_memory(&original).unwrap().to_rgb8();
    let after = image::load_from_memory(&first).unwrap().to_rgb8();
    assert_eq!(before.dimensions(), after.dimensions());
    let error = mean_channel_error(&before, &after);
    assert!(error < 8.0, "mean channel error {error}");

    // Feed the output back in as the source and run the step again.
    project.write("assets/img/photo.jpg", &first);
    with_timeout(project.runner(images_graph()).run("images")).await.unwrap();

    let second = project.read("static/img/photo.jpg");
    assert!(second.len() <= first.len());
    let drift = first.len() - second.len();
    assert!(drift * 10 <= first.len(), "size drifted by {drift} bytes");
    let again = image::load_from_memory(&second).unwrap().to_rgb8();
    assert_eq!(again.dimensions(), (64, 48));
}

#[test]
fn grayscale_jpeg_stays_grayscale() {
    let img = image::GrayImage::from_fn(40, 30, |x, y| image::Luma([((x + y) * 4) as u8]));
    let mut original = std::io::Cursor::new(Vec::new());
    img.write_with_encoder(image::codecs::jpeg::JpegEncoder::new_with_quality(
        &mut original,
        100,
    ))
    .unwrap();
    let original = original.into_inner();

    let out = compress_image(&original, ImageKind::Jpeg, 75).unwrap();

    let decoded = image::load_from_memory(&out).unwrap();
    assert_eq!(decoded.color(), image::ColorType::L8);
    assert_eq!((decoded.width(), decoded.height()), (40, 30));
}

#[test]
fn jpeg_quality_controls_output_size() {
    let original = sample_jpeg(96, 64);

    let low = compress_image(&original, ImageKind::Jpeg, 40).unwrap();
    let high = compress_image(&original, ImageKind::Jpeg, 95).unwrap();

    assert!(low.len() < high.len());
    assert_eq!(image::load_from_memory(&low).unwrap().to_rgb8().dimensions(), (96, 64));
}

#[test]
fn compression_is_near_idempotent() {
    let original = sample_png(32, 32);

    let once = compress_image(&original, ImageKind::Png, 90).unwrap();
    let once = if once.len() < original.len() { once } else { original };
    let twice = compress_image(&once, ImageKind::Png, 90).unwrap();
    let twice = if twice.len() < once.len() { twice } else { once.clone() };

    let drift = once.len().abs_diff(twice.len());
    assert!(drift * 100 <= once.len(), "size drifted by {drift} bytes");
}

#[test]
fn svg_whitespace_and_comments_are_removed() {
    let svg = b"<svg>\n  <!-- logo -->\n  <g>\n    <path d=\"M0 0\"/>\n  </g>\n</svg>\n";
    let out = compress_image(svg, ImageKind::Svg, 90).unwrap();
    assert_eq!(out, b"<svg><g><path d=\"M0 0\"/></g></svg>");
}

#[tokio::test]
async fn other_files_pass_through() {
    let project = Project::new();
    project
        .write("assets/img/readme.txt", "not an image")
        .write("assets/img/icons/dot.svg", "<svg> <circle/> </svg>");

    with_timeout(project.runner(images_graph()).run("images")).await.unwrap();

    assert_eq!(project.read_string("static/img/readme.txt"), "not an image");
    assert_eq!(
        project.read_string("static/img/icons/dot.svg"),
        "<svg><circle/></svg>"
    );
}

#[tokio::test]
async fn file_cache_persists_between_runners() {
    let project = Project::new();
    project.write("assets/img/logo.png", sample_png(16, 16));

    let settings = RunSettings::new(project.root()).with_cache_mode(CacheMode::File);
    let runner = Runner::new(images_graph(), settings);
    with_timeout(runner.run("images")).await.unwrap();

    let entries = project.list(".assetpipe/image-cache");
    assert_eq!(entries.len(), 1);

    // A fresh cache over the same directory sees the stored entry.
    let cache = ImageCache::new(CacheMode::File, project.root());
    assert!(cache.get(&entries[0]).is_some());
    assert_eq!(cache.get(&entries[0]), Some(project.read("static/img/logo.png")));
}

#[test]
fn memory_cache_does_not_touch_disk() {
    let dir = tempfile::TempDir::new().unwrap();
    let cache = ImageCache::new(CacheMode::Memory, dir.path());
    let key = ImageCache::key("Png:q90", b"bytes");

    assert_eq!(cache.get(&key), None);
    cache.put(&key, b"small").unwrap();
    assert_eq!(cache.get(&key), Some(b"small".to_vec()));
    assert!(!dir.path().join(".assetpipe").exists());
}
