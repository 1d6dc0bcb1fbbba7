// tests/config_loading.rs

mod common;
use crate::common::init_tracing;

use std::error::Error;
use std::io::Write;
use std::path::PathBuf;

use tempfile::NamedTempFile;

use assetpipe::config::{load_and_validate, CacheMode, ConfigFile};
use assetpipe::engine::Runner;
use assetpipe::errors::PipelineError;
use assetpipe::graph::{Plan, Step, TaskKind};
use assetpipe_test_utils::builders::{ConfigFileBuilder, TaskConfigBuilder};

type TestResult = Result<(), Box<dyn Error>>;

fn load_str(toml: &str) -> Result<ConfigFile, PipelineError> {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{toml}").unwrap();
    load_and_validate(file.path())
}

#[test]
fn demo_project_loads_and_resolves() -> TestResult {
    init_tracing();

    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let config_path = manifest_dir.join("demos/Assetpipe.toml");

    let cfg = load_and_validate(&config_path)?;
    assert_eq!(cfg.root(), manifest_dir.join("demos"));
    assert_eq!(cfg.serve.port, 3000);
    assert_eq!(cfg.serve.proxy, "http://127.0.0.1:5000");
    assert_eq!(cfg.config.image_cache, CacheMode::File);
    assert_eq!(cfg.watch.len(), 4);

    let runner = Runner::from_config(&cfg)?;
    let plan = runner.graph().resolve("default")?;
    assert!(matches!(plan, Plan::Series { .. }));

    let names = plan.task_names();
    assert_eq!(names.first(), Some(&"clean"));
    for vendor in [
        "bootstrap-JS",
        "bootstrap-CSS",
        "bootstrap-SCSS",
        "KaTeX-JS",
        "KaTeX-CSS",
        "KaTeX-fonts",
        "KaTeX-auto-render",
        "jQuery",
    ] {
        assert!(names.contains(&vendor), "missing {vendor}");
    }

    let scripts = runner.graph().task("scripts").expect("scripts task");
    match scripts.kind() {
        TaskKind::Transform(t) => assert_eq!(
            t.steps,
            vec![Step::Concat("app.js".to_string()), Step::MinifyJs]
        ),
        other => panic!("expected transform task, got {other:?}"),
    }
    Ok(())
}

#[test]
fn defaults_apply_when_sections_are_missing() -> TestResult {
    let cfg = load_str(
        r#"
[task.js]
src = ["a.js"]
dest = "out"
"#,
    )?;

    assert_eq!(cfg.serve.port, 3000);
    assert_eq!(cfg.config.browsers, vec!["defaults".to_string()]);
    assert_eq!(cfg.config.jpeg_quality, 90);
    assert_eq!(cfg.config.concat_separator, "");
    assert_eq!(cfg.config.debounce_ms, 100);
    assert_eq!(cfg.config.image_cache, CacheMode::File);
    Ok(())
}

#[test]
fn aggregate_cycle_returns_structured_error() {
    let result = load_str(
        r#"
[task.js]
src = ["a.js"]
dest = "out"

[aggregate.a]
series = ["js", "b"]

[aggregate.b]
parallel = ["a"]
"#,
    );

    match result {
        Err(PipelineError::DagCycle(msg)) => {
            assert!(msg.contains("cycle detected"));
            assert!(msg.contains('a') || msg.contains('b'));
        }
        other => panic!("expected DagCycle, got {other:?}"),
    }
}

#[test]
fn unknown_aggregate_child_is_task_not_found() {
    let result = load_str(
        r#"
[task.js]
src = ["a.js"]
dest = "out"

[aggregate.build]
parallel = ["js", "css"]
"#,
    );

    match result {
        Err(PipelineError::TaskNotFound(msg)) => {
            assert!(msg.contains("css"));
            assert!(msg.contains("build"));
        }
        other => panic!("expected TaskNotFound, got {other:?}"),
    }
}

#[test]
fn unknown_watch_target_is_task_not_found() {
    let raw = ConfigFileBuilder::new()
        .with_task("js", TaskConfigBuilder::new("out").src("a.js").build())
        .with_watch("src/**/*.js", "scripts")
        .raw();

    match ConfigFile::try_from(raw) {
        Err(PipelineError::TaskNotFound(msg)) => assert!(msg.contains("scripts")),
        other => panic!("expected TaskNotFound, got {other:?}"),
    }
}

#[test]
fn name_shared_by_task_and_aggregate_is_duplicate() {
    let raw = ConfigFileBuilder::new()
        .with_task("js", TaskConfigBuilder::new("out").src("a.js").build())
        .with_series("js", &["js"])
        .raw();

    assert!(matches!(
        ConfigFile::try_from(raw),
        Err(PipelineError::DuplicateTask(_))
    ));
}

#[test]
fn watch_is_a_reserved_name() {
    let raw = ConfigFileBuilder::new()
        .with_task("watch", TaskConfigBuilder::new("out").src("a.js").build())
        .raw();

    match ConfigFile::try_from(raw) {
        Err(PipelineError::ConfigError(msg)) => assert!(msg.contains("reserved")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn clean_cannot_be_mixed_with_src() {
    let mut task = TaskConfigBuilder::clean(&["static"]).build();
    task.src.push("a.js".to_string());
    let raw = ConfigFileBuilder::new().with_task("clean", task).raw();

    assert!(matches!(
        ConfigFile::try_from(raw),
        Err(PipelineError::ConfigError(_))
    ));
}

#[test]
fn out_of_range_values_are_rejected() {
    let raw = ConfigFileBuilder::new()
        .with_task("js", TaskConfigBuilder::new("out").src("a.js").build())
        .with_config(|c| c.jpeg_quality = 0)
        .raw();
    assert!(matches!(
        ConfigFile::try_from(raw),
        Err(PipelineError::ConfigError(_))
    ));

    let result = load_str(
        r#"
[serve]
proxy = "localhost:5000"

[task.js]
src = ["a.js"]
dest = "out"
"#,
    );
    match result {
        Err(PipelineError::ConfigError(msg)) => assert!(msg.contains("proxy")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn invalid_glob_is_reported() {
    let raw = ConfigFileBuilder::new()
        .with_task("js", TaskConfigBuilder::new("out").src("src/[a.js").build())
        .raw();

    match ConfigFile::try_from(raw) {
        Err(PipelineError::ConfigError(msg)) => assert!(msg.contains("invalid glob")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn unknown_keys_and_steps_fail_to_parse() {
    let unknown_key = load_str(
        r#"
[task.js]
src = ["a.js"]
dest = "out"
cmd = "echo"
"#,
    );
    assert!(matches!(unknown_key, Err(PipelineError::TomlError { .. })));

    let unknown_step = load_str(
        r#"
[task.js]
src = ["a.js"]
dest = "out"
steps = ["uglify"]
"#,
    );
    assert!(matches!(unknown_step, Err(PipelineError::TomlError { .. })));
}

#[test]
fn toml_errors_name_the_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "[task.js\nsrc = [\"a.js\"]\n").unwrap();

    let err = load_and_validate(file.path()).unwrap_err();
    match &err {
        PipelineError::TomlError { path, .. } => assert_eq!(path, file.path()),
        other => panic!("expected TomlError, got {other:?}"),
    }
    let file_name = file.path().file_name().unwrap().to_string_lossy().into_owned();
    assert!(err.to_string().contains(&file_name), "{err}");
    assert!(err.source().is_some());
}

#[test]
fn missing_file_is_config_error() {
    let result = load_and_validate("/definitely/not/here/Assetpipe.toml");
    assert!(matches!(result, Err(PipelineError::ConfigError(_))));
}
