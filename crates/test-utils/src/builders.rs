#![allow(dead_code)]

use assetpipe::config::{
    AggregateConfig, ConfigFile, ConfigSection, RawConfigFile, TaskConfig, WatchConfig,
};
use assetpipe::graph::Step;

/// Builder for `RawConfigFile` / `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn with_series(mut self, name: &str, children: &[&str]) -> Self {
        self.config.aggregate.insert(
            name.to_string(),
            AggregateConfig {
                series: Some(children.iter().map(|c| c.to_string()).collect()),
                parallel: None,
            },
        );
        self
    }

    pub fn with_parallel(mut self, name: &str, children: &[&str]) -> Self {
        self.config.aggregate.insert(
            name.to_string(),
            AggregateConfig {
                series: None,
                parallel: Some(children.iter().map(|c| c.to_string()).collect()),
            },
        );
        self
    }

    pub fn with_watch(mut self, glob: &str, run: &str) -> Self {
        self.config.watch.push(WatchConfig {
            glob: vec![glob.to_string()],
            exclude: Vec::new(),
            run: run.to_string(),
        });
        self
    }

    pub fn with_config(mut self, f: impl FnOnce(&mut ConfigSection)) -> Self {
        f(&mut self.config.config);
        self
    }

    /// The unvalidated file, for exercising validation errors.
    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    /// A transform task writing into `dest`.
    pub fn new(dest: &str) -> Self {
        Self {
            task: TaskConfig {
                dest: Some(dest.to_string()),
                ..TaskConfig::default()
            },
        }
    }

    /// A clean task removing `targets`.
    pub fn clean(targets: &[&str]) -> Self {
        Self {
            task: TaskConfig {
                clean: targets.iter().map(|t| t.to_string()).collect(),
                ..TaskConfig::default()
            },
        }
    }

    pub fn src(mut self, pattern: &str) -> Self {
        self.task.src.push(pattern.to_string());
        self
    }

    pub fn base(mut self, base: &str) -> Self {
        self.task.base = Some(base.to_string());
        self
    }

    pub fn step(mut self, step: Step) -> Self {
        self.task.steps.push(step);
        self
    }

    pub fn include_path(mut self, path: &str) -> Self {
        self.task.include_paths.push(path.to_string());
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}
