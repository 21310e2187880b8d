//! Task execution.
//!
//! A [`Pipeline`] holds everything one invocation needs: the loaded config,
//! the resolved layout, the build profile, and the command runner. Running a
//! task first runs its dependencies depth-first; a task that already ran in
//! this invocation is not run again.
//!
//! `serve` starts the dev server and, when it was the requested task, blocks
//! until the server exits. `watch` keeps the server running and re-runs
//! `styles`, `plugins` or `regen` as sources change. While a server started by
//! this pipeline is running, the asset tasks ask it to reload afterwards.

use crate::bundle;
use crate::checks;
use crate::clean;
use crate::config::{BuildProfile, PipelineConfig};
use crate::copier::FsCopier;
use crate::data;
use crate::exec::{CommandRunner, ExecError};
use crate::layout::{self, Layout};
use crate::output;
use crate::rollover::{RolloverError, RolloverManager};
use crate::server::{self, DevServer};
use crate::site;
use crate::styles::{self, StyleKind, StylesError};
use crate::tasks::Task;
use crate::version::{self, VersionError};
use crate::watch::{self, WatchError};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaskError {
    #[error(transparent)]
    Exec(#[from] ExecError),
    #[error(transparent)]
    Styles(#[from] StylesError),
    #[error(transparent)]
    Rollover(#[from] RolloverError),
    #[error(transparent)]
    Version(#[from] VersionError),
    #[error(transparent)]
    Watch(#[from] WatchError),
    #[error("Can't list docs languages in {path}: {source}")]
    Languages {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub struct Pipeline<R> {
    config: PipelineConfig,
    layout: Layout,
    profile: BuildProfile,
    runner: R,
    server: Option<DevServer>,
    publish_target: Option<String>,
    completed: Vec<Task>,
}

impl<R: CommandRunner> Pipeline<R> {
    pub fn new(config: PipelineConfig, root: &Path, profile: BuildProfile, runner: R) -> Self {
        let layout = Layout::new(root, &config.paths);
        Self {
            config,
            layout,
            profile,
            runner,
            server: None,
            publish_target: None,
            completed: Vec::new(),
        }
    }

    /// Publish this version in `newversion` instead of the computed next one.
    pub fn with_publish_target(mut self, target: Option<String>) -> Self {
        self.publish_target = target;
        self
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Tasks run so far, in the order they ran.
    pub fn completed(&self) -> &[Task] {
        &self.completed
    }

    /// Run `task` after its dependencies.
    pub fn run(&mut self, task: Task) -> Result<(), TaskError> {
        self.visit(task)?;
        if task == Task::Serve {
            if let Some(server) = self.server.take() {
                server.wait()?;
            }
        }
        Ok(())
    }

    fn visit(&mut self, task: Task) -> Result<(), TaskError> {
        if self.completed.contains(&task) {
            return Ok(());
        }
        for &dep in task.deps() {
            self.visit(dep)?;
        }
        output::print_task_header(task);
        self.execute(task)?;
        if task.reloads() && self.server.is_some() {
            server::reload(&self.runner, &self.config.server, &self.config.tools);
        }
        self.completed.push(task);
        Ok(())
    }

    fn out_dir(&self) -> PathBuf {
        self.layout.out_dir(self.profile.mode).to_path_buf()
    }

    fn latest_version(&self) -> Result<String, VersionError> {
        version::read_version(&self.layout.version_file)
    }

    fn execute(&mut self, task: Task) -> Result<(), TaskError> {
        let tools = &self.config.tools;
        let runner: &dyn CommandRunner = &self.runner;
        match task {
            Task::Build | Task::Jekyll => {
                site::build_site(runner, &self.layout, self.profile, &self.config.build, tools)?;
            }
            Task::Regen => {
                // reload runs after every regen, server or not
                if self.server.is_none() {
                    server::reload(runner, &self.config.server, tools);
                }
            }
            Task::Serve => {
                let spec = server::serve_command(&self.out_dir(), &self.config.server, tools);
                self.server = Some(DevServer::start(&spec)?);
            }
            Task::Watch => self.watch()?,
            Task::Reload => server::reload(runner, &self.config.server, tools),
            Task::Defaults => {
                let latest = self.latest_version()?;
                data::gen_defaults(runner, &self.layout, tools, &latest)?;
            }
            Task::Version => {
                let latest = self.latest_version()?;
                data::write_version_config(&self.layout, &latest)?;
            }
            Task::DocsVersions => data::gen_docs_versions(runner, &self.layout, tools)?,
            Task::Toc => {
                data::gen_toc(runner, &self.layout, self.profile, tools)?;
            }
            Task::Fetch => {
                data::fetch_docs(runner, &self.layout, tools)?;
            }
            Task::Less => self.build_styles(StyleKind::Less)?,
            Task::Css => self.build_styles(StyleKind::Css)?,
            Task::Sass => self.build_styles(StyleKind::Sass)?,
            Task::Plugins => {
                let out_dir = self.out_dir();
                bundle::bundle_plugins(runner, &self.layout, self.profile, &out_dir, tools)?;
            }
            Task::NewVersion => {
                let target = match &self.publish_target {
                    Some(target) => target.clone(),
                    None => version::next_after(&self.latest_version()?)?,
                };
                self.with_rollover(|manager| manager.publish_new_version(&target))?;
            }
            Task::Snap => {
                let current = self.latest_version()?;
                self.with_rollover(|manager| manager.snapshot_current_version(&current))?;
            }
            Task::CheckLinks => checks::check_links(runner, &self.config.server, tools)?,
            Task::Lint => {
                checks::lint(runner, &self.layout, tools)?;
            }
            Task::LinkBugs => checks::link_bugs(runner, &self.layout)?,
            Task::Clean => {
                clean::clean(&self.layout)?;
            }
            Task::Configs | Task::Data | Task::Styles => {}
        }
        Ok(())
    }

    fn build_styles(&self, kind: StyleKind) -> Result<(), StylesError> {
        let written = styles::build_styles(
            &self.runner,
            &self.layout,
            &self.out_dir(),
            &self.config.tools,
            kind,
        )?;
        tracing::debug!(count = written.len(), "{} stylesheets written", kind.extension());
        Ok(())
    }

    /// Run a rollover operation on the real docs tree, printing progress.
    fn with_rollover<F>(&self, operation: F) -> Result<(), TaskError>
    where
        F: FnOnce(&RolloverManager<FsCopier>) -> Result<(), RolloverError>,
    {
        let docs_dir = self.layout.docs_dir();
        let languages =
            layout::list_languages(&docs_dir).map_err(|source| TaskError::Languages {
                path: docs_dir.clone(),
                source,
            })?;
        tracing::info!(?languages, "docs languages");

        let (tx, rx) = mpsc::channel();
        let printer = std::thread::spawn(move || {
            for event in rx {
                for line in output::format_rollover_event(&event) {
                    println!("{}", line);
                }
            }
        });
        let manager =
            RolloverManager::new(FsCopier::new(), &self.layout, languages).with_events(tx);
        let result = operation(&manager);
        // The manager holds the only sender, so the printer ends here even
        // when copies abandoned after a failure are still running.
        drop(manager);
        let _ = printer.join();
        Ok(result?)
    }

    fn watch(&mut self) -> Result<(), TaskError> {
        let layout = self.layout.clone();
        let interval = Duration::from_millis(self.config.watch.interval_ms);
        watch::watch_changes(&layout, interval, |actions| {
            for &action in actions {
                let task = Task::from(action);
                output::print_watch_trigger(task);
                self.completed.retain(|done| !is_rerun_by(task, *done));
                if let Err(err) = self.visit(task) {
                    tracing::error!("{task} failed: {err}");
                }
            }
        })?;
        Ok(())
    }
}

/// Whether re-running `task` also re-runs `done`.
fn is_rerun_by(task: Task, done: Task) -> bool {
    task == done || task.deps().iter().any(|&dep| is_rerun_by(dep, done))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildMode;
    use crate::exec::tests::MockRunner;
    use crate::test_helpers::DocsFixture;
    use std::fs;

    fn pipeline(fixture: &DocsFixture, profile: BuildProfile) -> Pipeline<MockRunner> {
        Pipeline::new(
            PipelineConfig::default(),
            fixture.root(),
            profile,
            MockRunner::new(),
        )
    }

    fn prod() -> BuildProfile {
        BuildProfile {
            mode: BuildMode::Prod,
            nodocs: false,
        }
    }

    #[test]
    fn build_runs_dependencies_first() {
        let fixture = DocsFixture::new().version("2.0").language("en");
        let mut pipeline = pipeline(&fixture, BuildProfile::default());
        pipeline.run(Task::Build).unwrap();

        assert_eq!(
            pipeline.completed(),
            &[
                Task::Defaults,
                Task::Version,
                Task::Configs,
                Task::Fetch,
                Task::Toc,
                Task::DocsVersions,
                Task::Data,
                Task::Less,
                Task::Css,
                Task::Sass,
                Task::Styles,
                Task::Plugins,
                Task::Build,
            ]
        );
        let programs: Vec<String> = pipeline
            .runner()
            .get_commands()
            .into_iter()
            .map(|c| c.program)
            .collect();
        assert_eq!(programs, vec!["node", "node", "node", "browserify", "bundle"]);
    }

    #[test]
    fn version_task_writes_version_config() {
        let fixture = DocsFixture::new().version("2.0");
        let mut pipeline = pipeline(&fixture, BuildProfile::default());
        pipeline.run(Task::Version).unwrap();
        assert_eq!(
            fs::read_to_string(pipeline.layout().version_config()).unwrap(),
            "latest_docs_version: 2.0\n"
        );
    }

    #[test]
    fn missing_version_file_fails_configs() {
        let fixture = DocsFixture::new();
        let mut pipeline = pipeline(&fixture, BuildProfile::default());
        let err = pipeline.run(Task::Configs).unwrap_err();
        assert!(matches!(err, TaskError::Version(VersionError::Io { .. })));
        assert!(pipeline.completed().is_empty());
    }

    #[test]
    fn prod_build_generates_toc() {
        let fixture = DocsFixture::new().version("2.0").language("en");
        let mut pipeline = pipeline(&fixture, prod());
        pipeline.run(Task::Data).unwrap();
        let lines = pipeline.runner().command_lines();
        assert!(lines.iter().any(|l| l.contains("toc.js")));
    }

    #[test]
    fn each_task_runs_once() {
        let fixture = DocsFixture::new().version("2.0");
        let mut pipeline = pipeline(&fixture, BuildProfile::default());
        pipeline.run(Task::Configs).unwrap();
        pipeline.run(Task::Defaults).unwrap();
        let count = pipeline
            .completed()
            .iter()
            .filter(|&&t| t == Task::Defaults)
            .count();
        assert_eq!(count, 1);
        assert_eq!(pipeline.runner().get_commands().len(), 1);
    }

    #[test]
    fn failing_dependency_stops_the_build() {
        let fixture = DocsFixture::new().version("2.0");
        let mut pipeline = Pipeline::new(
            PipelineConfig::default(),
            fixture.root(),
            BuildProfile::default(),
            MockRunner::new().with_failure("node", ""),
        );
        assert!(pipeline.run(Task::Build).is_err());
        assert!(!pipeline.completed().contains(&Task::Build));
        assert!(
            !pipeline
                .runner()
                .get_commands()
                .iter()
                .any(|c| c.program == "bundle")
        );
    }

    #[test]
    fn regen_always_reloads() {
        let fixture = DocsFixture::new().version("2.0");
        let mut pipeline = pipeline(&fixture, BuildProfile::default());
        pipeline.run(Task::Regen).unwrap();
        assert_eq!(
            pipeline.runner().command_lines().last().unwrap(),
            "browser-sync reload --port 3000"
        );
    }

    #[test]
    fn styles_without_server_does_not_reload() {
        let fixture = DocsFixture::new().version("2.0");
        let mut pipeline = pipeline(&fixture, BuildProfile::default());
        pipeline.run(Task::Styles).unwrap();
        assert!(pipeline.runner().get_commands().is_empty());
    }

    #[test]
    fn newversion_publishes_next_version() {
        let fixture = DocsFixture::new()
            .version("2.0")
            .language("en")
            .language("fr");
        let mut pipeline = pipeline(&fixture, BuildProfile::default());
        pipeline.run(Task::NewVersion).unwrap();

        let layout = fixture.layout();
        assert!(layout.docs_dir().join("en/2.1/index.md").exists());
        assert!(layout.docs_dir().join("fr/2.1/index.md").exists());
        assert!(layout.toc_dir().join("fr_2-1_manual.yml").exists());
        assert_eq!(fs::read_to_string(&layout.version_file).unwrap(), "2.1\n");
    }

    #[test]
    fn newversion_with_explicit_target() {
        let fixture = DocsFixture::new().version("2.0").language("en");
        let mut pipeline =
            pipeline(&fixture, BuildProfile::default()).with_publish_target(Some("3.0".into()));
        pipeline.run(Task::NewVersion).unwrap();
        assert!(pipeline.layout().docs_dir().join("en/3.0").is_dir());
        assert_eq!(
            fs::read_to_string(&pipeline.layout().version_file).unwrap(),
            "3.0\n"
        );
    }

    #[test]
    fn snap_replaces_current_version() {
        let fixture = DocsFixture::new()
            .version("2.0")
            .language("en")
            .released("en", "2.0", "stale.md");
        let mut pipeline = pipeline(&fixture, BuildProfile::default());
        pipeline.run(Task::Snap).unwrap();

        let current = pipeline.layout().docs_dir().join("en/2.0");
        assert!(current.join("index.md").exists());
        assert!(!current.join("stale.md").exists());
    }

    #[test]
    fn rerun_covers_dependencies() {
        assert!(is_rerun_by(Task::Styles, Task::Less));
        assert!(is_rerun_by(Task::Regen, Task::Jekyll));
        assert!(!is_rerun_by(Task::Plugins, Task::Styles));
    }
}
