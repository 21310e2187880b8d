//! CLI output formatting.
//!
//! Progress goes to stdout as plain lines; diagnostics go through `tracing`
//! to stderr. A full build reads like this:
//!
//! ```text
//! ==> defaults
//! $ node tools/bin/gen_defaults.js www/docs 6.x
//! ==> version
//! ==> configs
//! ...
//! ==> build
//! $ bundle exec jekyll build --trace --config conf/_config.yml,...
//! ```
//!
//! A rollover lists every copy as it is scheduled:
//!
//! ```text
//! ==> newversion
//! www/docs/en/dev -> www/docs/en/2.1
//! www/_data/toc/en_dev_manual.yml -> www/_data/toc/en_2-1_manual.yml
//! version := 2.1
//! ```
//!
//! # Architecture
//!
//! Each kind of output has a `format_*` function for testability and a
//! `print_*` wrapper that writes to stdout. Format functions are pure.

use crate::exec::CommandSpec;
use crate::rollover::RolloverEvent;
use crate::tasks::Task;
use std::path::Path;

/// Echo of a command about to run.
pub fn format_command(spec: &CommandSpec) -> String {
    format!("$ {spec}")
}

pub fn print_command(spec: &CommandSpec) {
    println!("{}", format_command(spec));
}

pub fn format_task_header(task: Task) -> String {
    format!("==> {task}")
}

pub fn print_task_header(task: Task) {
    println!("{}", format_task_header(task));
}

pub fn format_removed(path: &Path) -> String {
    format!("removing {}", path.display())
}

pub fn print_removed(path: &Path) {
    println!("{}", format_removed(path));
}

/// Line announcing a task re-run by the watcher.
pub fn format_watch_trigger(task: Task) -> String {
    format!("==> {task} (sources changed)")
}

pub fn print_watch_trigger(task: Task) {
    println!("{}", format_watch_trigger(task));
}

/// Lines for one rollover progress event.
///
/// Finished copies print nothing; the plan was already shown when they
/// started, and a failure is reported as the task's error.
pub fn format_rollover_event(event: &RolloverEvent) -> Vec<String> {
    match event {
        RolloverEvent::Removed(path) => vec![format_removed(path)],
        RolloverEvent::CopyStarted(op) => vec![op.to_string()],
        RolloverEvent::CopyFinished(_) => Vec::new(),
        RolloverEvent::VersionRecorded(version) => vec![format!("version := {version}")],
    }
}
