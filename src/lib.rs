//! # docpipe
//!
//! Build pipeline for a multi-language, multi-version documentation site
//! rendered by Jekyll. docpipe prepares everything the site generator
//! consumes (generated configs, data files, stylesheets, the plugin bundle),
//! runs the generator, serves the result with live reload, and manages the
//! versioned docs trees.
//!
//! # Version Rollover
//!
//! Documentation lives under `docs/<lang>/<version>/`, with `dev` as the
//! in-progress version, and a `VERSION` file names the latest release.
//! Releasing a version copies every language's `dev` tree and manual ToC to
//! the new version number, then records it:
//!
//! ```text
//! docs/en/dev/  ─┐                    docs/en/2.1/
//! docs/fr/dev/  ─┼─ copied in parallel ─▶ docs/fr/2.1/   then  VERSION := 2.1
//! toc/*_dev_manual.yml ─┘             toc/*_2-1_manual.yml
//! ```
//!
//! All copies run concurrently on the rayon pool. The operation fails fast on
//! the first copy error and does not undo copies that already finished; the
//! version file is only written when every copy succeeded. See [`rollover`].
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`rollover`] | Version rollover, publish, and snapshot over a copy backend |
//! | [`copier`] | `CopyBackend` trait and the filesystem implementation |
//! | [`version`] | Reading and atomically writing the `VERSION` file |
//! | [`naming`] | ToC file names and next-version computation |
//! | [`tasks`] | The task table and dependencies between tasks |
//! | [`pipeline`] | Runs tasks with their dependencies for one invocation |
//! | [`exec`] | External commands as data, behind the `CommandRunner` trait |
//! | [`site`] | Jekyll invocation and config layering |
//! | [`data`] | Generated `_defaults.yml`, `_version.yml`, versions list, ToC, fetched docs |
//! | [`styles`] | Less, Sass, and plain CSS compilation |
//! | [`bundle`] | Browserify plugin bundle, minified for production |
//! | [`server`] | browser-sync dev server and live reload |
//! | [`watch`] | Polling source watcher and change classification |
//! | [`checks`] | Link checking, HTML lint, bug-link rewriting |
//! | [`clean`] | Removal of generated files |
//! | [`config`] | `docpipe.toml` loading, merging, validation, build profile |
//! | [`layout`] | Project paths resolved against the root |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Build Profile Is a Value
//!
//! Dev vs. production is decided once from the command line and
//! `build.prod_by_default`, then passed to every task as a [`config::BuildProfile`].
//! No task reads a global mode. `--prod` together with `--nodocs` is rejected
//! before any work starts.
//!
//! ## Tools Are Commands, Not Libraries
//!
//! The site generator, style compilers, bundler, and dev server are external
//! programs. Each task builds a [`exec::CommandSpec`] and hands it to a
//! [`exec::CommandRunner`]; tests swap in a recording runner and assert on the
//! command lines instead of spawning anything. Program names are configurable
//! under `[tools]`.

pub mod bundle;
pub mod checks;
pub mod clean;
pub mod config;
pub mod copier;
pub mod data;
pub mod exec;
pub mod layout;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod rollover;
pub mod server;
pub mod site;
pub mod styles;
pub mod tasks;
pub mod version;
pub mod watch;

#[cfg(test)]
pub(crate) mod test_helpers;
