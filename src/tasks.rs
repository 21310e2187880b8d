//! The task table.
//!
//! Every command the CLI offers is a [`Task`]. A task declares the tasks it
//! depends on; [`Pipeline`](crate::pipeline::Pipeline) runs those first, each
//! at most once per invocation.
//!
//! ```text
//! watch ─▶ serve ─▶ build ─┬─▶ configs ─┬─▶ defaults
//!                          │            └─▶ version
//!                          ├─▶ data ────┬─▶ toc ─▶ fetch
//!                          │            └─▶ docs-versions
//!                          ├─▶ styles ──┬─▶ less
//!                          │            ├─▶ css
//!                          │            └─▶ sass
//!                          └─▶ plugins
//! regen ─▶ jekyll
//! ```

use crate::watch::WatchAction;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    Build,
    Jekyll,
    Regen,
    Serve,
    Watch,
    Reload,
    Configs,
    Defaults,
    Version,
    Data,
    DocsVersions,
    Toc,
    Fetch,
    Styles,
    Less,
    Css,
    Sass,
    Plugins,
    NewVersion,
    Snap,
    CheckLinks,
    Lint,
    LinkBugs,
    Clean,
}

impl Task {
    pub const ALL: [Task; 24] = [
        Task::Build,
        Task::Jekyll,
        Task::Regen,
        Task::Serve,
        Task::Watch,
        Task::Reload,
        Task::Configs,
        Task::Defaults,
        Task::Version,
        Task::Data,
        Task::DocsVersions,
        Task::Toc,
        Task::Fetch,
        Task::Styles,
        Task::Less,
        Task::Css,
        Task::Sass,
        Task::Plugins,
        Task::NewVersion,
        Task::Snap,
        Task::CheckLinks,
        Task::Lint,
        Task::LinkBugs,
        Task::Clean,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Task::Build => "build",
            Task::Jekyll => "jekyll",
            Task::Regen => "regen",
            Task::Serve => "serve",
            Task::Watch => "watch",
            Task::Reload => "reload",
            Task::Configs => "configs",
            Task::Defaults => "defaults",
            Task::Version => "version",
            Task::Data => "data",
            Task::DocsVersions => "docs-versions",
            Task::Toc => "toc",
            Task::Fetch => "fetch",
            Task::Styles => "styles",
            Task::Less => "less",
            Task::Css => "css",
            Task::Sass => "sass",
            Task::Plugins => "plugins",
            Task::NewVersion => "newversion",
            Task::Snap => "snap",
            Task::CheckLinks => "checklinks",
            Task::Lint => "lint",
            Task::LinkBugs => "link-bugs",
            Task::Clean => "clean",
        }
    }

    /// Tasks that must have run before this one, in run order.
    pub fn deps(self) -> &'static [Task] {
        match self {
            Task::Build => &[Task::Configs, Task::Data, Task::Styles, Task::Plugins],
            Task::Regen => &[Task::Jekyll],
            Task::Serve => &[Task::Build],
            Task::Watch => &[Task::Serve],
            Task::Configs => &[Task::Defaults, Task::Version],
            Task::Data => &[Task::Toc, Task::DocsVersions],
            Task::Toc => &[Task::Fetch],
            Task::Styles => &[Task::Less, Task::Css, Task::Sass],
            _ => &[],
        }
    }

    /// Whether the task refreshes what a running dev server shows.
    pub fn reloads(self) -> bool {
        matches!(self, Task::Styles | Task::Plugins | Task::Regen)
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<WatchAction> for Task {
    fn from(action: WatchAction) -> Self {
        match action {
            WatchAction::Styles => Task::Styles,
            WatchAction::Plugins => Task::Plugins,
            WatchAction::Regen => Task::Regen,
        }
    }
}
