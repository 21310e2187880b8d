//! Site checks and maintenance helpers.
//!
//! | Task | Command |
//! |---|---|
//! | `checklinks` | link checker against the running dev server |
//! | `lint` | `htmllint` over every `.html` source file |
//! | `link-bugs` | `linkify-bugs.sh` over the blog posts |

use crate::config::{ServerConfig, ToolsConfig};
use crate::exec::{CommandRunner, CommandSpec, ExecError};
use crate::layout::Layout;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// URL the dev server answers on.
pub fn local_url(server: &ServerConfig) -> String {
    format!("http://localhost:{}/", server.port)
}

pub fn checklinks_command(server: &ServerConfig, tools: &ToolsConfig) -> CommandSpec {
    CommandSpec::new(&tools.link_checker)
        .arg(local_url(server))
        .arg("--recurse")
}

/// Crawl the running dev server for broken links.
pub fn check_links(
    runner: &dyn CommandRunner,
    server: &ServerConfig,
    tools: &ToolsConfig,
) -> Result<(), ExecError> {
    runner.run(&checklinks_command(server, tools))
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|n| n.starts_with('.') || n == "node_modules")
}

/// HTML sources under `source_dir`, sorted.
pub fn html_sources(source_dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(source_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "html"))
        .collect()
}

/// Lint every HTML source. Nothing to lint is not an error.
pub fn lint(
    runner: &dyn CommandRunner,
    layout: &Layout,
    tools: &ToolsConfig,
) -> Result<usize, ExecError> {
    let files = html_sources(&layout.source_dir);
    if files.is_empty() {
        tracing::info!("no HTML sources to lint");
        return Ok(0);
    }
    let mut spec = CommandSpec::new(&tools.htmllint);
    for file in &files {
        spec = spec.path_arg(file);
    }
    runner.run(&spec)?;
    Ok(files.len())
}

pub fn link_bugs_command(layout: &Layout) -> CommandSpec {
    CommandSpec::new(layout.bin("linkify-bugs.sh").to_string_lossy()).path_arg(&layout.posts_dir())
}

/// Turn bug references in blog posts into links.
pub fn link_bugs(runner: &dyn CommandRunner, layout: &Layout) -> Result<(), ExecError> {
    runner.run(&link_bugs_command(layout))
}
