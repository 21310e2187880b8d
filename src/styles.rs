//! Stylesheet compilation.
//!
//! Sources live under `static/css-src/` and come in three kinds, each with
//! its own task:
//!
//! | Task | Sources | Compiler |
//! |---|---|---|
//! | `less` | `*.less` | `lessc <file>` (stdout) |
//! | `sass` | `*.scss` (not `_partials`) | `sass <file>` (stdout) |
//! | `css` | `*.css` | copied as-is |
//!
//! Every result gets empty YAML front matter prepended so the site generator
//! treats it as a page, and is written twice: into `static/css/` in the
//! source tree (so the next site build picks it up) and into the same place
//! in the active output directory (so a running dev server sees it without a
//! rebuild). Relative paths under `css-src/` are preserved.
//!
//! A `lessc` failure aborts the task. A `sass` failure is logged and that
//! file is skipped.

use crate::config::ToolsConfig;
use crate::exec::{self, CommandRunner, CommandSpec, ExecError};
use crate::layout::{Layout, YAML_FRONT_MATTER};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum StylesError {
    #[error("Style compiler error: {0}")]
    Exec(#[from] ExecError),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleKind {
    Less,
    Sass,
    Css,
}

impl StyleKind {
    pub fn extension(self) -> &'static str {
        match self {
            StyleKind::Less => "less",
            StyleKind::Sass => "scss",
            StyleKind::Css => "css",
        }
    }

    fn accepts(self, path: &Path) -> bool {
        if path.extension().and_then(|e| e.to_str()) != Some(self.extension()) {
            return false;
        }
        // Sass partials are only pulled in through @import
        let partial = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with('_'));
        !(self == StyleKind::Sass && partial)
    }
}

/// Source files of one kind under `css_src`, sorted.
pub fn find_sources(css_src: &Path, kind: StyleKind) -> Result<Vec<PathBuf>, StylesError> {
    if !css_src.is_dir() {
        return Ok(Vec::new());
    }
    let mut sources = Vec::new();
    for entry in WalkDir::new(css_src).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() && kind.accepts(entry.path()) {
            sources.push(entry.into_path());
        }
    }
    Ok(sources)
}

/// Compiled stylesheet contents, or `None` when the file was skipped.
fn compile(
    runner: &dyn CommandRunner,
    tools: &ToolsConfig,
    kind: StyleKind,
    source: &Path,
) -> Result<Option<Vec<u8>>, StylesError> {
    match kind {
        StyleKind::Css => fs::read(source).map(Some).map_err(|e| StylesError::Io {
            path: source.to_path_buf(),
            source: e,
        }),
        StyleKind::Less => {
            let spec = CommandSpec::new(&tools.lessc).path_arg(source);
            Ok(Some(runner.capture(&spec)?.check(&spec)?))
        }
        StyleKind::Sass => {
            let spec = CommandSpec::new(&tools.sass).path_arg(source);
            match runner.capture(&spec)?.check(&spec) {
                Ok(css) => Ok(Some(css)),
                Err(err) => {
                    tracing::error!(source = %source.display(), "{err}");
                    Ok(None)
                }
            }
        }
    }
}

/// Compile every source of `kind` and write both copies of each result.
///
/// Returns the paths written into the source tree.
pub fn build_styles(
    runner: &dyn CommandRunner,
    layout: &Layout,
    out_dir: &Path,
    tools: &ToolsConfig,
    kind: StyleKind,
) -> Result<Vec<PathBuf>, StylesError> {
    let css_src = layout.css_src_dir();
    let css_out = layout.css_out_dir();
    let css_mirror = layout.mirror_in(&css_out, out_dir);

    let mut written = Vec::new();
    for source in find_sources(&css_src, kind)? {
        let Some(css) = compile(runner, tools, kind, &source)? else {
            continue;
        };
        let rel = source
            .strip_prefix(&css_src)
            .unwrap_or(&source)
            .with_extension("css");

        let mut contents = YAML_FRONT_MATTER.as_bytes().to_vec();
        contents.extend_from_slice(&css);

        let dest = css_out.join(&rel);
        exec::write_file(&dest, &contents)?;
        exec::write_file(&css_mirror.join(&rel), &contents)?;
        tracing::debug!(dest = %dest.display(), "stylesheet written");
        written.push(dest);
    }
    Ok(written)
}
