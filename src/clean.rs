//! Removal of everything the pipeline generates.
//!
//! Hand-maintained inputs are never touched: manual ToC files, style and
//! plugin sources, and the docs trees other than the fetched reference docs
//! all survive a clean.

use crate::exec::ExecError;
use crate::layout::Layout;
use crate::naming::GENERATED_TOC_SUFFIX;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Paths `clean` removes, in removal order.
///
/// Generated ToC files are discovered by name; a missing ToC directory
/// contributes nothing.
pub fn clean_targets(layout: &Layout) -> Result<Vec<PathBuf>, ExecError> {
    let mut targets = vec![
        layout.dev_dir.clone(),
        layout.prod_dir.clone(),
        layout.fetch_dir(),
    ];
    targets.extend(generated_tocs(&layout.toc_dir())?);
    targets.extend([
        layout.css_out_dir(),
        layout.plugins_file(),
        layout.docs_versions_file(),
        layout.defaults_config(),
        layout.version_config(),
    ]);
    Ok(targets)
}

fn generated_tocs(toc_dir: &Path) -> Result<Vec<PathBuf>, ExecError> {
    let io_err = |source| ExecError::Io {
        path: toc_dir.to_path_buf(),
        source,
    };
    let entries = match fs::read_dir(toc_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(io_err(e)),
    };
    let mut found = Vec::new();
    for entry in entries {
        let path = entry.map_err(io_err)?.path();
        let generated = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(GENERATED_TOC_SUFFIX));
        if generated {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}

/// Remove a file or directory tree. Returns whether anything was there.
fn remove_path(path: &Path) -> Result<bool, ExecError> {
    let result = match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => Err(e),
    };
    result.map(|()| true).map_err(|source| ExecError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Remove every generated path. Returns the paths that existed.
pub fn clean(layout: &Layout) -> Result<Vec<PathBuf>, ExecError> {
    let mut removed = Vec::new();
    for target in clean_targets(layout)? {
        if remove_path(&target)? {
            crate::output::print_removed(&target);
            removed.push(target);
        }
    }
    Ok(removed)
}
