//! The current-version file.
//!
//! A single line of text naming the latest released docs version, newline
//! terminated. Every task that needs "latest" or "next" reads it once at
//! startup; only the rollover operations write it.

use crate::naming;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Site generator variable that receives the latest version.
pub const VERSION_VAR_NAME: &str = "latest_docs_version";

#[derive(Error, Debug)]
pub enum VersionError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Version file is empty: {0}")]
    Empty(PathBuf),
    #[error("Can't compute the version after '{0}'")]
    Unrecognized(String),
}

/// Read the current version identifier, trimmed.
pub fn read_version(path: &Path) -> Result<String, VersionError> {
    let content = fs::read_to_string(path).map_err(|source| VersionError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let version = content.trim();
    if version.is_empty() {
        return Err(VersionError::Empty(path.to_path_buf()));
    }
    Ok(version.to_string())
}

/// Replace the version file with `version` followed by a newline.
///
/// The new contents are written to a sibling file and renamed into place, so
/// readers see either the old identifier or the new one.
pub fn write_version(path: &Path, version: &str) -> Result<(), VersionError> {
    let io_err = |source| VersionError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "VERSION".to_string());
    let staged = path.with_file_name(format!(".{file_name}.tmp"));
    fs::write(&staged, format!("{version}\n")).map_err(io_err)?;
    fs::rename(&staged, path).map_err(|source| {
        let _ = fs::remove_file(&staged);
        io_err(source)
    })
}

/// The version that follows `latest`.
pub fn next_after(latest: &str) -> Result<String, VersionError> {
    naming::next_version(latest).ok_or_else(|| VersionError::Unrecognized(latest.to_string()))
}

/// Contents of the generated `_version.yml` site config.
pub fn version_config_contents(version: &str) -> String {
    format!("{VERSION_VAR_NAME}: {version}\n")
}
