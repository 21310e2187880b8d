//! Docs version rollover.
//!
//! Creates a documentation version by duplicating another one: for every
//! language, the content tree `docs/<lang>/<from>/` and the hand-maintained
//! ToC file `toc/<lang>_<from>_manual.yml` are copied to their `<to>`
//! counterparts.
//!
//! ## Fan-out / fan-in
//!
//! All `2 × languages` copies are launched at once on the rayon pool and run
//! independently; nothing orders a language's tree copy relative to its ToC
//! copy or to any other language's copies. Each copy reports its result on a
//! shared channel. [`RolloverManager::rollover`] counts successes until every
//! copy has reported, or returns the first error as soon as it arrives. A copy
//! that panics reports [`RolloverError::CopyPanicked`] like any other failure.
//! Progress events are sent from the calling thread only, so nothing a worker
//! holds keeps an event receiver open.
//!
//! Copies still in flight after a failure are not cancelled. They run to
//! completion on the pool and their results are dropped with the channel.
//! Copies that already succeeded are not rolled back, so a failed rollover can
//! leave some languages copied and others not.
//!
//! ## Operations
//!
//! | Operation | Before | Copies | After |
//! |---|---|---|---|
//! | [`rollover`](RolloverManager::rollover) | | `from` → `to` | |
//! | [`publish_new_version`](RolloverManager::publish_new_version) | | `dev` → `target` | version file := `target` |
//! | [`snapshot_current_version`](RolloverManager::snapshot_current_version) | delete every `docs/<lang>/<current>/` | `dev` → `current` | |
//!
//! The version file is only written after every copy succeeded.

use crate::copier::{CopyBackend, CopyError};
use crate::layout::{DEV_VERSION, Layout};
use crate::naming::manual_toc_name;
use crate::version::{self, VersionError};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Sender};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RolloverError {
    #[error("Copy {op} failed: {source}")]
    Copy {
        op: CopyOp,
        #[source]
        source: CopyError,
    },
    #[error("Removing {path} failed: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: CopyError,
    },
    #[error("Docs copied to {version} but the version file was not updated: {source}")]
    VersionNotRecorded {
        version: String,
        #[source]
        source: VersionError,
    },
    #[error("Can't roll version {0} over onto itself")]
    SameVersion(String),
    #[error("Copy {op} panicked: {message}")]
    CopyPanicked { op: CopyOp, message: String },
}

/// What a copy operation duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyKind {
    /// The `docs/<lang>/<version>/` content tree.
    Tree,
    /// The language's manual ToC file.
    Toc,
}

/// One scheduled copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyOp {
    pub kind: CopyKind,
    pub language: String,
    pub src: PathBuf,
    pub dst: PathBuf,
}

impl CopyOp {
    fn execute(&self, backend: &dyn CopyBackend) -> Result<(), CopyError> {
        match self.kind {
            CopyKind::Tree => backend.copy_tree(&self.src, &self.dst),
            CopyKind::Toc => backend.copy_file(&self.src, &self.dst),
        }
    }

    /// Run the copy, turning a panic in the backend into an error.
    fn run(self, backend: &dyn CopyBackend) -> Result<CopyOp, RolloverError> {
        match panic::catch_unwind(AssertUnwindSafe(|| self.execute(backend))) {
            Ok(Ok(())) => Ok(self),
            Ok(Err(source)) => Err(RolloverError::Copy { op: self, source }),
            Err(payload) => Err(RolloverError::CopyPanicked {
                message: panic_message(payload.as_ref()),
                op: self,
            }),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl fmt::Display for CopyOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.src.display(), self.dst.display())
    }
}

/// Progress reported while a rollover runs.
#[derive(Debug, Clone, PartialEq)]
pub enum RolloverEvent {
    Removed(PathBuf),
    CopyStarted(CopyOp),
    CopyFinished(CopyOp),
    VersionRecorded(String),
}

/// Owns the version rollover for one invocation.
///
/// The language list is captured at construction and does not change for the
/// manager's lifetime.
pub struct RolloverManager<B> {
    backend: Arc<B>,
    docs_dir: PathBuf,
    toc_dir: PathBuf,
    version_file: PathBuf,
    languages: Vec<String>,
    events: Option<Sender<RolloverEvent>>,
}

impl<B: CopyBackend + 'static> RolloverManager<B> {
    pub fn new(backend: B, layout: &Layout, languages: Vec<String>) -> Self {
        Self {
            backend: Arc::new(backend),
            docs_dir: layout.docs_dir(),
            toc_dir: layout.toc_dir(),
            version_file: layout.version_file.clone(),
            languages,
            events: None,
        }
    }

    /// Report progress on `events`.
    pub fn with_events(mut self, events: Sender<RolloverEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn emit(&self, event: RolloverEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }

    fn version_dir(&self, language: &str, version: &str) -> PathBuf {
        self.docs_dir.join(language).join(version)
    }

    /// The copies a rollover from `from` to `to` performs, two per language.
    pub fn plan(&self, from: &str, to: &str) -> Vec<CopyOp> {
        self.languages
            .iter()
            .flat_map(|language| {
                [
                    CopyOp {
                        kind: CopyKind::Tree,
                        language: language.clone(),
                        src: self.version_dir(language, from),
                        dst: self.version_dir(language, to),
                    },
                    CopyOp {
                        kind: CopyKind::Toc,
                        language: language.clone(),
                        src: self.toc_dir.join(manual_toc_name(language, from)),
                        dst: self.toc_dir.join(manual_toc_name(language, to)),
                    },
                ]
            })
            .collect()
    }

    /// Copy every language's `from` tree and ToC file to `to`.
    ///
    /// Returns once all copies succeeded, or with the first copy error.
    pub fn rollover(&self, from: &str, to: &str) -> Result<(), RolloverError> {
        if from == to {
            return Err(RolloverError::SameVersion(to.to_string()));
        }
        let ops = self.plan(from, to);
        let total = ops.len();
        let (tx, rx) = mpsc::channel();

        for op in ops {
            self.emit(RolloverEvent::CopyStarted(op.clone()));
            let backend = Arc::clone(&self.backend);
            let tx = tx.clone();
            rayon::spawn(move || {
                let report = op.run(backend.as_ref());
                tracing::debug!(ok = report.is_ok(), "copy finished");
                // The receiver is gone once an earlier copy failed.
                let _ = tx.send(report);
            });
        }
        drop(tx);

        // Every worker sends exactly once.
        let mut completed = 0;
        for report in rx.iter().take(total) {
            match report {
                Ok(op) => {
                    completed += 1;
                    self.emit(RolloverEvent::CopyFinished(op));
                }
                Err(err) => {
                    tracing::warn!(completed, total, "rollover {from} -> {to} aborted");
                    return Err(err);
                }
            }
        }
        tracing::info!(languages = self.languages.len(), "rolled {from} over to {to}");
        Ok(())
    }

    /// Create `target` from the in-progress version and record it as current.
    ///
    /// The version file is left untouched when any copy fails.
    pub fn publish_new_version(&self, target: &str) -> Result<(), RolloverError> {
        self.rollover(DEV_VERSION, target)?;
        version::write_version(&self.version_file, target).map_err(|source| {
            RolloverError::VersionNotRecorded {
                version: target.to_string(),
                source,
            }
        })?;
        self.emit(RolloverEvent::VersionRecorded(target.to_string()));
        Ok(())
    }

    /// Rebuild `current` from the in-progress version.
    ///
    /// Every language's `docs/<lang>/<current>/` is deleted before any copy
    /// starts. Nothing is backed up.
    pub fn snapshot_current_version(&self, current: &str) -> Result<(), RolloverError> {
        if current == DEV_VERSION {
            return Err(RolloverError::SameVersion(current.to_string()));
        }
        for language in &self.languages {
            let path = self.version_dir(language, current);
            self.remove(&path)?;
        }
        self.rollover(DEV_VERSION, current)
    }

    fn remove(&self, path: &Path) -> Result<(), RolloverError> {
        self.backend
            .remove_tree(path)
            .map_err(|source| RolloverError::Remove {
                path: path.to_path_buf(),
                source,
            })?;
        self.emit(RolloverEvent::Removed(path.to_path_buf()));
        Ok(())
    }
}
