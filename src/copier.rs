//! Filesystem copy backend.
//!
//! The [`CopyBackend`] trait defines the three filesystem operations the
//! version tooling needs: copy a directory tree, copy a single file, and
//! remove a directory tree. The rollover logic only ever talks to the trait,
//! so tests can swap in a backend that records calls, fails on demand, or
//! stalls a copy to observe ordering.
//!
//! The production implementation is [`FsCopier`].
//!
//! | Operation | Semantics |
//! |---|---|
//! | **copy_tree** | recursive; merges into an existing destination, overwriting files |
//! | **copy_file** | creates the destination's parent directories |
//! | **remove_tree** | a missing directory is not an error |

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum CopyError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Source not found: {0}")]
    SourceNotFound(PathBuf),
}

impl CopyError {
    fn io(path: &Path, source: io::Error) -> Self {
        CopyError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Trait for filesystem copy backends.
///
/// Implementations must be shareable across the worker threads a rollover
/// fans out to.
pub trait CopyBackend: Send + Sync {
    /// Recursively copy the directory `src` to `dst`.
    fn copy_tree(&self, src: &Path, dst: &Path) -> Result<(), CopyError>;

    /// Copy the single file `src` to `dst`.
    fn copy_file(&self, src: &Path, dst: &Path) -> Result<(), CopyError>;

    /// Remove the directory tree at `path`.
    fn remove_tree(&self, path: &Path) -> Result<(), CopyError>;
}

/// Copy backend that operates on the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsCopier;

impl FsCopier {
    pub fn new() -> Self {
        Self
    }
}

impl CopyBackend for FsCopier {
    fn copy_tree(&self, src: &Path, dst: &Path) -> Result<(), CopyError> {
        if !src.is_dir() {
            return Err(CopyError::SourceNotFound(src.to_path_buf()));
        }
        for entry in WalkDir::new(src) {
            let entry = entry?;
            let rel = entry
                .path()
                .strip_prefix(src)
                .map_err(|_| CopyError::SourceNotFound(entry.path().to_path_buf()))?;
            let target = dst.join(rel);
            if entry.file_type().is_dir() {
                fs::create_dir_all(&target).map_err(|e| CopyError::io(&target, e))?;
            } else {
                fs::copy(entry.path(), &target).map_err(|e| CopyError::io(&target, e))?;
            }
        }
        Ok(())
    }

    fn copy_file(&self, src: &Path, dst: &Path) -> Result<(), CopyError> {
        if !src.is_file() {
            return Err(CopyError::SourceNotFound(src.to_path_buf()));
        }
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent).map_err(|e| CopyError::io(parent, e))?;
        }
        fs::copy(src, dst).map_err(|e| CopyError::io(dst, e))?;
        Ok(())
    }

    fn remove_tree(&self, path: &Path) -> Result<(), CopyError> {
        match fs::remove_dir_all(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CopyError::io(path, e)),
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Mock backend that records operations without touching the filesystem.
    ///
    /// Operations whose source is listed in `fail_sources` fail with
    /// [`CopyError::SourceNotFound`], and those in `panic_sources` panic.
    /// A copy from one of `slow_sources` sleeps for its delay before anything
    /// else, which makes concurrent completion observable.
    #[derive(Default)]
    pub struct MockCopier {
        pub operations: Mutex<Vec<RecordedOp>>,
        pub fail_sources: Vec<PathBuf>,
        pub panic_sources: Vec<PathBuf>,
        pub slow_sources: Vec<(PathBuf, Duration)>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        CopyTree { src: PathBuf, dst: PathBuf },
        CopyFile { src: PathBuf, dst: PathBuf },
        RemoveTree(PathBuf),
    }

    impl MockCopier {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing_on(sources: Vec<PathBuf>) -> Self {
            Self {
                fail_sources: sources,
                ..Self::default()
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        fn copy(&self, src: &Path, op: RecordedOp) -> Result<(), CopyError> {
            if let Some((_, delay)) = self.slow_sources.iter().find(|(s, _)| s == src) {
                std::thread::sleep(*delay);
            }
            if self.panic_sources.iter().any(|s| s == src) {
                panic!("copy of {} blew up", src.display());
            }
            if self.fail_sources.iter().any(|s| s == src) {
                return Err(CopyError::SourceNotFound(src.to_path_buf()));
            }
            self.operations.lock().unwrap().push(op);
            Ok(())
        }
    }

    impl CopyBackend for MockCopier {
        fn copy_tree(&self, src: &Path, dst: &Path) -> Result<(), CopyError> {
            self.copy(
                src,
                RecordedOp::CopyTree {
                    src: src.to_path_buf(),
                    dst: dst.to_path_buf(),
                },
            )
        }

        fn copy_file(&self, src: &Path, dst: &Path) -> Result<(), CopyError> {
            self.copy(
                src,
                RecordedOp::CopyFile {
                    src: src.to_path_buf(),
                    dst: dst.to_path_buf(),
                },
            )
        }

        fn remove_tree(&self, path: &Path) -> Result<(), CopyError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::RemoveTree(path.to_path_buf()));
            Ok(())
        }
    }

    #[test]
    fn mock_records_copy_tree() {
        let copier = MockCopier::new();
        copier
            .copy_tree(Path::new("/docs/en/dev"), Path::new("/docs/en/2.1"))
            .unwrap();
        assert_eq!(
            copier.get_operations(),
            vec![RecordedOp::CopyTree {
                src: "/docs/en/dev".into(),
                dst: "/docs/en/2.1".into(),
            }]
        );
    }

    #[test]
    fn mock_fails_on_listed_source() {
        let copier = MockCopier::failing_on(vec!["/docs/fr/dev".into()]);
        let result = copier.copy_tree(Path::new("/docs/fr/dev"), Path::new("/docs/fr/2.1"));
        assert!(matches!(result, Err(CopyError::SourceNotFound(_))));
        assert!(copier.get_operations().is_empty());
    }

    #[test]
    fn mock_delays_only_slow_sources() {
        let copier = MockCopier {
            slow_sources: vec![("/docs/en/dev".into(), Duration::from_millis(200))],
            ..MockCopier::new()
        };
        let started = std::time::Instant::now();
        copier
            .copy_tree(Path::new("/docs/fr/dev"), Path::new("/docs/fr/2.1"))
            .unwrap();
        assert!(started.elapsed() < Duration::from_millis(200));
        copier
            .copy_tree(Path::new("/docs/en/dev"), Path::new("/docs/en/2.1"))
            .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(200));
    }

    #[test]
    #[should_panic(expected = "blew up")]
    fn mock_panics_on_listed_source() {
        let copier = MockCopier {
            panic_sources: vec!["/docs/ja/dev".into()],
            ..MockCopier::new()
        };
        let _ = copier.copy_tree(Path::new("/docs/ja/dev"), Path::new("/docs/ja/2.1"));
    }

    // =========================================================================
    // FsCopier
    // =========================================================================

    #[test]
    fn copy_tree_copies_nested_files() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        fs::create_dir_all(src.join("guide/platforms")).unwrap();
        fs::write(src.join("index.md"), "# Index").unwrap();
        fs::write(src.join("guide/platforms/ios.md"), "# iOS").unwrap();

        let dst = tmp.path().join("dst");
        FsCopier.copy_tree(&src, &dst).unwrap();

        assert_eq!(fs::read_to_string(dst.join("index.md")).unwrap(), "# Index");
        assert_eq!(
            fs::read_to_string(dst.join("guide/platforms/ios.md")).unwrap(),
            "# iOS"
        );
    }

    #[test]
    fn copy_tree_merges_into_existing_destination() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(&dst).unwrap();
        fs::write(src.join("a.md"), "new").unwrap();
        fs::write(dst.join("a.md"), "old").unwrap();
        fs::write(dst.join("keep.md"), "kept").unwrap();

        FsCopier.copy_tree(&src, &dst).unwrap();

        assert_eq!(fs::read_to_string(dst.join("a.md")).unwrap(), "new");
        assert_eq!(fs::read_to_string(dst.join("keep.md")).unwrap(), "kept");
    }

    #[test]
    fn copy_tree_missing_source() {
        let tmp = TempDir::new().unwrap();
        let result = FsCopier.copy_tree(&tmp.path().join("missing"), &tmp.path().join("dst"));
        assert!(matches!(result, Err(CopyError::SourceNotFound(_))));
        assert!(!tmp.path().join("dst").exists());
    }

    #[test]
    fn copy_file_creates_parent() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("en_dev_manual.yml");
        fs::write(&src, "- name: Guide\n").unwrap();

        let dst = tmp.path().join("toc/en_2-1_manual.yml");
        FsCopier.copy_file(&src, &dst).unwrap();
        assert_eq!(fs::read_to_string(&dst).unwrap(), "- name: Guide\n");
    }

    #[test]
    fn copy_file_missing_source() {
        let tmp = TempDir::new().unwrap();
        let result = FsCopier.copy_file(&tmp.path().join("nope.yml"), &tmp.path().join("x.yml"));
        assert!(matches!(result, Err(CopyError::SourceNotFound(_))));
    }

    #[test]
    fn remove_tree_removes_and_tolerates_missing() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("docs/en/2.0");
        fs::create_dir_all(dir.join("guide")).unwrap();
        fs::write(dir.join("guide/index.md"), "x").unwrap();

        FsCopier.remove_tree(&dir).unwrap();
        assert!(!dir.exists());
        FsCopier.remove_tree(&dir).unwrap();
    }
}
