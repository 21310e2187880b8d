//! Shared test utilities for the docpipe test suite.
//!
//! [`DocsFixture`] builds a throwaway project tree in a temp directory with
//! the stock layout:
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let fixture = DocsFixture::new()
//!     .version("2.0")
//!     .language("en")
//!     .released("en", "2.0", "old.md");
//!
//! let layout = fixture.layout();
//! assert!(layout.docs_dir().join("en/dev/index.md").exists());
//! ```

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use crate::config::PathsConfig;
use crate::layout::{DEV_VERSION, Layout};
use crate::naming::manual_toc_name;

pub struct DocsFixture {
    tmp: TempDir,
    layout: Layout,
}

impl DocsFixture {
    /// An empty project root.
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let layout = Layout::new(tmp.path(), &PathsConfig::default());
        Self { tmp, layout }
    }

    pub fn root(&self) -> &Path {
        self.tmp.path()
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Write the version file.
    pub fn version(self, version: &str) -> Self {
        fs::write(&self.layout.version_file, format!("{version}\n")).unwrap();
        self
    }

    /// Add a language with an in-progress docs tree and its manual ToC.
    ///
    /// The tree holds `index.md` and `guide/setup.md`, each naming the
    /// language.
    pub fn language(self, language: &str) -> Self {
        let dev = self.layout.docs_dir().join(language).join(DEV_VERSION);
        write(&dev.join("index.md"), &format!("# {language} docs\n"));
        write(
            &dev.join("guide").join("setup.md"),
            &format!("# {language} setup\n"),
        );
        write(
            &self
                .layout
                .toc_dir()
                .join(manual_toc_name(language, DEV_VERSION)),
            &format!("- name: {language}\n  url: index.html\n"),
        );
        self
    }

    /// Add a file to an already released version of a language.
    pub fn released(self, language: &str, version: &str, file: &str) -> Self {
        let path = self.layout.docs_dir().join(language).join(version).join(file);
        write(&path, "released\n");
        self
    }
}

fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}
