//! Resolved project layout.
//!
//! The configured directories in [`PathsConfig`] are joined onto the project
//! root once, and the fixed sub-layout of the source tree is derived from
//! them:
//!
//! ```text
//! <root>/
//! ├── VERSION                      # latest released docs version
//! ├── conf/                        # _config.yml, _defaults.yml, _version.yml, ...
//! ├── tools/bin/                   # helper scripts
//! ├── build-dev/ | build-prod/     # site output per build mode
//! └── www/
//!     ├── _data/
//!     │   ├── toc/                 # <lang>_<version>_manual.yml, *-generated.yml
//!     │   ├── docs-versions.yml
//!     │   └── fetched-files.yml
//!     ├── docs/<lang>/<version>/   # per-version content
//!     └── static/
//!         ├── css-src/  → css/
//!         ├── plugins/app.js → js/plugins.js
//!         └── js/
//! ```

use crate::config::{BuildMode, PathsConfig};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Name of the in-progress docs version.
pub const DEV_VERSION: &str = "dev";

/// Front matter prepended to generated assets so the site generator
/// processes them.
pub const YAML_FRONT_MATTER: &str = "---\n---\n";

#[derive(Debug, Clone)]
pub struct Layout {
    pub root: PathBuf,
    pub config_dir: PathBuf,
    pub source_dir: PathBuf,
    pub dev_dir: PathBuf,
    pub prod_dir: PathBuf,
    pub bin_dir: PathBuf,
    pub version_file: PathBuf,
}

impl Layout {
    pub fn new(root: &Path, paths: &PathsConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            config_dir: root.join(&paths.config_dir),
            source_dir: root.join(&paths.source_dir),
            dev_dir: root.join(&paths.dev_dir),
            prod_dir: root.join(&paths.prod_dir),
            bin_dir: root.join(&paths.bin_dir),
            version_file: root.join(&paths.version_file),
        }
    }

    /// Site output directory for a build mode.
    pub fn out_dir(&self, mode: BuildMode) -> &Path {
        match mode {
            BuildMode::Dev => &self.dev_dir,
            BuildMode::Prod => &self.prod_dir,
        }
    }

    /// Map a path inside the source tree to the same place in an output tree.
    ///
    /// Paths outside the source tree are returned unchanged.
    pub fn mirror_in(&self, path: &Path, out_dir: &Path) -> PathBuf {
        match path.strip_prefix(&self.source_dir) {
            Ok(rel) => out_dir.join(rel),
            Err(_) => path.to_path_buf(),
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.source_dir.join("_data")
    }

    pub fn toc_dir(&self) -> PathBuf {
        self.data_dir().join("toc")
    }

    pub fn docs_dir(&self) -> PathBuf {
        self.source_dir.join("docs")
    }

    /// Where externally fetched reference docs land.
    pub fn fetch_dir(&self) -> PathBuf {
        self.docs_dir().join("en").join(DEV_VERSION).join("reference")
    }

    pub fn fetch_config(&self) -> PathBuf {
        self.data_dir().join("fetched-files.yml")
    }

    pub fn docs_versions_file(&self) -> PathBuf {
        self.data_dir().join("docs-versions.yml")
    }

    pub fn css_src_dir(&self) -> PathBuf {
        self.source_dir.join("static").join("css-src")
    }

    pub fn css_out_dir(&self) -> PathBuf {
        self.source_dir.join("static").join("css")
    }

    pub fn plugins_src_dir(&self) -> PathBuf {
        self.source_dir.join("static").join("plugins")
    }

    pub fn plugins_entry(&self) -> PathBuf {
        self.plugins_src_dir().join("app.js")
    }

    pub fn js_dir(&self) -> PathBuf {
        self.source_dir.join("static").join("js")
    }

    pub fn plugins_file(&self) -> PathBuf {
        self.js_dir().join("plugins.js")
    }

    pub fn posts_dir(&self) -> PathBuf {
        self.source_dir.join("_posts")
    }

    pub fn site_config(&self) -> PathBuf {
        self.config_dir.join("_config.yml")
    }

    pub fn defaults_config(&self) -> PathBuf {
        self.config_dir.join("_defaults.yml")
    }

    pub fn version_config(&self) -> PathBuf {
        self.config_dir.join("_version.yml")
    }

    pub fn prod_config(&self) -> PathBuf {
        self.config_dir.join("_prod.yml")
    }

    pub fn dev_config(&self) -> PathBuf {
        self.config_dir.join("_dev.yml")
    }

    pub fn nodocs_config(&self) -> PathBuf {
        self.config_dir.join("_nodocs.yml")
    }

    pub fn bin(&self, name: &str) -> PathBuf {
        self.bin_dir.join(name)
    }
}

/// List the documentation languages: the subdirectories of `docs_dir`.
///
/// Hidden entries are skipped and the result is sorted so every run sees the
/// same order.
pub fn list_languages(docs_dir: &Path) -> io::Result<Vec<String>> {
    let mut languages = Vec::new();
    for entry in fs::read_dir(docs_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        languages.push(name);
    }
    languages.sort();
    Ok(languages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn layout() -> Layout {
        Layout::new(Path::new("/site"), &PathsConfig::default())
    }

    #[test]
    fn derived_paths_follow_source_dir() {
        let layout = layout();
        assert_eq!(layout.docs_dir(), PathBuf::from("/site/www/docs"));
        assert_eq!(layout.toc_dir(), PathBuf::from("/site/www/_data/toc"));
        assert_eq!(
            layout.fetch_dir(),
            PathBuf::from("/site/www/docs/en/dev/reference")
        );
        assert_eq!(
            layout.plugins_file(),
            PathBuf::from("/site/www/static/js/plugins.js")
        );
        assert_eq!(layout.version_file, PathBuf::from("/site/VERSION"));
    }

    #[test]
    fn out_dir_per_mode() {
        let layout = layout();
        assert_eq!(layout.out_dir(BuildMode::Dev), Path::new("/site/build-dev"));
        assert_eq!(layout.out_dir(BuildMode::Prod), Path::new("/site/build-prod"));
    }

    #[test]
    fn mirror_in_output_tree() {
        let layout = layout();
        let mirrored = layout.mirror_in(&layout.css_out_dir(), &layout.dev_dir);
        assert_eq!(mirrored, PathBuf::from("/site/build-dev/static/css"));
    }

    #[test]
    fn mirror_outside_source_is_unchanged() {
        let layout = layout();
        let path = Path::new("/elsewhere/file.css");
        assert_eq!(layout.mirror_in(path, &layout.dev_dir), path);
    }

    #[test]
    fn list_languages_sorted_dirs_only() {
        let tmp = TempDir::new().unwrap();
        for dir in ["fr", "en", ".git", "ja"] {
            fs::create_dir_all(tmp.path().join(dir)).unwrap();
        }
        fs::write(tmp.path().join("README.md"), "not a language").unwrap();

        let languages = list_languages(tmp.path()).unwrap();
        assert_eq!(languages, vec!["en", "fr", "ja"]);
    }

    #[test]
    fn list_languages_missing_dir_errors() {
        let tmp = TempDir::new().unwrap();
        assert!(list_languages(&tmp.path().join("nope")).is_err());
    }
}
