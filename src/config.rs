//! Pipeline configuration.
//!
//! Handles loading, validating, and merging `docpipe.toml`. Configuration is
//! layered: stock defaults are overridden by an optional `docpipe.toml` in the
//! project root, and the build mode is then resolved from command-line flags
//! into an explicit [`BuildProfile`] that every task receives.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [paths]
//! config_dir = "conf"       # Site generator config files
//! source_dir = "www"        # Site sources (docs, data, static assets)
//! dev_dir = "build-dev"     # Output of development builds
//! prod_dir = "build-prod"   # Output of production builds
//! bin_dir = "tools/bin"     # Helper scripts
//! version_file = "VERSION"  # Current docs version identifier
//!
//! [build]
//! prod_by_default = false
//! dev_flags = ["--trace"]
//! prod_flags = []
//!
//! [tools]
//! node = "node"
//! bundle = "bundle"         # "bundle.bat" on Windows
//! lessc = "lessc"
//! sass = "sass"
//! browserify = "browserify"
//! uglifyjs = "uglifyjs"
//! browser_sync = "browser-sync"
//! link_checker = "linkinator"
//! htmllint = "htmllint"
//!
//! [server]
//! port = 3000
//! notify = true
//!
//! [watch]
//! interval_ms = 1000
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the optional config file in the project root.
pub const CONFIG_FILE_NAME: &str = "docpipe.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("can't ignore docs when doing a production build")]
    ProdWithoutDocs,
}

/// Pipeline configuration loaded from `docpipe.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub paths: PathsConfig,
    pub build: BuildConfig,
    pub tools: ToolsConfig,
    pub server: ServerConfig,
    pub watch: WatchConfig,
}

impl PipelineConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let paths = [
            ("paths.config_dir", &self.paths.config_dir),
            ("paths.source_dir", &self.paths.source_dir),
            ("paths.dev_dir", &self.paths.dev_dir),
            ("paths.prod_dir", &self.paths.prod_dir),
            ("paths.bin_dir", &self.paths.bin_dir),
            ("paths.version_file", &self.paths.version_file),
        ];
        for (key, value) in paths {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{key} must not be empty")));
            }
        }
        if self.paths.dev_dir == self.paths.prod_dir {
            return Err(ConfigError::Validation(
                "paths.dev_dir and paths.prod_dir must differ".into(),
            ));
        }
        if self.watch.interval_ms == 0 {
            return Err(ConfigError::Validation(
                "watch.interval_ms must be non-zero".into(),
            ));
        }
        if self.server.port == 0 {
            return Err(ConfigError::Validation("server.port must be non-zero".into()));
        }
        Ok(())
    }
}

/// Project layout, relative to the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub config_dir: String,
    pub source_dir: String,
    pub dev_dir: String,
    pub prod_dir: String,
    pub bin_dir: String,
    pub version_file: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            config_dir: "conf".to_string(),
            source_dir: "www".to_string(),
            dev_dir: "build-dev".to_string(),
            prod_dir: "build-prod".to_string(),
            bin_dir: "tools/bin".to_string(),
            version_file: "VERSION".to_string(),
        }
    }
}

/// Site generator settings per build mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Build for production even without `--prod`.
    pub prod_by_default: bool,
    /// Extra site generator flags for development builds.
    pub dev_flags: Vec<String>,
    /// Extra site generator flags for production builds.
    pub prod_flags: Vec<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            prod_by_default: false,
            dev_flags: vec!["--trace".to_string()],
            prod_flags: Vec::new(),
        }
    }
}

/// Program names of the external tools the pipeline drives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsConfig {
    pub node: String,
    pub bundle: String,
    pub lessc: String,
    pub sass: String,
    pub browserify: String,
    pub uglifyjs: String,
    pub browser_sync: String,
    pub link_checker: String,
    pub htmllint: String,
}

fn default_bundle_executable() -> String {
    if cfg!(windows) {
        "bundle.bat".to_string()
    } else {
        "bundle".to_string()
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            node: "node".to_string(),
            bundle: default_bundle_executable(),
            lessc: "lessc".to_string(),
            sass: "sass".to_string(),
            browserify: "browserify".to_string(),
            uglifyjs: "uglifyjs".to_string(),
            browser_sync: "browser-sync".to_string(),
            link_checker: "linkinator".to_string(),
            htmllint: "htmllint".to_string(),
        }
    }
}

/// Development server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub port: u16,
    /// Show the in-browser notification on reload.
    pub notify: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            notify: true,
        }
    }
}

/// File watching settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchConfig {
    /// Poll interval in milliseconds.
    pub interval_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { interval_ms: 1000 }
    }
}

// =============================================================================
// Build profile
// =============================================================================

/// Which flavor of site is being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    Dev,
    Prod,
}

impl std::fmt::Display for BuildMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildMode::Dev => write!(f, "dev"),
            BuildMode::Prod => write!(f, "prod"),
        }
    }
}

/// Build mode for one invocation, threaded through every task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildProfile {
    pub mode: BuildMode,
    /// Exclude the docs tree from the site build.
    pub nodocs: bool,
}

impl BuildProfile {
    /// Resolve the profile from command-line flags and config defaults.
    ///
    /// `--prod` together with `--nodocs` is rejected: production builds must
    /// always contain the docs.
    pub fn resolve(prod: bool, nodocs: bool, build: &BuildConfig) -> Result<Self, ConfigError> {
        let prod = prod || build.prod_by_default;
        if prod && nodocs {
            return Err(ConfigError::ProdWithoutDocs);
        }
        Ok(Self {
            mode: if prod { BuildMode::Prod } else { BuildMode::Dev },
            nodocs,
        })
    }

    pub fn is_prod(&self) -> bool {
        self.mode == BuildMode::Prod
    }
}

impl Default for BuildProfile {
    fn default() -> Self {
        Self {
            mode: BuildMode::Dev,
            nodocs: false,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(PipelineConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `docpipe.toml` from the project root as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Load the pipeline config for a project root.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(root: &Path) -> Result<PipelineConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match load_raw_config(root)? {
        Some(overlay) => merge_toml(base, overlay),
        None => base,
    };
    let config: PipelineConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock `docpipe.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# docpipe configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Project layout (relative to the project root)
# ---------------------------------------------------------------------------
[paths]
# Site generator config files (_config.yml, _dev.yml, _prod.yml, ...).
config_dir = "conf"
# Site sources: docs/, _data/, static/, _layouts/, _includes/.
source_dir = "www"
# Output directories for development and production builds.
dev_dir = "build-dev"
prod_dir = "build-prod"
# Helper scripts (gen_versions.js, gen_defaults.js, toc.js, ...).
bin_dir = "tools/bin"
# Single line holding the latest released docs version.
version_file = "VERSION"

# ---------------------------------------------------------------------------
# Site generator
# ---------------------------------------------------------------------------
[build]
# Build for production unless told otherwise.
prod_by_default = false
# Extra flags passed to `jekyll build` per mode.
dev_flags = ["--trace"]
prod_flags = []

# ---------------------------------------------------------------------------
# External tools (program names or paths)
# ---------------------------------------------------------------------------
[tools]
node = "node"
# Defaults to "bundle.bat" on Windows and "bundle" elsewhere.
# bundle = "bundle"
lessc = "lessc"
sass = "sass"
browserify = "browserify"
uglifyjs = "uglifyjs"
browser_sync = "browser-sync"
link_checker = "linkinator"
htmllint = "htmllint"

# ---------------------------------------------------------------------------
# Development server
# ---------------------------------------------------------------------------
[server]
port = 3000
# Show the in-browser notification on reload.
notify = true

# ---------------------------------------------------------------------------
# Watching
# ---------------------------------------------------------------------------
[watch]
# Poll interval for source changes, in milliseconds.
interval_ms = 1000
"##
}
