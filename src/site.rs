//! Site generator invocation.
//!
//! The site itself is rendered by Jekyll, run through Bundler so the
//! project's pinned gems are used:
//!
//! ```text
//! bundle exec jekyll build <mode flags> --config <base>,<mode>[,<nodocs>]
//! ```
//!
//! Config files are layered left to right; later files override earlier ones.
//! The base layer is always `_config.yml`, `_defaults.yml`, `_version.yml`,
//! followed by `_prod.yml` or `_dev.yml`, and `_nodocs.yml` last when the docs
//! tree is excluded.

use crate::config::{BuildConfig, BuildMode, BuildProfile, ToolsConfig};
use crate::exec::{CommandRunner, CommandSpec, ExecError};
use crate::layout::Layout;
use std::path::PathBuf;

/// Ordered site generator config files for a build profile.
pub fn site_configs(layout: &Layout, profile: BuildProfile) -> Vec<PathBuf> {
    let mut configs = vec![
        layout.site_config(),
        layout.defaults_config(),
        layout.version_config(),
    ];
    configs.push(match profile.mode {
        BuildMode::Prod => layout.prod_config(),
        BuildMode::Dev => layout.dev_config(),
    });
    if profile.nodocs {
        configs.push(layout.nodocs_config());
    }
    configs
}

/// Command line that builds the site for a profile.
pub fn site_build_command(
    layout: &Layout,
    profile: BuildProfile,
    build: &BuildConfig,
    tools: &ToolsConfig,
) -> CommandSpec {
    let flags = match profile.mode {
        BuildMode::Prod => &build.prod_flags,
        BuildMode::Dev => &build.dev_flags,
    };
    // Jekyll runs inside the root, so root-joined paths are passed relative
    // to it. Paths configured outside the root stay as they are.
    let configs = site_configs(layout, profile)
        .iter()
        .map(|p| p.strip_prefix(&layout.root).unwrap_or(p))
        .map(|p| p.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(",");

    CommandSpec::new(&tools.bundle)
        .args(["exec", "jekyll", "build"])
        .args(flags.iter().cloned())
        .arg("--config")
        .arg(configs)
        .current_dir(&layout.root)
}

/// Build the site; a non-zero exit of the generator is an error.
pub fn build_site(
    runner: &dyn CommandRunner,
    layout: &Layout,
    profile: BuildProfile,
    build: &BuildConfig,
    tools: &ToolsConfig,
) -> Result<(), ExecError> {
    let spec = site_build_command(layout, profile, build, tools);
    tracing::info!(mode = %profile.mode, nodocs = profile.nodocs, "building site");
    runner.run(&spec)
}
