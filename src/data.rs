//! Generated site data and config files.
//!
//! | Task | Produces | How |
//! |---|---|---|
//! | `defaults` | `conf/_defaults.yml` | `node gen_defaults.js <docs> <latest>` (stdout) |
//! | `version` | `conf/_version.yml` | written directly |
//! | `docs-versions` | `_data/docs-versions.yml` | `node gen_versions.js <docs>` (stdout) |
//! | `toc` | `_data/toc/*-generated.yml` | `node toc.js <docs> <data>`, production only |
//! | `fetch` | `docs/en/dev/reference/` | `node fetch_docs.js`, skipped if already fetched |

use crate::config::{BuildProfile, ToolsConfig};
use crate::exec::{self, CommandRunner, CommandSpec, ExecError};
use crate::layout::Layout;
use crate::version;

/// Whether a conditional task did its work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    Skipped,
}

fn node_script(tools: &ToolsConfig, layout: &Layout, script: &str) -> CommandSpec {
    CommandSpec::new(&tools.node).path_arg(&layout.bin(script))
}

/// Generate `_defaults.yml` for the latest docs version.
pub fn gen_defaults(
    runner: &dyn CommandRunner,
    layout: &Layout,
    tools: &ToolsConfig,
    latest: &str,
) -> Result<(), ExecError> {
    let spec = node_script(tools, layout, "gen_defaults.js")
        .path_arg(&layout.docs_dir())
        .arg(latest);
    exec::run_piped(runner, &spec, &layout.defaults_config())
}

/// Write `_version.yml` exposing the latest docs version to the site.
pub fn write_version_config(layout: &Layout, latest: &str) -> Result<(), ExecError> {
    exec::write_file(
        &layout.version_config(),
        version::version_config_contents(latest).as_bytes(),
    )
}

/// Generate the list of docs versions per language.
pub fn gen_docs_versions(
    runner: &dyn CommandRunner,
    layout: &Layout,
    tools: &ToolsConfig,
) -> Result<(), ExecError> {
    let spec = node_script(tools, layout, "gen_versions.js").path_arg(&layout.docs_dir());
    exec::run_piped(runner, &spec, &layout.docs_versions_file())
}

/// Generate ToC files from the docs tree. Only production builds need them.
pub fn gen_toc(
    runner: &dyn CommandRunner,
    layout: &Layout,
    profile: BuildProfile,
    tools: &ToolsConfig,
) -> Result<Outcome, ExecError> {
    if !profile.is_prod() {
        tracing::debug!("skipping generated ToC for {} build", profile.mode);
        return Ok(Outcome::Skipped);
    }
    let spec = node_script(tools, layout, "toc.js")
        .path_arg(&layout.docs_dir())
        .path_arg(&layout.data_dir());
    runner.run(&spec)?;
    Ok(Outcome::Done)
}

/// Download externally hosted docs listed in `fetched-files.yml`.
///
/// Skipped when the fetch directory already exists; `clean` removes it to
/// force another fetch.
pub fn fetch_docs(
    runner: &dyn CommandRunner,
    layout: &Layout,
    tools: &ToolsConfig,
) -> Result<Outcome, ExecError> {
    if layout.fetch_dir().exists() {
        tracing::warn!(
            "Skipping fetching external docs. Run 'docpipe clean' first to initiate another fetch."
        );
        return Ok(Outcome::Skipped);
    }
    let spec = node_script(tools, layout, "fetch_docs.js")
        .arg("--config")
        .path_arg(&layout.fetch_config())
        .arg("--docsRoot")
        .path_arg(&layout.docs_dir());
    runner.run(&spec)?;
    Ok(Outcome::Done)
}
