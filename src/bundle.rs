//! JavaScript plugin bundling.
//!
//! `static/plugins/app.js` and everything it requires is bundled by
//! browserify (with the reactify and envify transforms) into a single
//! `plugins.js`. Production builds set `NODE_ENV=production` for envify and
//! minify the bundle with uglifyjs; development builds keep source maps.
//!
//! Two copies are written:
//!
//! 1. `<out>/static/js/plugins.js`: the bundle as produced, for a running
//!    dev server.
//! 2. `www/static/js/plugins.js`: front matter prepended so the site
//!    generator copies it on the next build, and `){{` rewritten to `){ {`
//!    because minified code can contain sequences that look like Liquid tags.
//!
//! Bundling is best effort. A failing bundler or minifier is logged and
//! whatever it produced is still written, so an iterative dev loop keeps
//! going with a degraded bundle. Only failing to write the outputs is an
//! error.

use crate::config::{BuildProfile, ToolsConfig};
use crate::exec::{self, CommandRunner, CommandSpec, ExecError};
use crate::layout::{Layout, YAML_FRONT_MATTER};
use std::path::{Path, PathBuf};

/// Result of a bundling run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleReport {
    /// Bundle written into the output tree.
    pub output: PathBuf,
    /// Front-matter copy written into the source tree.
    pub source_copy: PathBuf,
    /// The bundler or minifier failed; the written bundle may be incomplete.
    pub degraded: bool,
}

/// Command line that bundles the plugin entry point.
pub fn bundle_command(layout: &Layout, profile: BuildProfile, tools: &ToolsConfig) -> CommandSpec {
    let spec = CommandSpec::new(&tools.browserify)
        .path_arg(&layout.plugins_entry())
        .args(["-t", "reactify", "-t", "envify"]);
    if profile.is_prod() {
        spec.env("NODE_ENV", "production")
    } else {
        spec.arg("--debug")
    }
}

fn minify_command(tools: &ToolsConfig, bundle: &Path) -> CommandSpec {
    CommandSpec::new(&tools.uglifyjs)
        .path_arg(bundle)
        .args(["--compress", "--mangle"])
}

/// Escape sequences the site generator would parse as Liquid tags.
pub fn escape_liquid(js: &str) -> String {
    js.replace("){{", "){ {")
}

/// Run a captured command, logging failures instead of returning them.
///
/// Returns the produced stdout and whether the command succeeded.
fn best_effort(runner: &dyn CommandRunner, spec: &CommandSpec) -> (Vec<u8>, bool) {
    match runner.capture(spec) {
        Ok(captured) if captured.success => (captured.stdout, true),
        Ok(captured) => {
            let err = ExecError::Failed {
                command: spec.to_string(),
                code: captured.code,
            };
            tracing::error!("{err}");
            (captured.stdout, false)
        }
        Err(err) => {
            tracing::error!("{err}");
            (Vec::new(), false)
        }
    }
}

/// Bundle the plugins for a build profile.
pub fn bundle_plugins(
    runner: &dyn CommandRunner,
    layout: &Layout,
    profile: BuildProfile,
    out_dir: &Path,
    tools: &ToolsConfig,
) -> Result<BundleReport, ExecError> {
    let output = layout.mirror_in(&layout.plugins_file(), out_dir);
    let source_copy = layout.plugins_file();

    let (mut js, mut ok) = best_effort(runner, &bundle_command(layout, profile, tools));
    exec::write_file(&output, &js)?;

    if profile.is_prod() {
        let (minified, minify_ok) = best_effort(runner, &minify_command(tools, &output));
        if minify_ok {
            js = minified;
            exec::write_file(&output, &js)?;
        } else {
            // keep the unminified bundle
            ok = false;
        }
    }

    let mut contents = YAML_FRONT_MATTER.to_string();
    contents.push_str(&escape_liquid(&String::from_utf8_lossy(&js)));
    exec::write_file(&source_copy, contents.as_bytes())?;

    if !ok {
        tracing::warn!(output = %output.display(), "plugins bundle may be incomplete");
    }
    Ok(BundleReport {
        output,
        source_copy,
        degraded: !ok,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BuildMode, PathsConfig};
    use crate::exec::tests::MockRunner;
    use std::fs;
    use tempfile::TempDir;

    fn prod() -> BuildProfile {
        BuildProfile {
            mode: BuildMode::Prod,
            nodocs: false,
        }
    }

    fn layout(tmp: &TempDir) -> Layout {
        Layout::new(tmp.path(), &PathsConfig::default())
    }

    #[test]
    fn escape_liquid_braces() {
        assert_eq!(escape_liquid("f(){{return 1}}"), "f(){ {return 1}}");
        assert_eq!(escape_liquid("{{ x }}"), "{{ x }}");
    }

    #[test]
    fn dev_command_has_debug() {
        let tmp = TempDir::new().unwrap();
        let spec = bundle_command(&layout(&tmp), BuildProfile::default(), &ToolsConfig::default());
        assert_eq!(spec.args.last().unwrap(), "--debug");
        assert!(spec.envs.is_empty());
    }

    #[test]
    fn prod_command_sets_node_env() {
        let tmp = TempDir::new().unwrap();
        let spec = bundle_command(&layout(&tmp), prod(), &ToolsConfig::default());
        assert!(!spec.args.contains(&"--debug".to_string()));
        assert_eq!(spec.envs, vec![("NODE_ENV".into(), "production".into())]);
    }

    #[test]
    fn dev_bundle_writes_both_copies() {
        let tmp = TempDir::new().unwrap();
        let layout = layout(&tmp);
        let runner = MockRunner::new().with_output("browserify", "a(){{b}}");

        let report = bundle_plugins(
            &runner,
            &layout,
            BuildProfile::default(),
            &layout.dev_dir,
            &ToolsConfig::default(),
        )
        .unwrap();

        assert!(!report.degraded);
        assert_eq!(report.output, layout.dev_dir.join("static/js/plugins.js"));
        assert_eq!(fs::read_to_string(&report.output).unwrap(), "a(){{b}}");
        assert_eq!(
            fs::read_to_string(&report.source_copy).unwrap(),
            "---\n---\na(){ {b}}"
        );
        assert_eq!(runner.get_commands().len(), 1);
    }

    #[test]
    fn prod_bundle_is_minified() {
        let tmp = TempDir::new().unwrap();
        let layout = layout(&tmp);
        let runner = MockRunner::new()
            .with_output("browserify", "function a() { return 1; }")
            .with_output("uglifyjs", "function a(){return 1}");

        let report = bundle_plugins(
            &runner,
            &layout,
            prod(),
            &layout.prod_dir,
            &ToolsConfig::default(),
        )
        .unwrap();

        assert!(!report.degraded);
        assert_eq!(
            fs::read_to_string(&report.output).unwrap(),
            "function a(){return 1}"
        );
        let programs: Vec<String> = runner
            .get_commands()
            .into_iter()
            .map(|c| c.program)
            .collect();
        assert_eq!(programs, vec!["browserify", "uglifyjs"]);
    }

    #[test]
    fn bundler_failure_is_swallowed() {
        let tmp = TempDir::new().unwrap();
        let layout = layout(&tmp);
        let runner = MockRunner::new().with_failure("browserify", "partial");

        let report = bundle_plugins(
            &runner,
            &layout,
            BuildProfile::default(),
            &layout.dev_dir,
            &ToolsConfig::default(),
        )
        .unwrap();

        assert!(report.degraded);
        assert_eq!(fs::read_to_string(&report.output).unwrap(), "partial");
    }

    #[test]
    fn minifier_failure_keeps_bundle() {
        let tmp = TempDir::new().unwrap();
        let layout = layout(&tmp);
        let runner = MockRunner::new()
            .with_output("browserify", "full bundle")
            .with_failure("uglifyjs", "");

        let report = bundle_plugins(
            &runner,
            &layout,
            prod(),
            &layout.prod_dir,
            &ToolsConfig::default(),
        )
        .unwrap();

        assert!(report.degraded);
        assert_eq!(fs::read_to_string(&report.output).unwrap(), "full bundle");
    }
}
