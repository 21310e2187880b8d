//! Development server with live reload.
//!
//! Serving is delegated to browser-sync. `serve` starts it on the active
//! output directory; `reload` asks an already running instance (this process
//! or another one) to refresh connected browsers.

use crate::config::{ServerConfig, ToolsConfig};
use crate::exec::{CommandRunner, CommandSpec, ExecError};
use std::path::Path;
use std::process::Child;

/// Command line that serves `out_dir`.
pub fn serve_command(out_dir: &Path, server: &ServerConfig, tools: &ToolsConfig) -> CommandSpec {
    let spec = CommandSpec::new(&tools.browser_sync)
        .arg("start")
        .arg("--server")
        .path_arg(out_dir)
        .arg("--port")
        .arg(server.port.to_string());
    if server.notify {
        spec
    } else {
        spec.arg("--no-notify")
    }
}

/// Command line that triggers a reload in a running server.
pub fn reload_command(server: &ServerConfig, tools: &ToolsConfig) -> CommandSpec {
    CommandSpec::new(&tools.browser_sync)
        .arg("reload")
        .arg("--port")
        .arg(server.port.to_string())
}

/// Ask the dev server to reload.
///
/// A reload is a courtesy signal: when no server is listening the failure is
/// logged and ignored.
pub fn reload(runner: &dyn CommandRunner, server: &ServerConfig, tools: &ToolsConfig) {
    if let Err(err) = runner.run(&reload_command(server, tools)) {
        tracing::warn!("live reload failed: {err}");
    }
}

/// A dev server process owned by this invocation.
///
/// The server is stopped when the handle is dropped.
pub struct DevServer {
    child: Child,
}

impl DevServer {
    pub fn start(spec: &CommandSpec) -> Result<Self, ExecError> {
        crate::output::print_command(spec);
        let child = spec.to_command().spawn().map_err(|source| ExecError::Spawn {
            command: spec.to_string(),
            source,
        })?;
        tracing::info!(pid = child.id(), "dev server started");
        Ok(Self { child })
    }

    /// Block until the server exits.
    pub fn wait(mut self) -> Result<(), ExecError> {
        let status = self.child.wait().map_err(|source| ExecError::Spawn {
            command: "dev server".to_string(),
            source,
        })?;
        if status.success() {
            Ok(())
        } else {
            Err(ExecError::Failed {
                command: "dev server".to_string(),
                code: status.code(),
            })
        }
    }
}

impl Drop for DevServer {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::tests::MockRunner;

    #[test]
    fn serve_command_line() {
        let spec = serve_command(
            Path::new("build-dev"),
            &ServerConfig::default(),
            &ToolsConfig::default(),
        );
        assert_eq!(
            spec.to_string(),
            "browser-sync start --server build-dev --port 3000"
        );
    }

    #[test]
    fn serve_without_notify() {
        let server = ServerConfig {
            port: 4000,
            notify: false,
        };
        let spec = serve_command(Path::new("out"), &server, &ToolsConfig::default());
        assert_eq!(
            spec.to_string(),
            "browser-sync start --server out --port 4000 --no-notify"
        );
    }

    #[test]
    fn reload_failure_is_ignored() {
        let runner = MockRunner::new().with_failure("browser-sync", "");
        reload(&runner, &ServerConfig::default(), &ToolsConfig::default());
        assert_eq!(
            runner.command_lines(),
            vec!["browser-sync reload --port 3000"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn dev_server_stopped_on_drop() {
        let spec = CommandSpec::new("sleep").arg("30");
        let server = DevServer::start(&spec).unwrap();
        let started = std::time::Instant::now();
        drop(server);
        assert!(started.elapsed() < std::time::Duration::from_secs(10));
    }

    #[cfg(unix)]
    #[test]
    fn dev_server_gets_environment_and_working_directory() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("index.html"), "").unwrap();
        let spec = CommandSpec::new("sh")
            .arg("-c")
            .arg(r#"test "$DOCPIPE_SERVE_MODE" = dev && test -f index.html"#)
            .env("DOCPIPE_SERVE_MODE", "dev")
            .current_dir(tmp.path());
        let server = DevServer::start(&spec).unwrap();
        assert!(server.wait().is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn dev_server_exit_status_is_reported() {
        let tmp = tempfile::TempDir::new().unwrap();
        let spec = CommandSpec::new("sh")
            .arg("-c")
            .arg("test -f index.html")
            .current_dir(tmp.path());
        let server = DevServer::start(&spec).unwrap();
        assert!(matches!(
            server.wait(),
            Err(ExecError::Failed { code: Some(1), .. })
        ));
    }
}
