//! External command execution.
//!
//! Every heavy step of the pipeline (site generation, style compilation,
//! bundling, the helper scripts) is somebody else's program. This module
//! describes a command as data ([`CommandSpec`]) and runs it through the
//! [`CommandRunner`] trait, so tasks can be tested against a recording runner
//! without spawning anything.
//!
//! Two flavors of execution:
//!
//! - [`CommandRunner::run`]: stdio inherited, non-zero exit is an error.
//! - [`CommandRunner::capture`]: stdout collected, exit status reported
//!   but not judged. Callers decide whether a failure matters.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("Failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("`{command}` exited with {}", exit_label(.code))]
    Failed { command: String, code: Option<i32> },
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (killed by signal)".to_string(),
    }
}

/// A command line to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub envs: Vec<(String, String)>,
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy())
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.cwd = Some(dir.to_path_buf());
        self
    }

    pub(crate) fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        for (key, value) in &self.envs {
            command.env(key, value);
        }
        if let Some(dir) = &self.cwd {
            command.current_dir(dir);
        }
        command
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Output of a captured command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captured {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
}

impl Captured {
    /// Turn a failed exit into [`ExecError::Failed`].
    pub fn check(self, spec: &CommandSpec) -> Result<Vec<u8>, ExecError> {
        if self.success {
            Ok(self.stdout)
        } else {
            Err(ExecError::Failed {
                command: spec.to_string(),
                code: self.code,
            })
        }
    }
}

/// Trait for running external commands.
pub trait CommandRunner: Send + Sync {
    /// Run with inherited stdio; non-zero exit is an error.
    fn run(&self, spec: &CommandSpec) -> Result<(), ExecError>;

    /// Run with stdout captured. Only a failure to start is an error.
    fn capture(&self, spec: &CommandSpec) -> Result<Captured, ExecError>;
}

/// Runner that spawns real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> Result<(), ExecError> {
        crate::output::print_command(spec);
        let status = spec
            .to_command()
            .status()
            .map_err(|source| ExecError::Spawn {
                command: spec.to_string(),
                source,
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(ExecError::Failed {
                command: spec.to_string(),
                code: status.code(),
            })
        }
    }

    fn capture(&self, spec: &CommandSpec) -> Result<Captured, ExecError> {
        crate::output::print_command(spec);
        let output = spec
            .to_command()
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|source| ExecError::Spawn {
                command: spec.to_string(),
                source,
            })?;
        Ok(Captured {
            success: output.status.success(),
            code: output.status.code(),
            stdout: output.stdout,
        })
    }
}

/// Run `spec` and write its stdout to `dest`, failing on non-zero exit.
pub fn run_piped(
    runner: &dyn CommandRunner,
    spec: &CommandSpec,
    dest: &Path,
) -> Result<(), ExecError> {
    let stdout = runner.capture(spec)?.check(spec)?;
    write_file(dest, &stdout)
}

/// Write `contents` to `path`, creating parent directories.
pub fn write_file(path: &Path, contents: &[u8]) -> Result<(), ExecError> {
    let io_err = |source| ExecError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, contents).map_err(io_err)
}
