//! The `git` binary as an external collaborator.

use crate::error::{PackagifyError, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Captured result of one external command.
///
/// A non-zero exit is reported here rather than as an error; callers decide
/// whether it is fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub command: String,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Returns true if the command exited with status 0.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs `git` subcommands, capturing their output.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: PathBuf,
}

impl Default for GitCli {
    fn default() -> Self {
        Self {
            program: PathBuf::from("git"),
        }
    }
}

impl GitCli {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a specific `git` executable.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Runs `git <args>` in `cwd`. Only a failure to spawn is an `Err`.
    pub fn run<I, S>(&self, args: I, cwd: Option<&Path>) -> Result<CommandOutput>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(&self.program);
        cmd.args(args);
        if let Some(cwd) = cwd {
            cmd.current_dir(cwd);
        }

        let command = format!(
            "{} {}",
            self.program.display(),
            cmd.get_args()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );
        debug!(command = %command, "running");

        let output = cmd.output()?;
        Ok(CommandOutput {
            command,
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Fetches an upstream repository into a local directory.
pub trait CloneOps {
    /// Clones `url` at `reference` (tag or branch) into `target`, history depth 1.
    fn shallow_clone(&self, url: &str, reference: &str, target: &Path) -> Result<()>;
}

impl CloneOps for GitCli {
    fn shallow_clone(&self, url: &str, reference: &str, target: &Path) -> Result<()> {
        info!(repo = %url, reference = %reference, "cloning");

        let args = [
            OsStr::new("clone"),
            OsStr::new("--quiet"),
            OsStr::new("-c"),
            OsStr::new("advice.detachedHead=false"),
            OsStr::new("--branch"),
            OsStr::new(reference),
            OsStr::new("--depth"),
            OsStr::new("1"),
            OsStr::new(url),
            target.as_os_str(),
        ];

        let output = self.run(args, None).map_err(|e| PackagifyError::CloneError {
            repo: url.to_string(),
            message: e.to_string(),
        })?;

        if !output.success() {
            return Err(PackagifyError::CloneError {
                repo: url.to_string(),
                message: output.stderr.trim().to_string(),
            });
        }

        info!("clone completed");
        Ok(())
    }
}
