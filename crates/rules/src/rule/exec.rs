//! Command execution for a rendered rule.
//!
//! Commands run one at a time with `tokio::process`, in the rule's working
//! directory. Redirection files are opened per command and closed before
//! the next one starts, whatever the outcome.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info, warn};

use super::Rule;
use crate::error::{ActionError, Result};
use crate::paths;
use crate::schema::CommandLine;

/// The last command that ran and its exit code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub command: CommandLine,
    /// `-1` when the process was terminated by a signal.
    pub exit_code: i32,
}

impl CommandOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Open handles for the child's stdout and stderr.
struct Redirect {
    stdout: Option<File>,
    stderr: Option<File>,
}

impl Redirect {
    fn open(stdout: Option<&str>, stderr: Option<&str>) -> Result<Redirect> {
        let stdout = stdout.filter(|s| !s.is_empty()).map(PathBuf::from);
        let stderr = stderr.filter(|s| !s.is_empty()).map(PathBuf::from);

        if let (Some(out), Some(err)) = (&stdout, &stderr) {
            if paths::same_file(out, err) {
                let file = create(out)?;
                let shared = file.try_clone().map_err(|e| ActionError::io(out, e))?;
                return Ok(Redirect {
                    stdout: Some(file),
                    stderr: Some(shared),
                });
            }
        }

        Ok(Redirect {
            stdout: stdout.as_deref().map(create).transpose()?,
            stderr: stderr.as_deref().map(create).transpose()?,
        })
    }
}

fn create(path: &Path) -> Result<File> {
    File::create(path).map_err(|e| ActionError::io(path, e))
}

fn seconds(value: u64) -> Option<Duration> {
    (value > 0).then(|| Duration::from_secs(value))
}

impl Rule {
    /// Timeout for this rule's commands: the rule's `timeout`, then its
    /// `options.timeout`, then `call`. Zero means no timeout.
    pub fn effective_timeout(&self, call: Option<Duration>) -> Option<Duration> {
        match self.timeout.or(self.options.timeout) {
            Some(secs) => seconds(secs),
            None => call.filter(|d| !d.is_zero()),
        }
    }

    /// Shell interpreter for this rule: its own `options.shell_path` when set,
    /// `session` otherwise.
    pub fn effective_shell(&self, session: &Path) -> PathBuf {
        match self.options.shell_path.as_deref() {
            Some(shell) if !shell.is_empty() => PathBuf::from(shell),
            _ => session.to_path_buf(),
        }
    }

    /// Run every command in order, stopping at the first non-zero exit code.
    pub async fn run(
        &self,
        shell_path: &Path,
        timeout: Option<Duration>,
        debug: bool,
    ) -> Result<CommandOutcome> {
        self.run_with(shell_path, timeout, debug, |_, _| {}).await
    }

    /// Like [`Rule::run`], calling `on_start` before each command is spawned.
    pub async fn run_with<F>(
        &self,
        shell_path: &Path,
        timeout: Option<Duration>,
        debug: bool,
        mut on_start: F,
    ) -> Result<CommandOutcome>
    where
        F: FnMut(&CommandLine, Option<Duration>),
    {
        let commands = self.command_lines()?;
        let timeout = self.effective_timeout(timeout);
        let shell = self.effective_shell(shell_path);
        if self.shell && !paths::is_executable(&shell) {
            return Err(ActionError::Environment(format!(
                "the shell '{}' is not executable",
                shell.display()
            )));
        }

        let mut outcome = None;
        for command in commands {
            on_start(command, timeout);
            let exit_code = self.run_one(command, &shell, timeout, debug).await?;
            outcome = Some(CommandOutcome {
                command: command.clone(),
                exit_code,
            });
            if exit_code != 0 {
                break;
            }
        }

        outcome.ok_or_else(|| {
            ActionError::Execution(format!(
                "the command list of the rule loaded from '{}' is empty",
                self.source_file.display()
            ))
        })
    }

    async fn run_one(
        &self,
        command: &CommandLine,
        shell: &Path,
        timeout: Option<Duration>,
        debug: bool,
    ) -> Result<i32> {
        let cwd = PathBuf::from(&self.cwd);

        let (program, args) = if self.shell {
            let line = command.to_shell_line().map_err(ActionError::Execution)?;
            (shell.to_path_buf(), vec!["-c".to_string(), line])
        } else {
            let mut argv = command.to_argv().map_err(ActionError::Execution)?;
            if argv.is_empty() {
                return Err(ActionError::Execution("the command is empty".to_string()));
            }
            let program = paths::which(&argv.remove(0), Some(&cwd), None)?;
            (program, argv)
        };

        if debug {
            info!(program = %program.display(), args = ?args, cwd = %cwd.display(), "spawning command");
        } else {
            debug!(program = %program.display(), args = ?args, cwd = %cwd.display(), "spawning command");
        }

        let mut child = {
            let redirect = Redirect::open(self.stdout.as_deref(), self.stderr.as_deref())?;
            let mut cmd = Command::new(&program);
            cmd.args(&args).current_dir(&cwd).kill_on_drop(true);
            if let Some(out) = redirect.stdout {
                cmd.stdout(Stdio::from(out));
            }
            if let Some(err) = redirect.stderr {
                cmd.stderr(Stdio::from(err));
            }
            // Dropping `cmd` at the end of this block closes the parent's
            // copies of the redirection handles.
            cmd.spawn().map_err(|e| {
                ActionError::Execution(format!(
                    "failed to run '{}' in '{}': {e}",
                    program.display(),
                    cwd.display()
                ))
            })?
        };

        let waited = match timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(waited) => waited,
                Err(_) => {
                    warn!(command = %command, timeout_secs = limit.as_secs(), "command timed out");
                    if let Err(e) = child.kill().await {
                        warn!(error = %e, "failed to kill the timed out command");
                    }
                    return Err(ActionError::Timeout {
                        command: command.to_string(),
                        timeout: limit,
                    });
                }
            },
            None => child.wait().await,
        };

        let status = waited
            .map_err(|e| ActionError::Execution(format!("failed to wait for '{command}': {e}")))?;
        let exit_code = status.code().unwrap_or(-1);
        debug!(command = %command, exit_code, "command finished");
        Ok(exit_code)
    }
}
