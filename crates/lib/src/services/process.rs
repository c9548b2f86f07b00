//! Subprocess execution.

use std::ffi::OsStr;
use std::path::Path;
use std::process::Command;

use tracing::{debug, info};

use super::ServiceError;

/// Run a program to completion and return its trimmed stdout.
///
/// Output is captured; on failure stderr is kept on the error and both
/// streams are logged at debug level.
pub fn run<I, S>(program: &OsStr, args: I, cwd: Option<&Path>) -> Result<String, ServiceError>
where
  I: IntoIterator<Item = S>,
  S: AsRef<OsStr>,
{
  let mut command = Command::new(program);
  command.args(args);
  if let Some(cwd) = cwd {
    command.current_dir(cwd);
  }

  let command_line = describe(&command);
  info!(cmd = %command_line, "executing command");

  let output = command.output().map_err(|source| ServiceError::Spawn {
    program: program.to_string_lossy().into_owned(),
    source,
  })?;

  let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
  let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

  if !output.status.success() {
    if !stderr.is_empty() {
      debug!(stderr = %stderr, "command stderr");
    }
    if !stdout.is_empty() {
      debug!(stdout = %stdout, "command stdout");
    }
    return Err(ServiceError::Failed {
      command: command_line,
      status: output.status.to_string(),
      stderr,
    });
  }

  if !stdout.is_empty() {
    debug!(stdout = %stdout, "command output");
  }
  Ok(stdout)
}

/// Run a shell snippet with `bash -c`.
pub fn run_shell(snippet: &str, cwd: &Path) -> Result<String, ServiceError> {
  run(OsStr::new("bash"), ["-c", snippet], Some(cwd))
}

fn describe(command: &Command) -> String {
  std::iter::once(command.get_program())
    .chain(command.get_args())
    .map(|part| part.to_string_lossy())
    .collect::<Vec<_>>()
    .join(" ")
}
