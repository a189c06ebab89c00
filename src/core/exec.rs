//! External process execution
//!
//! Every collaborator the release talks to (bumpversion, python, twine, poet,
//! brew, git) is an external program. Components describe what to run as an
//! [`Invocation`] and hand it to a [`ProcessRunner`]; nothing reads the ambient
//! working directory, every invocation that cares names its own.
//!
//! Invocations are synchronous and blocking. There are no timeouts: a hung tool
//! hangs the release.

use crate::core::error::ProcessFailure;
use std::ffi::{OsStr, OsString};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;

/// A single external command to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
  program: OsString,
  args: Vec<OsString>,
  cwd: Option<PathBuf>,
  merge_output: bool,
}

impl Invocation {
  pub fn new(program: impl AsRef<OsStr>) -> Self {
    Self {
      program: program.as_ref().to_os_string(),
      args: Vec::new(),
      cwd: None,
      merge_output: false,
    }
  }

  pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
    self.args.push(arg.as_ref().to_os_string());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
  {
    self.args.extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
    self
  }

  pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.cwd = Some(dir.into());
    self
  }

  /// Capture stdout and stderr through one pipe, in the order the tool wrote them.
  /// The interleaved text lands in `stdout`; `stderr` stays empty.
  pub fn merged_output(mut self) -> Self {
    self.merge_output = true;
    self
  }

  pub fn merges_output(&self) -> bool {
    self.merge_output
  }

  pub fn program(&self) -> &OsStr {
    &self.program
  }

  pub fn arguments(&self) -> &[OsString] {
    &self.args
  }

  pub fn cwd(&self) -> Option<&Path> {
    self.cwd.as_deref()
  }

  /// Render as a shell-like command line for messages and logs
  pub fn command_line(&self) -> String {
    std::iter::once(&self.program)
      .chain(self.args.iter())
      .map(|part| {
        let s = part.to_string_lossy();
        if s.is_empty() || s.contains(char::is_whitespace) {
          format!("'{}'", s)
        } else {
          s.into_owned()
        }
      })
      .collect::<Vec<_>>()
      .join(" ")
  }
}

/// Captured result of a finished process
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
  /// Exit code, `None` if killed by a signal
  pub status: Option<i32>,
  pub stdout: String,
  pub stderr: String,
}

impl CommandOutput {
  pub fn success(&self) -> bool {
    self.status == Some(0)
  }

  /// Stdout followed by stderr
  ///
  /// Separately captured streams lose their relative order; invocations whose
  /// diagnostics matter use [`Invocation::merged_output`] instead.
  pub fn combined(&self) -> String {
    match (self.stdout.is_empty(), self.stderr.is_empty()) {
      (_, true) => self.stdout.clone(),
      (true, false) => self.stderr.clone(),
      (false, false) => {
        let sep = if self.stdout.ends_with('\n') { "" } else { "\n" };
        format!("{}{}{}", self.stdout, sep, self.stderr)
      }
    }
  }
}

/// Runs external processes
///
/// The seam between the pipeline and the outside world. The system
/// implementation spawns real processes; tests substitute a scripted one.
pub trait ProcessRunner {
  /// Run to completion and capture output. Errors only when the process
  /// could not be started.
  fn run(&self, invocation: &Invocation) -> io::Result<CommandOutput>;

  /// Run and treat anything but a zero exit as a failure
  fn run_checked(&self, invocation: &Invocation) -> Result<CommandOutput, ProcessFailure> {
    match self.run(invocation) {
      Ok(output) if output.success() => Ok(output),
      Ok(output) => Err(ProcessFailure {
        command: invocation.command_line(),
        status: output.status,
        output: output.combined(),
      }),
      Err(err) => Err(ProcessFailure {
        command: invocation.command_line(),
        status: None,
        output: format!("failed to start {}: {}", invocation.program().to_string_lossy(), err),
      }),
    }
  }
}

/// Runs processes with `std::process::Command`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
  fn run(&self, invocation: &Invocation) -> io::Result<CommandOutput> {
    let mut cmd = Command::new(invocation.program());
    cmd.args(invocation.arguments());
    if let Some(cwd) = invocation.cwd() {
      cmd.current_dir(cwd);
    }

    tracing::debug!(
      command = %invocation.command_line(),
      cwd = ?invocation.cwd(),
      "running external command"
    );
    let start = Instant::now();
    let captured = if invocation.merges_output() {
      run_merged(cmd)?
    } else {
      let output = cmd.output()?;
      CommandOutput {
        status: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
      }
    };
    let elapsed_ms = start.elapsed().as_millis();

    tracing::debug!(
      elapsed_ms,
      status = ?captured.status,
      stdout_bytes = captured.stdout.len(),
      stderr_bytes = captured.stderr.len(),
      "external command finished"
    );

    Ok(captured)
  }
}

/// Run with stdout and stderr sharing the write end of one pipe
fn run_merged(mut cmd: Command) -> io::Result<CommandOutput> {
  let (mut reader, writer) = io::pipe()?;
  cmd.stdin(Stdio::null()).stdout(writer.try_clone()?).stderr(writer);
  let mut child = cmd.spawn()?;
  // the command keeps its copies of the write end open until dropped
  drop(cmd);

  let mut merged = Vec::new();
  reader.read_to_end(&mut merged)?;
  let status = child.wait()?;

  Ok(CommandOutput {
    status: status.code(),
    stdout: String::from_utf8_lossy(&merged).into_owned(),
    stderr: String::new(),
  })
}


#[cfg(test)]
mod tests {
  use super::testing::*;
  use super::*;

  #[test]
  fn test_command_line_quotes_whitespace() {
    let inv = Invocation::new("git").args(["commit", "-m", "add dbt@0.15.2"]);
    assert_eq!(inv.command_line(), "git commit -m 'add dbt@0.15.2'");
  }

  #[test]
  fn test_combined_output_joins_streams() {
    let out = CommandOutput {
      status: Some(1),
      stdout: "running sdist".to_string(),
      stderr: "error: no setup.py".to_string(),
    };
    assert_eq!(out.combined(), "running sdist\nerror: no setup.py");
  }

  #[test]
  fn test_run_checked_failure_carries_output() {
    let runner = ScriptedRunner::new().on("setup.py", fail("error: invalid command 'bdist_wheel'"));
    let inv = Invocation::new("python").args(["setup.py", "sdist", "bdist_wheel"]);

    let failure = runner.run_checked(&inv).unwrap_err();
    assert_eq!(failure.status, Some(1));
    assert_eq!(failure.command, "python setup.py sdist bdist_wheel");
    assert!(failure.output.contains("bdist_wheel"));
  }

  #[cfg(unix)]
  #[test]
  fn test_merged_output_keeps_write_order() {
    let inv = Invocation::new("sh")
      .args(["-c", "echo running sdist; echo 'error: gcc failed' >&2; echo cleaning up; exit 3"])
      .merged_output();

    let failure = SystemRunner.run_checked(&inv).unwrap_err();
    assert_eq!(failure.status, Some(3));
    assert_eq!(failure.output, "running sdist\nerror: gcc failed\ncleaning up\n");
  }

  #[test]
  fn test_system_runner_spawn_failure() {
    let inv = Invocation::new("definitely-not-a-real-tool-dbt-release");
    let failure = SystemRunner.run_checked(&inv).unwrap_err();
    assert_eq!(failure.status, None);
    assert!(failure.output.contains("failed to start"));
  }
}
