//! System git backend for the formula repository
//!
//! Uses plain git porcelain through the process runner: the release only ever
//! needs to stage a formula file and commit it.

use crate::core::error::{GitError, ReleaseError, ReleaseResult};
use crate::core::exec::{Invocation, ProcessRunner};
use std::path::{Path, PathBuf};

/// Git backend using the system `git` binary
pub struct SystemGit<'a> {
  /// Program name or path for git
  program: String,

  /// Working tree root
  pub(crate) work_tree: PathBuf,

  runner: &'a dyn ProcessRunner,
}

impl<'a> SystemGit<'a> {
  /// Open a git repository
  ///
  /// This performs ONE subprocess call to resolve the working tree root.
  pub fn open(runner: &'a dyn ProcessRunner, program: &str, path: &Path) -> ReleaseResult<Self> {
    let inv = Invocation::new(program)
      .arg("-C")
      .arg(path)
      .args(["rev-parse", "--show-toplevel"]);

    let output = runner
      .run(&inv)
      .map_err(|e| {
        ReleaseError::Git(GitError::CommandFailed {
          command: inv.command_line(),
          stderr: format!("failed to start {}: {}", program, e),
        })
      })?;

    if !output.success() {
      if output.stderr.contains("not a git repository") || output.stderr.contains("cannot change to") {
        return Err(ReleaseError::Git(GitError::RepoNotFound {
          path: path.to_path_buf(),
        }));
      }
      return Err(ReleaseError::Git(GitError::CommandFailed {
        command: inv.command_line(),
        stderr: output.combined(),
      }));
    }

    let work_tree = output.stdout.trim();
    let work_tree = if work_tree.is_empty() {
      path.to_path_buf()
    } else {
      PathBuf::from(work_tree)
    };

    Ok(Self {
      program: program.to_string(),
      work_tree,
      runner,
    })
  }

  pub fn work_tree(&self) -> &Path {
    &self.work_tree
  }

  /// Stage a single path
  pub fn add(&self, path: &Path) -> ReleaseResult<()> {
    self.exec(self.git_cmd().arg("add").arg(path))
  }

  /// Commit what is staged
  pub fn commit(&self, message: &str) -> ReleaseResult<()> {
    self.exec(self.git_cmd().args(["commit", "-m", message]))
  }

  /// Stage one path and commit it
  pub fn commit_path(&self, path: &Path, message: &str) -> ReleaseResult<()> {
    self.add(path)?;
    self.commit(message)
  }

  fn exec(&self, inv: Invocation) -> ReleaseResult<()> {
    self.runner.run_checked(&inv).map_err(|f| {
      ReleaseError::Git(GitError::CommandFailed {
        command: f.command,
        stderr: f.output,
      })
    })?;
    Ok(())
  }

  /// Base git invocation rooted at the working tree
  ///
  /// - Runs against the work tree regardless of the caller's directory
  /// - Keeps paths unescaped in output
  pub(crate) fn git_cmd(&self) -> Invocation {
    Invocation::new(&self.program)
      .arg("-C")
      .arg(&self.work_tree)
      .args(["-c", "core.quotePath=false"])
  }
}
