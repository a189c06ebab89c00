//! Release context - build once, pass everywhere
//!
//! # Design
//!
//! Nothing in the release reads the process's current directory or relies on
//! inherited state. The context carries the source checkout, the formula
//! repository checkout, the loaded configuration and the process runner, and
//! every component receives it explicitly.
//!
//! ```text
//! main.rs:
//!   ReleaseContext::new(...) -> &ReleaseContext
//!   |
//!   v
//! build / publish / formula / pipeline:
//!   fn run(ctx: &ReleaseContext, ...)
//! ```

use crate::core::config::ReleaseConfig;
use crate::core::exec::ProcessRunner;
use std::path::{Path, PathBuf};

/// Everything a release stage needs to know about its surroundings
pub struct ReleaseContext<'a> {
  /// Product source checkout (absolute path)
  pub root: PathBuf,

  /// Homebrew formula repository checkout
  pub homebrew_path: PathBuf,

  /// Release configuration (release.toml or defaults)
  pub config: ReleaseConfig,

  /// Runs every external command
  pub runner: &'a dyn ProcessRunner,
}

impl<'a> ReleaseContext<'a> {
  pub fn new(root: PathBuf, homebrew_path: PathBuf, config: ReleaseConfig, runner: &'a dyn ProcessRunner) -> Self {
    Self {
      root,
      homebrew_path,
      config,
      runner,
    }
  }

  pub fn source_root(&self) -> &Path {
    &self.root
  }

  /// Directory holding formula files in the Homebrew repository
  pub fn formula_dir(&self) -> PathBuf {
    self.homebrew_path.join("Formula")
  }

  /// Location of the disposable virtual environment used for extraction
  pub fn sandbox_path(&self) -> PathBuf {
    self.root.join("build").join("tmp-venv")
  }

  /// Output directory of one package (a subpackage dir or the source root)
  pub fn dist_dir(package_dir: &Path) -> PathBuf {
    package_dir.join("dist")
  }
}
