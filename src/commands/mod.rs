//! CLI commands for dbt-release
//!
//! - **release**: bump, build, publish and generate the Homebrew formula
//! - **formula**: only the Homebrew half, for an already published version
//! - **doctor**: run the release preconditions and report
//!
//! Every command builds one [`ReleaseContext`] from its path arguments and
//! hands it down.

pub mod doctor;
pub mod formula;
pub mod release;

pub use doctor::run_doctor;
pub use formula::{FormulaArgs, run_formula};
pub use release::{ReleaseArgs, run_release};

use crate::core::config::ReleaseConfig;
use crate::core::context::ReleaseContext;
use crate::core::error::{ReleaseError, ReleaseResult, ResultExt};
use crate::core::exec::ProcessRunner;
use std::env;
use std::path::{Path, PathBuf};

/// Directory name of the formula repository checked out next to the product
const HOMEBREW_CHECKOUT: &str = "homebrew-dbt";

/// Resolve paths, load configuration and build the context
pub fn load_context<'a>(
  path: Option<PathBuf>,
  homebrew_path: Option<PathBuf>,
  runner: &'a dyn ProcessRunner,
) -> ReleaseResult<ReleaseContext<'a>> {
  let cwd = env::current_dir().context("Failed to get current directory")?;
  let root = resolve_root(path.as_deref().unwrap_or(&cwd))?;
  let homebrew_path = match homebrew_path {
    Some(p) => std::path::absolute(&p).with_context(|| format!("Invalid --homebrew-path {}", p.display()))?,
    None => cwd.join("..").join(HOMEBREW_CHECKOUT),
  };

  let config = ReleaseConfig::load(&root)?;
  tracing::debug!(root = %root.display(), homebrew = %homebrew_path.display(), "release context ready");
  Ok(ReleaseContext::new(root, homebrew_path, config, runner))
}

fn resolve_root(path: &Path) -> ReleaseResult<PathBuf> {
  if !path.is_dir() {
    return Err(ReleaseError::with_help(
      format!("Source root not found: {}", path.display()),
      "Pass --path pointing at the dbt checkout",
    ));
  }
  path
    .canonicalize()
    .with_context(|| format!("Failed to resolve {}", path.display()))
}
