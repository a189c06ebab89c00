//! Homebrew formula generation
//!
//! - **extract**: install the released package in a sandbox and read formula data
//! - **template**: render formula text
//! - **writer**: create formula files without overwriting
//! - **verify**: uninstall, install, test and audit with `brew`
//! - **default_pointer**: replace `Formula/dbt.rb` with the new release

pub mod default_pointer;
pub mod extract;
pub mod template;
pub mod verify;
pub mod writer;

pub use default_pointer::update_default;
pub use extract::{FormulaData, extract};
pub use template::{FormulaKind, render};
pub use verify::verify;
pub use writer::FormulaFile;

use crate::core::context::ReleaseContext;
use crate::core::error::ReleaseResult;
use crate::core::vcs::SystemGit;
use crate::version::Version;
use std::path::{Path, PathBuf};

/// Where the versioned formula for `version` lives
pub fn formula_path(ctx: &ReleaseContext, version: &Version) -> PathBuf {
  ctx.formula_dir().join(version.filename_for(&ctx.config.product.name))
}

/// Render the versioned formula for `data` at its canonical path
pub fn versioned_formula(ctx: &ReleaseContext, data: &FormulaData) -> FormulaFile {
  FormulaFile::new(
    formula_path(ctx, &data.version),
    render(data, FormulaKind::Versioned, &ctx.config.product.formula_class_prefix),
  )
}

/// Stage and commit a versioned formula in the formula repository
pub fn commit_formula(ctx: &ReleaseContext, path: &Path, version: &Version) -> ReleaseResult<()> {
  let git = SystemGit::open(ctx.runner, &ctx.config.tools.git, &ctx.homebrew_path)?;
  git.commit_path(path, &format!("add {}@{}", ctx.config.product.name, version))?;
  tracing::info!(repo = %git.work_tree().display(), path = %path.display(), %version, "formula committed");
  Ok(())
}
