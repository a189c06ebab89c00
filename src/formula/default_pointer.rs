//! Promoting a release to the default formula
//!
//! `Formula/dbt.rb` is what `brew install dbt` resolves to. Replacing it is a
//! separate, opt-in step after the versioned formula has been committed.

use super::extract::FormulaData;
use super::template::{FormulaKind, render};
use super::writer::write_new;
use crate::core::context::ReleaseContext;
use crate::core::error::{ReleaseResult, ResultExt};
use crate::core::vcs::SystemGit;
use std::fs;
use std::path::PathBuf;

/// Path of the default formula in the formula repository
pub fn default_formula_path(ctx: &ReleaseContext) -> PathBuf {
  ctx.formula_dir().join(format!("{}.rb", ctx.config.product.name))
}

/// Replace the default formula with one rendered from `data` and commit it
pub fn update_default(ctx: &ReleaseContext, data: &FormulaData) -> ReleaseResult<PathBuf> {
  let path = default_formula_path(ctx);
  let git = SystemGit::open(ctx.runner, &ctx.config.tools.git, &ctx.homebrew_path)?;

  if path.exists() {
    fs::remove_file(&path).with_context(|| format!("Failed to remove {}", path.display()))?;
  }
  let text = render(data, FormulaKind::Default, &ctx.config.product.formula_class_prefix);
  write_new(&path, &text)?;

  let message = format!("upgrade {} to {}", ctx.config.product.name, data.version);
  git.commit_path(&path, &message)?;

  tracing::info!(path = %path.display(), version = %data.version, "default formula updated");
  Ok(path)
}
