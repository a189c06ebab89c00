//! Checking a generated formula with Homebrew itself

use crate::core::context::ReleaseContext;
use crate::core::error::{ReleaseError, ReleaseResult};
use crate::core::exec::Invocation;
use std::path::Path;

/// One `brew` step: a label for errors and its arguments
struct Step {
  name: &'static str,
  args: Vec<String>,
}

fn steps(formula_path: &Path, formula_name: &str) -> Vec<Step> {
  let path = formula_path.to_string_lossy().into_owned();
  vec![
    Step {
      name: "brew uninstall",
      args: vec!["uninstall".into(), "--force".into(), path.clone()],
    },
    Step {
      name: "brew install",
      args: vec!["install".into(), path],
    },
    Step {
      name: "brew test",
      args: vec!["test".into(), formula_name.into()],
    },
    Step {
      name: "brew audit",
      args: vec!["audit".into(), "--strict".into(), formula_name.into()],
    },
  ]
}

/// Reinstall the formula from `formula_path`, then test and audit it
///
/// The first failing step stops verification and is named in the error.
pub fn verify(ctx: &ReleaseContext, formula_path: &Path) -> ReleaseResult<()> {
  let formula_name = ctx.config.product.name.as_str();
  for step in steps(formula_path, formula_name) {
    let inv = Invocation::new(&ctx.config.tools.brew)
      .args(&step.args)
      .current_dir(&ctx.homebrew_path)
      .merged_output();
    ctx
      .runner
      .run_checked(&inv)
      .map_err(|failure| ReleaseError::VerificationFailed {
        step: step.name,
        failure,
      })?;
    tracing::debug!(step = step.name, "formula verification step passed");
  }

  tracing::info!(path = %formula_path.display(), "formula verified");
  Ok(())
}
