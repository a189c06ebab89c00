//! Check runner for executing release preconditions

use super::python::{PythonVersionCheck, WheelInstalledCheck};
use super::tools::ToolsAvailableCheck;
use super::trait_def::{Check, CheckResult};
use crate::core::context::ReleaseContext;
use crate::core::error::{ReleaseError, ReleaseResult};

/// Runs a list of checks in registration order
pub struct CheckRunner {
  checks: Vec<Box<dyn Check>>,
}

impl CheckRunner {
  pub fn new() -> Self {
    Self { checks: Vec::new() }
  }

  pub fn add_check(&mut self, check: Box<dyn Check>) {
    self.checks.push(check);
  }

  /// Run all checks and collect results
  ///
  /// A check that cannot run at all is reported as a failed result rather
  /// than stopping the others.
  pub fn run_all(&self, ctx: &ReleaseContext) -> Vec<CheckResult> {
    self
      .checks
      .iter()
      .map(|check| {
        let result = check.run(ctx).unwrap_or_else(|err| {
          CheckResult::error(
            check.name(),
            format!("Check failed to run: {}", err),
            Some("Re-run with --verbose for details"),
          )
        });
        tracing::debug!(check = check.name(), passed = result.passed, "check finished");
        result
      })
      .collect()
  }

  pub fn checks(&self) -> &[Box<dyn Check>] {
    &self.checks
  }
}

impl Default for CheckRunner {
  fn default() -> Self {
    Self::new()
  }
}

/// Create a runner with all built-in checks
pub fn create_default_runner() -> CheckRunner {
  let mut runner = CheckRunner::new();
  runner.add_check(Box::new(PythonVersionCheck));
  runner.add_check(Box::new(WheelInstalledCheck));
  runner.add_check(Box::new(ToolsAvailableCheck));
  runner
}

/// Turn blocking check failures into an environment error
pub fn ensure_ready(results: &[CheckResult]) -> ReleaseResult<()> {
  let blocking: Vec<&CheckResult> = results.iter().filter(|r| r.is_blocking()).collect();
  if blocking.is_empty() {
    return Ok(());
  }

  let message = blocking
    .iter()
    .map(|r| format!("{}: {}", r.check_name, r.message))
    .collect::<Vec<_>>()
    .join("; ");
  let help = blocking
    .iter()
    .filter_map(|r| r.suggestion.clone())
    .collect::<Vec<_>>()
    .join("\n");

  Err(ReleaseError::Environment {
    message,
    help: (!help.is_empty()).then_some(help),
  })
}
