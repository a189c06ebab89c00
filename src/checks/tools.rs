//! External tool availability

use super::trait_def::{Check, CheckResult};
use crate::core::context::ReleaseContext;
use crate::core::error::ReleaseResult;
use crate::core::exec::Invocation;

/// Every configured tool answers `--version`
pub struct ToolsAvailableCheck;

impl Check for ToolsAvailableCheck {
  fn name(&self) -> &'static str {
    "tools-available"
  }

  fn description(&self) -> &'static str {
    "bumpversion, twine, brew and git can be run"
  }

  fn run(&self, ctx: &ReleaseContext) -> ReleaseResult<CheckResult> {
    let tools = &ctx.config.tools;
    let mut missing = Vec::new();
    let mut found = serde_json::Map::new();

    for program in [&tools.bumpversion, &tools.twine, &tools.brew, &tools.git] {
      let inv = Invocation::new(program).arg("--version").current_dir(ctx.source_root());
      match ctx.runner.run_checked(&inv) {
        Ok(output) => {
          let first = output.combined().lines().next().unwrap_or_default().trim().to_string();
          found.insert(program.clone(), serde_json::Value::String(first));
        }
        Err(failure) => {
          tracing::debug!(%program, %failure, "tool unavailable");
          missing.push(program.as_str());
        }
      }
    }

    let details = serde_json::Value::Object(found);
    if missing.is_empty() {
      Ok(CheckResult::pass(self.name(), "All release tools are available").with_details(details))
    } else {
      Ok(
        CheckResult::error(
          self.name(),
          format!("Not runnable: {}", missing.join(", ")),
          Some("Install the missing tools or point [tools] in release.toml at them"),
        )
        .with_details(details),
      )
    }
  }
}
