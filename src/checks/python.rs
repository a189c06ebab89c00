//! Interpreter checks
//!
//! Homebrew builds dbt against one Python minor version, so the packages must
//! be built with the same one. Building also needs `wheel` for `bdist_wheel`.

use super::trait_def::{Check, CheckResult};
use crate::core::context::ReleaseContext;
use crate::core::error::{ReleaseError, ReleaseResult};
use crate::core::exec::Invocation;
use semver::{Version, VersionReq};

const VERSION_SNIPPET: &str = "import sys; print('%d.%d.%d' % sys.version_info[:3])";

/// The configured interpreter matches `required_python`
pub struct PythonVersionCheck;

impl Check for PythonVersionCheck {
  fn name(&self) -> &'static str {
    "python-version"
  }

  fn description(&self) -> &'static str {
    "Build interpreter matches the Homebrew Python version"
  }

  fn run(&self, ctx: &ReleaseContext) -> ReleaseResult<CheckResult> {
    let python = &ctx.config.tools.python;
    let required = &ctx.config.homebrew.required_python;
    let req = VersionReq::parse(&format!("~{}", required))
      .map_err(|e| ReleaseError::message(format!("Invalid required_python '{}': {}", required, e)))?;

    let inv = Invocation::new(python)
      .args(["-c", VERSION_SNIPPET])
      .current_dir(ctx.source_root());
    let output = match ctx.runner.run_checked(&inv) {
      Ok(output) => output,
      Err(failure) => {
        return Ok(CheckResult::error(
          self.name(),
          format!("Could not query {}: {}", python, failure),
          Some(format!("Install Python {} or set [tools] python in release.toml", required)),
        ));
      }
    };

    let found = output.stdout.trim();
    let version = Version::parse(found)
      .map_err(|e| ReleaseError::message(format!("Unexpected interpreter version '{}': {}", found, e)))?;

    let details = serde_json::json!({ "interpreter": python, "version": found, "required": required });
    if req.matches(&version) {
      Ok(CheckResult::pass(self.name(), format!("{} is Python {}", python, found)).with_details(details))
    } else {
      Ok(
        CheckResult::error(
          self.name(),
          format!("{} is Python {}, releases must be built with Python {}", python, found, required),
          Some(format!("Run with a Python {} interpreter", required)),
        )
        .with_details(details),
      )
    }
  }
}

/// `wheel` is importable by the configured interpreter
pub struct WheelInstalledCheck;

impl Check for WheelInstalledCheck {
  fn name(&self) -> &'static str {
    "wheel-installed"
  }

  fn description(&self) -> &'static str {
    "The wheel package is available for bdist_wheel"
  }

  fn run(&self, ctx: &ReleaseContext) -> ReleaseResult<CheckResult> {
    let inv = Invocation::new(&ctx.config.tools.python)
      .args(["-c", "import wheel"])
      .current_dir(ctx.source_root());

    match ctx.runner.run_checked(&inv) {
      Ok(_) => Ok(CheckResult::pass(self.name(), "wheel is importable")),
      Err(failure) => Ok(CheckResult::error(
        self.name(),
        format!("wheel is not importable: {}", failure.output.trim()),
        Some("The wheel package is required to build. Please run: pip install -r dev_requirements.txt"),
      )),
    }
  }
}
