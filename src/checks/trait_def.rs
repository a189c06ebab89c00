//! Check trait abstraction for release preconditions
//!
//! Every check implements [`Check`]. The release refuses to start while any
//! error-severity check fails; `doctor` runs the same checks on demand.

use crate::core::context::ReleaseContext;
use crate::core::error::ReleaseResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity level for check results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
  /// Informational message (not an issue)
  Info,
  /// Warning (non-blocking, but should be addressed)
  Warning,
  /// Error (blocking, must be fixed)
  Error,
}

impl fmt::Display for Severity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Severity::Info => write!(f, "INFO"),
      Severity::Warning => write!(f, "WARN"),
      Severity::Error => write!(f, "ERROR"),
    }
  }
}

/// Result of running a check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
  pub check_name: String,
  pub passed: bool,
  pub severity: Severity,
  pub message: String,
  /// Suggested fix, shown under failures
  pub suggestion: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub details: Option<serde_json::Value>,
}

impl CheckResult {
  pub fn pass(check_name: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      check_name: check_name.into(),
      passed: true,
      severity: Severity::Info,
      message: message.into(),
      suggestion: None,
      details: None,
    }
  }

  pub fn error(check_name: impl Into<String>, message: impl Into<String>, suggestion: Option<impl Into<String>>) -> Self {
    Self {
      check_name: check_name.into(),
      passed: false,
      severity: Severity::Error,
      message: message.into(),
      suggestion: suggestion.map(|s| s.into()),
      details: None,
    }
  }

  pub fn with_details(mut self, details: serde_json::Value) -> Self {
    self.details = Some(details);
    self
  }

  /// Failed with error severity
  pub fn is_blocking(&self) -> bool {
    !self.passed && self.severity == Severity::Error
  }
}

/// A release precondition
///
/// Checks talk to the outside world only through the context's process
/// runner, so they can be exercised with a scripted one.
pub trait Check {
  /// Unique name for this check (kebab-case)
  fn name(&self) -> &'static str;

  fn description(&self) -> &'static str;

  /// Run the check. `Err` means the check itself could not run.
  fn run(&self, ctx: &ReleaseContext) -> ReleaseResult<CheckResult>;
}
