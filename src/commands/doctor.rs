//! Health check command for the release environment

use super::load_context;
use crate::checks::{Severity, create_default_runner, ensure_ready};
use crate::core::error::ReleaseResult;
use crate::core::exec::SystemRunner;
use std::path::PathBuf;

/// Run every precondition and report; blocking failures exit with a validation error
pub fn run_doctor(path: Option<PathBuf>, json: bool) -> ReleaseResult<()> {
  let runner = SystemRunner;
  let ctx = load_context(path, None, &runner)?;

  let checks = create_default_runner();
  let results = checks.run_all(&ctx);

  if json {
    println!("{}", serde_json::to_string_pretty(&results)?);
    return ensure_ready(&results);
  }

  println!("🏥 Checking the release environment...\n");
  println!("📋 Registered checks:");
  for check in checks.checks() {
    println!("   • {}: {}", check.name(), check.description());
  }
  println!();

  for result in &results {
    let icon = if result.passed { "✅" } else { "❌" };
    println!("{} {}: {}", icon, result.check_name, result.message);
    if !result.passed
      && let Some(suggestion) = &result.suggestion
    {
      println!("   💡 Fix: {}", suggestion);
    }
  }

  let passed = results.iter().filter(|r| r.passed).count();
  println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
  println!("Summary: {}/{} checks passed", passed, results.len());

  if results.iter().any(|r| r.is_blocking()) {
    println!("\n⚠️  Fix the errors above before releasing.");
  } else if results.iter().any(|r| !r.passed && r.severity == Severity::Warning) {
    println!("\n⚠️  Some warnings found. Consider addressing them.");
  } else {
    println!("\n✨ Ready to release.");
  }

  ensure_ready(&results)
}
