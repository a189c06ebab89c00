//! Integration tests for `dbt-release doctor`

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_doctor_passes_with_matching_tools() -> Result<()> {
  let fx = ReleaseFixture::new()?;

  let output = fx.run_ok(&["doctor"])?;
  let out = stdout(&output);
  assert!(out.contains("✅ python-version"));
  assert!(out.contains("✅ wheel-installed"));
  assert!(out.contains("✅ tools-available"));
  assert!(out.contains("Summary: 3/3 checks passed"));
  Ok(())
}

#[test]
fn test_doctor_json_reports_interpreter_mismatch() -> Result<()> {
  let fx = ReleaseFixture::new()?;

  let output = fx.run_with_env(&["doctor", "--json"], &[("FAKE_PYTHON_VERSION", "3.8.2")])?;
  assert_eq!(output.status.code(), Some(3));

  let results: serde_json::Value = serde_json::from_slice(&output.stdout)?;
  let results = results.as_array().unwrap();
  assert_eq!(results.len(), 3);
  assert_eq!(results[0]["check_name"], "python-version");
  assert_eq!(results[0]["passed"], false);
  assert_eq!(results[0]["details"]["version"], "3.8.2");
  assert_eq!(results[1]["passed"], true);
  Ok(())
}
