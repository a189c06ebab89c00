//! Integration tests for `dbt-release formula`

use crate::helpers::*;
use anyhow::Result;
use std::fs;

#[test]
fn test_print_renders_without_writing() -> Result<()> {
  let fx = ReleaseFixture::new()?;

  let output = fx.run_ok(&["formula", "0.16.0b1", "--print"])?;
  let text = stdout(&output);
  assert!(text.starts_with("\nclass DbtAT0160B1 < Formula\n"));
  assert!(text.contains("version \"0.16.0b1\""));
  assert!(text.ends_with("  end\n\nend\n"));

  assert!(!fx.formula("dbt@0.16.0-b1.rb").exists());
  let lines = fx.log_lines();
  assert_eq!(count(&lines, "poet -s dbt"), 1);
  assert!(!lines.iter().any(|l| l.starts_with("brew ")));
  assert_eq!(count(&lines, "bumpversion"), 0);
  Ok(())
}

#[test]
fn test_second_run_for_same_version_fails() -> Result<()> {
  let fx = ReleaseFixture::new()?;

  fx.run_ok(&["formula", "0.15.2"])?;
  let first = fs::read_to_string(fx.formula("dbt@0.15.2.rb"))?;
  assert_eq!(fx.brew_log()?[0], "add dbt@0.15.2");

  let output = fx.run(&["formula", "0.15.2"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("Formula already exists"));
  assert_eq!(fs::read_to_string(fx.formula("dbt@0.15.2.rb"))?, first);
  assert_eq!(fx.brew_log()?.len(), 2);
  Ok(())
}

#[test]
fn test_formula_does_not_publish() -> Result<()> {
  let fx = ReleaseFixture::new()?;
  fx.run_ok(&["formula", "0.15.2", "--set-default"])?;

  let lines = fx.log_lines();
  assert_eq!(count(&lines, "twine"), 0);
  assert_eq!(count(&lines, "setup.py"), 0);
  assert_eq!(fx.brew_log()?[0], "upgrade dbt to 0.15.2");
  Ok(())
}
