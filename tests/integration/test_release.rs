//! Integration tests for `dbt-release release`

use crate::helpers::*;
use anyhow::Result;
use std::fs;

#[test]
fn test_full_release() -> Result<()> {
  let fx = ReleaseFixture::new()?;
  let output = fx.run_ok(&["release", "0.15.2", "patch", "--yes", "--json"])?;

  let report: serde_json::Value = serde_json::from_slice(&output.stdout)?;
  assert_eq!(report["version"], "0.15.2");
  assert_eq!(report["part"], "patch");
  let stages: Vec<&str> = report["stages"]
    .as_array()
    .unwrap()
    .iter()
    .map(|s| s["stage"].as_str().unwrap())
    .collect();
  assert_eq!(
    stages,
    vec![
      "VersionBumped",
      "PackagesBuilt",
      "StagingPublished",
      "AwaitingHumanConfirmation",
      "ProductionPublished",
      "FormulaExtracted",
      "FormulaWritten",
      "FormulaVerified",
      "FormulaCommitted",
    ]
  );
  assert_eq!(report["release"]["artifacts"].as_array().unwrap().len(), 12);

  let lines = fx.log_lines();
  let ordered = [
    "bumpversion --commit --no-tag --new-version 0.15.2 patch",
    "python setup.py sdist bdist_wheel",
    "twine upload --repository pypitest",
    "python -m venv",
    "venv-python -m pip install --upgrade homebrew-pypi-poet dbt==0.15.2",
    "poet -s dbt",
    "poet -r dbt",
    "brew uninstall --force",
    "brew install",
    "brew test dbt",
    "brew audit --strict dbt",
  ];
  let positions: Vec<usize> = ordered
    .iter()
    .map(|n| position(&lines, n).unwrap_or_else(|| panic!("{n} never ran: {lines:#?}")))
    .collect();
  assert!(positions.windows(2).all(|w| w[0] < w[1]), "{lines:#?}");
  assert_eq!(count(&lines, "setup.py sdist bdist_wheel"), 6);
  assert_eq!(count(&lines, "twine upload"), 2);

  // both uploads carry every artifact
  let upload = lines.iter().find(|l| l.starts_with("twine upload")).unwrap();
  assert_eq!(upload.matches(".tar.gz").count(), 6);
  assert_eq!(upload.matches(".whl").count(), 6);

  let formula = fs::read_to_string(fx.formula("dbt@0.15.2.rb"))?;
  assert!(formula.contains("class DbtAT0152 < Formula"));
  assert!(formula.contains("  url \"https://files.pythonhosted.org/packages/0b/eb/dbt-0.15.2.tar.gz\"\n"));
  assert!(formula.contains("resource \"agate\" do"));
  assert_eq!(fx.brew_log()?[0], "add dbt@0.15.2");

  // default formula untouched without the flag, sandbox cleaned up
  assert!(fs::read_to_string(fx.formula("dbt.rb"))?.contains("0.14.4"));
  assert!(!fx.src.join("build/tmp-venv").exists());
  Ok(())
}

#[test]
fn test_second_subpackage_failure_stops_release() -> Result<()> {
  let fx = ReleaseFixture::new()?;
  fx.fail_build_in("plugins/postgres")?;

  let output = fx.run(&["release", "0.15.2", "patch", "--yes"])?;
  assert_eq!(output.status.code(), Some(2));

  let err = stderr(&output);
  assert!(err.contains("Build failed for plugins/postgres"), "{err}");
  assert!(err.contains("command 'gcc' failed"), "{err}");
  assert!(
    err.contains("Last completed stage: version-bumped (stopped before packages-built)"),
    "{err}"
  );

  let lines = fx.log_lines();
  assert_eq!(count(&lines, "setup.py"), 2);
  for later in ["twine upload", "-m venv", "poet", "brew uninstall", "brew install"] {
    assert_eq!(count(&lines, later), 0, "{later} ran: {lines:#?}");
  }
  assert!(!fx.formula("dbt@0.15.2.rb").exists());
  Ok(())
}

#[test]
fn test_end_of_input_at_confirmation_aborts() -> Result<()> {
  let fx = ReleaseFixture::new()?;

  let output = fx.run(&["release", "0.15.2", "patch"])?;
  assert_eq!(output.status.code(), Some(1));

  let err = stderr(&output);
  assert!(err.contains("Ensure https://test.pypi.org/project/dbt/0.15.2/ exists and looks reasonable"));
  assert!(err.contains("aborted"), "{err}");

  let lines = fx.log_lines();
  assert_eq!(count(&lines, "twine upload"), 1);
  assert_eq!(count(&lines, "twine upload --repository pypitest"), 1);
  assert_eq!(count(&lines, "poet"), 0);
  Ok(())
}

#[test]
fn test_invalid_version_runs_nothing() -> Result<()> {
  let fx = ReleaseFixture::new()?;

  for bad in ["0.15", "0.16.0b", "v0.15.2", "0.15.2b1x"] {
    let output = fx.run(&["release", bad, "patch", "--yes"])?;
    assert_eq!(output.status.code(), Some(1), "{bad} accepted");
    assert!(stderr(&output).contains("Invalid version"));
  }
  assert!(fx.log_lines().is_empty());
  Ok(())
}

#[test]
fn test_wrong_python_refuses_to_start() -> Result<()> {
  let fx = ReleaseFixture::new()?;

  let output = fx.run_with_env(&["release", "0.15.2", "patch", "--yes"], &[("FAKE_PYTHON_VERSION", "3.8.2")])?;
  assert_eq!(output.status.code(), Some(3));
  assert!(stderr(&output).contains("python-version"));
  assert_eq!(count(&fx.log_lines(), "bumpversion --commit"), 0);
  Ok(())
}

#[test]
fn test_dry_run_executes_nothing() -> Result<()> {
  let fx = ReleaseFixture::new()?;

  let output = fx.run_ok(&["release", "0.16.0b1", "num", "--dry-run"])?;
  let out = stdout(&output);
  assert!(out.contains("dry run"));
  assert!(out.contains("--new-version 0.16.0b1 num"));
  assert!(out.contains("dbt@0.16.0-b1.rb"));
  assert!(!out.contains("default-pointer-updated"));
  assert!(fx.log_lines().is_empty());

  let output = fx.run_ok(&["release", "0.16.0b1", "num", "--dry-run", "--json", "--homebrew-set-default"])?;
  let steps: serde_json::Value = serde_json::from_slice(&output.stdout)?;
  assert_eq!(steps.as_array().unwrap().len(), 10);
  assert_eq!(steps[9]["stage"], "DefaultPointerUpdated");
  Ok(())
}

#[test]
fn test_set_default_rewrites_pointer() -> Result<()> {
  let fx = ReleaseFixture::new()?;
  fx.run_ok(&["release", "0.15.2", "patch", "--yes", "--homebrew-set-default"])?;

  let default = fs::read_to_string(fx.formula("dbt.rb"))?;
  assert!(default.starts_with("\nclass Dbt < Formula\n"));
  assert!(default.contains("version \"0.15.2\""));

  let log = fx.brew_log()?;
  assert_eq!(log[0], "upgrade dbt to 0.15.2");
  assert_eq!(log[1], "add dbt@0.15.2");
  Ok(())
}

#[test]
fn test_failed_audit_leaves_formula_uncommitted() -> Result<()> {
  let fx = ReleaseFixture::new()?;

  let output = fx.run_with_env(&["release", "0.15.2", "patch", "--yes"], &[("FAKE_BREW_FAIL", "audit")])?;
  assert_eq!(output.status.code(), Some(3));
  assert!(stderr(&output).contains("Formula verification failed at `brew audit`"));

  assert!(fx.formula("dbt@0.15.2.rb").exists());
  assert_eq!(fx.brew_log()?[0], "Initial formulas");
  Ok(())
}
