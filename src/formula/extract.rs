//! Formula data extraction
//!
//! The released package is installed from the index into a throwaway virtual
//! environment together with the `poet` helper, which knows how to describe a
//! PyPI package as Homebrew `resource` blocks. Two helper runs supply the data
//! a formula needs:
//!
//! - `poet -s <name>`: the package's own resource block, from which the `url`
//!   and `sha256` lines are lifted
//! - `poet -r <name>`: resource blocks for every dependency, used verbatim
//!
//! ```text
//! resource "dbt" do        <- Searching until this exact line
//!   url "https://..."      <- Collecting
//!   sha256 "7d29..."       <- Collecting
//! end                      <- Done
//! ```

use crate::core::context::ReleaseContext;
use crate::core::error::{ExtractionError, ReleaseResult, ResultExt};
use crate::core::exec::Invocation;
use crate::version::Version;
use std::fs;
use std::path::{Path, PathBuf};

/// Everything the template needs besides the version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormulaData {
  /// Trimmed `url "..."` line
  pub url_line: String,
  /// Trimmed `sha256 "..."` line
  pub hash_line: String,
  /// `poet -r` output, untouched
  pub dependency_block: String,
  pub version: Version,
}

/// An isolated virtual environment that is deleted when dropped
///
/// Any stale environment at the same path is removed before creation, and the
/// directory is removed again on every exit path, including failed setup.
pub struct Sandbox {
  path: PathBuf,
}

impl Sandbox {
  /// Create the environment and install the helper plus `<name>==<version>`
  pub fn create(ctx: &ReleaseContext, version: &Version) -> ReleaseResult<Self> {
    let path = ctx.sandbox_path();
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    if path.exists() {
      tracing::debug!(path = %path.display(), "removing stale sandbox");
      fs::remove_dir_all(&path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }

    // owned from here on so a failed install still cleans up
    let sandbox = Self { path };

    let create = Invocation::new(&ctx.config.tools.python)
      .args(["-m", "venv"])
      .arg(&sandbox.path)
      .current_dir(ctx.source_root());
    ctx.runner.run_checked(&create).map_err(ExtractionError::Sandbox)?;

    // an empty cwd keeps pip from resolving the package against the local checkout
    let scratch = tempfile::tempdir().context("Failed to create a scratch directory for pip")?;
    let requirement = format!("{}=={}", ctx.config.product.name, version);
    let install = Invocation::new(sandbox.python())
      .args(["-m", "pip", "install", "--upgrade"])
      .arg(&ctx.config.homebrew.helper_package)
      .arg(&requirement)
      .current_dir(scratch.path());
    let output = ctx.runner.run_checked(&install).map_err(ExtractionError::Sandbox)?;
    tracing::debug!(%requirement, output = %output.combined(), "sandbox populated");

    Ok(sandbox)
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn python(&self) -> PathBuf {
    self.bin("python")
  }

  pub fn bin(&self, program: &str) -> PathBuf {
    self.path.join("bin").join(program)
  }
}

impl Drop for Sandbox {
  fn drop(&mut self) {
    if !self.path.exists() {
      return;
    }
    if let Err(e) = fs::remove_dir_all(&self.path) {
      tracing::warn!(path = %self.path.display(), error = %e, "failed to remove sandbox");
    }
  }
}

#[derive(Debug)]
enum ScanState {
  Searching,
  Collecting(Vec<String>),
  Done(Vec<String>),
}

/// Line scanner for one `resource "<name>" do ... end` block
#[derive(Debug)]
pub struct ResourceScanner {
  resource: String,
  header: String,
  state: ScanState,
}

impl ResourceScanner {
  pub fn new(resource: &str) -> Self {
    Self {
      resource: resource.to_string(),
      header: format!("resource \"{}\" do", resource),
      state: ScanState::Searching,
    }
  }

  /// Advance over one line; lines after `end` are ignored
  pub fn feed(&mut self, raw: &str) {
    let line = raw.trim();
    self.state = match std::mem::replace(&mut self.state, ScanState::Searching) {
      ScanState::Searching if line == self.header => ScanState::Collecting(Vec::new()),
      ScanState::Searching => ScanState::Searching,
      ScanState::Collecting(lines) if line == "end" => ScanState::Done(lines),
      ScanState::Collecting(mut lines) => {
        lines.push(line.to_string());
        ScanState::Collecting(lines)
      }
      done @ ScanState::Done(_) => done,
    };
  }

  /// The url and hash lines, in that order
  pub fn finish(self) -> Result<(String, String), ExtractionError> {
    let resource = self.resource;
    match self.state {
      ScanState::Searching => Err(ExtractionError::MissingResource { resource }),
      ScanState::Collecting(_) => Err(ExtractionError::UnterminatedResource { resource }),
      ScanState::Done(lines) => {
        let found = lines.len();
        let mut iter = lines.into_iter();
        match (iter.next(), iter.next(), iter.next()) {
          (Some(url), Some(hash), None) => Ok((url, hash)),
          _ => Err(ExtractionError::IncompleteResource { resource, found }),
        }
      }
    }
  }
}

/// Pull the url and hash lines for `resource` out of `poet -s` output
pub fn scan_resource(output: &str, resource: &str) -> Result<(String, String), ExtractionError> {
  let mut scanner = ResourceScanner::new(resource);
  for line in output.lines() {
    scanner.feed(line);
  }
  scanner.finish()
}

/// Install the released version in a sandbox and gather formula data from it
pub fn extract(ctx: &ReleaseContext, version: &Version) -> ReleaseResult<FormulaData> {
  let name = ctx.config.product.name.as_str();
  let sandbox = Sandbox::create(ctx, version)?;
  let poet = sandbox.bin("poet");
  tracing::debug!(sandbox = %sandbox.path().display(), "sandbox ready");

  let single = Invocation::new(&poet).args(["-s", name]).current_dir(ctx.source_root());
  let single = ctx.runner.run_checked(&single).map_err(ExtractionError::Tool)?;
  let (url_line, hash_line) = scan_resource(&single.stdout, name)?;

  let deps = Invocation::new(&poet).args(["-r", name]).current_dir(ctx.source_root());
  let deps = ctx.runner.run_checked(&deps).map_err(ExtractionError::Tool)?;

  tracing::info!(%version, url = %url_line, "extracted formula data");
  Ok(FormulaData {
    url_line,
    hash_line,
    dependency_block: deps.stdout,
    version: version.clone(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::config::ReleaseConfig;
  use crate::core::error::ReleaseError;
  use crate::core::exec::testing::{ScriptedRunner, fail, ok};
  use crate::core::exec::{CommandOutput, ProcessRunner};
  use tempfile::TempDir;

  const POET_SINGLE: &str = r#"
resource "dbt" do
  url "https://files.pythonhosted.org/packages/0b/eb/dbt-0.15.2.tar.gz"
  sha256 "7d29fb072a8ea7f04acae1519eade967f08b0f44ee7944169b446431dbff8d40"
end
"#;

  const POET_DEPS: &str = r#"  resource "agate" do
    url "https://files.pythonhosted.org/packages/agate-1.6.1.tar.gz"
    sha256 "c93aaa500b439d71e4a5cf088d0006d2ce2c76f1950960c8843114e5f361dfd3"
  end
"#;

  fn is_poet(flag: &'static str) -> impl Fn(&Invocation) -> bool {
    move |inv: &Invocation| {
      inv.program().to_string_lossy().ends_with("bin/poet") && inv.arguments().first().is_some_and(|a| a == flag)
    }
  }

  #[test]
  fn test_scan_extracts_url_then_hash() {
    let (url, hash) = scan_resource(POET_SINGLE, "dbt").unwrap();
    assert_eq!(url, r#"url "https://files.pythonhosted.org/packages/0b/eb/dbt-0.15.2.tar.gz""#);
    assert!(hash.starts_with("sha256 \"7d29"));
  }

  #[test]
  fn test_scan_ignores_other_resources() {
    let output = format!("{}{}", POET_DEPS, POET_SINGLE);
    let (url, _) = scan_resource(&output, "dbt").unwrap();
    assert!(url.contains("dbt-0.15.2"));
  }

  #[test]
  fn test_scan_missing_block() {
    let err = scan_resource(POET_DEPS, "dbt").unwrap_err();
    assert!(matches!(err, ExtractionError::MissingResource { .. }));
  }

  #[test]
  fn test_scan_unterminated_block() {
    let err = scan_resource("resource \"dbt\" do\n  url \"x\"\n  sha256 \"y\"\n", "dbt").unwrap_err();
    assert!(matches!(err, ExtractionError::UnterminatedResource { .. }));
  }

  #[test]
  fn test_scan_zero_or_one_inner_lines() {
    let err = scan_resource("resource \"dbt\" do\nend\n", "dbt").unwrap_err();
    assert!(matches!(err, ExtractionError::IncompleteResource { found: 0, .. }));

    let err = scan_resource("resource \"dbt\" do\n  url \"x\"\nend\n", "dbt").unwrap_err();
    assert!(matches!(err, ExtractionError::IncompleteResource { found: 1, .. }));
  }

  #[test]
  fn test_scan_requires_exact_header() {
    // a header with trailing content is not the block we want
    let err = scan_resource("resource \"dbt\" do # pinned\n  url \"x\"\n  sha256 \"y\"\nend\n", "dbt").unwrap_err();
    assert!(matches!(err, ExtractionError::MissingResource { .. }));
  }

  #[test]
  fn test_extract_runs_sandbox_then_helper() {
    let root = TempDir::new().unwrap();
    let runner = ScriptedRunner::new()
      .on_match(is_poet("-s"), ok(POET_SINGLE))
      .on_match(is_poet("-r"), ok(POET_DEPS));
    let ctx = ReleaseContext::new(root.path().to_path_buf(), "/brew".into(), ReleaseConfig::default(), &runner);
    let version = Version::parse("0.15.2").unwrap();

    let data = extract(&ctx, &version).unwrap();
    assert_eq!(data.dependency_block, POET_DEPS);
    assert!(data.hash_line.starts_with("sha256"));

    let calls = runner.calls();
    assert_eq!(calls.len(), 4);
    assert_eq!(
      calls[0].command_line(),
      format!("python -m venv {}", root.path().join("build/tmp-venv").display())
    );
    assert!(calls[1].command_line().ends_with("-m pip install --upgrade homebrew-pypi-poet dbt==0.15.2"));
    // pip runs outside the source tree
    assert!(!calls[1].cwd().unwrap().starts_with(root.path()));
    assert!(calls[2].command_line().ends_with("bin/poet -s dbt"));
    assert!(calls[3].command_line().ends_with("bin/poet -r dbt"));
  }

  /// Creates the environment directory the way `python -m venv` would
  struct VenvRunner(ScriptedRunner);

  impl ProcessRunner for VenvRunner {
    fn run(&self, invocation: &Invocation) -> std::io::Result<CommandOutput> {
      let args = invocation.arguments();
      if args.len() == 3 && args[0] == "-m" && args[1] == "venv" {
        fs::create_dir_all(Path::new(&args[2]).join("bin"))?;
      }
      self.0.run(invocation)
    }
  }

  #[test]
  fn test_sandbox_removed_after_failure() {
    let root = TempDir::new().unwrap();
    let venv = root.path().join("build/tmp-venv");
    fs::create_dir_all(venv.join("bin")).unwrap();
    fs::write(venv.join("bin/stale"), b"").unwrap();

    let runner = VenvRunner(
      ScriptedRunner::new().on("pip install", fail("ERROR: No matching distribution found for dbt==9.9.9")),
    );
    let ctx = ReleaseContext::new(root.path().to_path_buf(), "/brew".into(), ReleaseConfig::default(), &runner);

    let err = extract(&ctx, &Version::parse("9.9.9").unwrap()).unwrap_err();
    assert!(matches!(err, ReleaseError::ExtractionFailed(ExtractionError::Sandbox(_))));
    assert!(err.help_message().unwrap().contains("not installable"));
    assert!(!venv.exists());
    assert!(root.path().join("build").exists());
  }

  #[test]
  fn test_sandbox_replaces_stale_and_removes_on_drop() {
    let root = TempDir::new().unwrap();
    let venv = root.path().join("build/tmp-venv");
    fs::create_dir_all(venv.join("bin")).unwrap();
    fs::write(venv.join("bin/stale"), b"").unwrap();

    let runner = VenvRunner(ScriptedRunner::new());
    let ctx = ReleaseContext::new(root.path().to_path_buf(), "/brew".into(), ReleaseConfig::default(), &runner);

    let sandbox = Sandbox::create(&ctx, &Version::parse("0.15.2").unwrap()).unwrap();
    assert_eq!(sandbox.path(), venv.as_path());
    assert!(venv.join("bin").exists());
    assert!(!venv.join("bin/stale").exists());

    drop(sandbox);
    assert!(!venv.exists());
  }

  #[test]
  fn test_helper_failure_is_tool_error() {
    let root = TempDir::new().unwrap();
    let runner = ScriptedRunner::new().on_match(is_poet("-s"), fail("poet: command not found"));
    let ctx = ReleaseContext::new(root.path().to_path_buf(), "/brew".into(), ReleaseConfig::default(), &runner);

    let err = extract(&ctx, &Version::parse("0.15.2").unwrap()).unwrap_err();
    assert!(matches!(err, ReleaseError::ExtractionFailed(ExtractionError::Tool(_))));
    assert!(!ctx.sandbox_path().exists());
  }
}
