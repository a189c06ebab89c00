//! Test helpers for integration tests
//!
//! Every external tool the release talks to is replaced by a small shell
//! script that appends its arguments to a shared log. `release.toml` in the
//! fake source tree points `[tools]` at those scripts; git is the real one.

use anyhow::{Context, Result};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

pub const SUBPACKAGES: [&str; 5] = [
  "core",
  "plugins/postgres",
  "plugins/redshift",
  "plugins/bigquery",
  "plugins/snowflake",
];

const POET_SINGLE: &str = r#"resource "dbt" do
  url "https://files.pythonhosted.org/packages/0b/eb/dbt-0.15.2.tar.gz"
  sha256 "7d29fb072a8ea7f04acae1519eade967f08b0f44ee7944169b446431dbff8d40"
end"#;

const POET_DEPS: &str = r#"  resource "agate" do
    url "https://files.pythonhosted.org/packages/agate-1.6.1.tar.gz"
    sha256 "c93aaa500b439d71e4a5cf088d0006d2ce2c76f1950960c8843114e5f361dfd3"
  end"#;

/// A dbt source tree, a formula repository and fake tools, all in one tempdir
pub struct ReleaseFixture {
  _root: TempDir,
  pub src: PathBuf,
  pub brew: PathBuf,
  pub tools: PathBuf,
  pub log: PathBuf,
}

impl ReleaseFixture {
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let base = root.path().canonicalize()?;
    let src = base.join("dbt");
    let brew = base.join("homebrew-dbt");
    let tools = base.join("tools");
    let log = base.join("commands.log");

    for sub in SUBPACKAGES {
      fs::create_dir_all(src.join(sub))?;
      fs::write(src.join(sub).join("setup.py"), "# fake\n")?;
    }
    fs::write(src.join("setup.py"), "# fake\n")?;

    fs::create_dir_all(brew.join("Formula"))?;
    git(&brew, &["init", "--initial-branch=main"])?;
    git(&brew, &["config", "user.name", "Test User"])?;
    git(&brew, &["config", "user.email", "test@example.com"])?;
    fs::write(
      brew.join("Formula/dbt.rb"),
      "class Dbt < Formula\n  version \"0.14.4\"\nend\n",
    )?;
    git(&brew, &["add", "."])?;
    git(&brew, &["commit", "-m", "Initial formulas"])?;

    fs::create_dir_all(&tools)?;
    let fixture = Self {
      _root: root,
      src,
      brew,
      tools,
      log,
    };
    fixture.write_tools()?;
    Ok(fixture)
  }

  fn write_tools(&self) -> Result<()> {
    let log = self.log.display();
    let tools = self.tools.display();

    self.script("bumpversion", &format!("echo \"bumpversion $*\" >> \"{log}\"\n"))?;
    self.script("twine", &format!("echo \"twine $*\" >> \"{log}\"\n"))?;
    self.script(
      "brew",
      &format!(
        r#"echo "brew $*" >> "{log}"
if [ -n "$FAKE_BREW_FAIL" ] && [ "$1" = "$FAKE_BREW_FAIL" ]; then
  echo "Error: dbt: failed" >&2
  exit 1
fi
"#
      ),
    )?;

    self.script(
      "python",
      &format!(
        r#"echo "python $*" >> "{log}"
case "$1" in
  -c)
    case "$2" in
      *version_info*) echo "${{FAKE_PYTHON_VERSION:-3.7.6}}" ;;
    esac
    ;;
  setup.py)
    if [ -f FAIL_BUILD ]; then
      echo "error: Setup script exited with error: command 'gcc' failed" >&2
      exit 1
    fi
    name=$(basename "$PWD")
    mkdir -p dist
    echo sdist > "dist/$name-0.15.2.tar.gz"
    echo wheel > "dist/$name-0.15.2-py3-none-any.whl"
    ;;
  -m)
    mkdir -p "$3/bin"
    cp "{tools}/venv-python" "$3/bin/python"
    cp "{tools}/poet" "$3/bin/poet"
    ;;
esac
"#
      ),
    )?;

    self.script("venv-python", &format!("echo \"venv-python $*\" >> \"{log}\"\n"))?;
    self.script(
      "poet",
      &format!(
        r#"echo "poet $*" >> "{log}"
if [ "$1" = "-s" ]; then
  cat <<'POET'
{POET_SINGLE}
POET
else
  cat <<'POET'
{POET_DEPS}
POET
fi
"#
      ),
    )?;

    fs::write(
      self.src.join("release.toml"),
      format!(
        r#"[tools]
bumpversion = "{tools}/bumpversion"
python = "{tools}/python"
twine = "{tools}/twine"
brew = "{tools}/brew"
"#
      ),
    )?;
    Ok(())
  }

  fn script(&self, name: &str, body: &str) -> Result<()> {
    let path = self.tools.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}", body))?;
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
    Ok(())
  }

  /// Make the build of one subpackage fail
  pub fn fail_build_in(&self, sub: &str) -> Result<()> {
    fs::write(self.src.join(sub).join("FAIL_BUILD"), "")?;
    Ok(())
  }

  /// Run dbt-release with `--path`/`--homebrew-path` appended, stdin closed
  pub fn run(&self, args: &[&str]) -> Result<Output> {
    self.run_with_env(args, &[])
  }

  pub fn run_with_env(&self, args: &[&str], envs: &[(&str, &str)]) -> Result<Output> {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_dbt-release"));
    cmd
      .current_dir(&self.src)
      .args(args)
      .arg("--path")
      .arg(&self.src)
      .stdin(Stdio::null())
      .env_remove("DBT_RELEASE_LOG");
    if args.first().is_some_and(|a| *a != "doctor") {
      cmd.arg("--homebrew-path").arg(&self.brew);
    }
    for (key, value) in envs {
      cmd.env(key, value);
    }
    cmd.output().context("Failed to run dbt-release")
  }

  /// Like [`run`](Self::run) but fails on a non-zero exit
  pub fn run_ok(&self, args: &[&str]) -> Result<Output> {
    let output = self.run(args)?;
    if !output.status.success() {
      anyhow::bail!(
        "dbt-release {} failed\nstdout: {}\nstderr: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
      );
    }
    Ok(output)
  }

  /// Every external command the fakes saw, in order
  pub fn log_lines(&self) -> Vec<String> {
    fs::read_to_string(&self.log)
      .map(|s| s.lines().map(String::from).collect())
      .unwrap_or_default()
  }

  pub fn formula(&self, name: &str) -> PathBuf {
    self.brew.join("Formula").join(name)
  }

  /// Subjects of the formula repository's commits, newest first
  pub fn brew_log(&self) -> Result<Vec<String>> {
    let output = git(&self.brew, &["log", "--format=%s"])?;
    Ok(
      String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(String::from)
        .collect(),
    )
  }
}

/// Index of the first log line containing `needle`
pub fn position(lines: &[String], needle: &str) -> Option<usize> {
  lines.iter().position(|l| l.contains(needle))
}

pub fn count(lines: &[String], needle: &str) -> usize {
  lines.iter().filter(|l| l.contains(needle)).count()
}

pub fn stdout(output: &Output) -> String {
  String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
  String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}
