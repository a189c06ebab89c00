//! Error types for dbt-release with contextual messages and exit codes
//!
//! Every stage of the release pipeline has its own error kind. Failures of
//! external tools always carry the full command line, exit status and captured
//! output so the operator sees exactly what the tool said.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for dbt-release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (bad version, config, declined confirmation, existing formula)
  User = 1,
  /// System error (external tool, git, I/O)
  System = 2,
  /// Validation failure (environment precondition, formula verification)
  Validation = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// A finished external command that exited unsuccessfully
#[derive(Debug, Clone)]
pub struct ProcessFailure {
  /// Rendered command line
  pub command: String,
  /// Exit code, `None` if the process never started or was killed by a signal
  pub status: Option<i32>,
  /// Captured output: interleaved when the invocation merged its streams,
  /// otherwise stdout followed by stderr
  pub output: String,
}

impl fmt::Display for ProcessFailure {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.status {
      Some(code) => write!(f, "`{}` exited with status {}", self.command, code)?,
      None => write!(f, "`{}` did not exit normally", self.command)?,
    }
    let output = self.output.trim_end();
    if !output.is_empty() {
      write!(f, "\n{}", output)?;
    }
    Ok(())
  }
}

/// Main error type for dbt-release
#[derive(Debug)]
pub enum ReleaseError {
  /// Version string did not match `major.minor.patch[tagnum]`
  InvalidVersion { raw: String },

  /// The version-bump tool failed
  BumpFailed(ProcessFailure),

  /// A package build failed
  BuildFailed { target: String, failure: ProcessFailure },

  /// Upload to the package index failed
  PublishFailed { index: String, failure: ProcessFailure },

  /// Formula data could not be extracted
  ExtractionFailed(ExtractionError),

  /// A formula already exists at the target path
  AlreadyExists { path: PathBuf },

  /// The generated formula did not install, test or audit cleanly
  VerificationFailed { step: &'static str, failure: ProcessFailure },

  /// Environment precondition not met
  Environment { message: String, help: Option<String> },

  /// Operator declined to continue
  Aborted { stage: String },

  /// Configuration errors
  Config(ConfigError),

  /// Git operation errors
  Git(GitError),

  /// I/O errors, with what was being done when they happened
  Io { context: Option<String>, source: io::Error },

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl ReleaseError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    ReleaseError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    ReleaseError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      ReleaseError::Message { message, context, help } => ReleaseError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      ReleaseError::Io { context, source } => ReleaseError::Io {
        context: Some(context.map(|c| format!("{}: {}", ctx_str, c)).unwrap_or(ctx_str)),
        source,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      ReleaseError::InvalidVersion { .. } => ExitCode::User,
      ReleaseError::AlreadyExists { .. } => ExitCode::User,
      ReleaseError::Aborted { .. } => ExitCode::User,
      ReleaseError::Config(_) => ExitCode::User,
      ReleaseError::Message { .. } => ExitCode::User,
      ReleaseError::Environment { .. } => ExitCode::Validation,
      ReleaseError::VerificationFailed { .. } => ExitCode::Validation,
      ReleaseError::BumpFailed(_)
      | ReleaseError::BuildFailed { .. }
      | ReleaseError::PublishFailed { .. }
      | ReleaseError::ExtractionFailed(_)
      | ReleaseError::Git(_)
      | ReleaseError::Io { .. } => ExitCode::System,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      ReleaseError::InvalidVersion { .. } => {
        Some("Versions look like 0.15.2 or 0.16.0b1 (major.minor.patch, optional tag and number).".to_string())
      }
      ReleaseError::BuildFailed { .. } => {
        Some("Fix the build and re-run the whole release; builds are repeatable for the same version.".to_string())
      }
      ReleaseError::PublishFailed { failure, .. } => {
        if failure.output.contains("File already exists")
          || failure.output.contains("400 Bad Request")
          || failure.output.contains("HTTPError: 400")
        {
          Some("This version may already be on the index. Bump to a new version instead of re-uploading.".to_string())
        } else if failure.output.contains("403 Forbidden") || failure.output.contains("HTTPError: 403") || failure.output.contains("Invalid or non-existent") {
          Some("Check the credentials twine uses for this repository (~/.pypirc).".to_string())
        } else {
          None
        }
      }
      ReleaseError::ExtractionFailed(e) => e.help_message(),
      ReleaseError::AlreadyExists { path } => Some(format!(
        "A formula for this version was already generated. Inspect or remove {} before re-running.",
        path.display()
      )),
      ReleaseError::VerificationFailed { .. } => {
        Some("The formula was written but not committed. Fix it by hand or remove it and re-run.".to_string())
      }
      ReleaseError::Environment { help, .. } => help.clone(),
      ReleaseError::Aborted { .. } => {
        Some("Nothing after the confirmation point ran. Re-run once the staging release looks right.".to_string())
      }
      ReleaseError::Config(e) => e.help_message(),
      ReleaseError::Git(e) => e.help_message(),
      ReleaseError::Message { help, .. } => help.clone(),
      _ => None,
    }
  }
}

impl fmt::Display for ReleaseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ReleaseError::InvalidVersion { raw } => write!(f, "Invalid version: '{}'", raw),
      ReleaseError::BumpFailed(failure) => write!(f, "Version bump failed: {}", failure),
      ReleaseError::BuildFailed { target, failure } => write!(f, "Build failed for {}: {}", target, failure),
      ReleaseError::PublishFailed { index, failure } => write!(f, "Upload to {} failed: {}", index, failure),
      ReleaseError::ExtractionFailed(e) => write!(f, "Formula extraction failed: {}", e),
      ReleaseError::AlreadyExists { path } => write!(f, "Formula already exists: {}", path.display()),
      ReleaseError::VerificationFailed { step, failure } => {
        write!(f, "Formula verification failed at `{}`: {}", step, failure)
      }
      ReleaseError::Environment { message, .. } => write!(f, "Environment check failed: {}", message),
      ReleaseError::Aborted { stage } => write!(f, "Release aborted by operator at: {}", stage),
      ReleaseError::Config(e) => write!(f, "{}", e),
      ReleaseError::Git(e) => write!(f, "{}", e),
      ReleaseError::Io {
        context: Some(ctx),
        source,
      } => write!(f, "{}: {}", ctx, source),
      ReleaseError::Io { context: None, source } => write!(f, "I/O error: {}", source),
      ReleaseError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for ReleaseError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      ReleaseError::Io { source, .. } => Some(source),
      _ => None,
    }
  }
}

impl From<io::Error> for ReleaseError {
  fn from(err: io::Error) -> Self {
    ReleaseError::Io {
      context: None,
      source: err,
    }
  }
}

impl From<String> for ReleaseError {
  fn from(msg: String) -> Self {
    ReleaseError::message(msg)
  }
}

impl From<&str> for ReleaseError {
  fn from(msg: &str) -> Self {
    ReleaseError::message(msg)
  }
}

impl From<ExtractionError> for ReleaseError {
  fn from(err: ExtractionError) -> Self {
    ReleaseError::ExtractionFailed(err)
  }
}

impl From<toml_edit::de::Error> for ReleaseError {
  fn from(err: toml_edit::de::Error) -> Self {
    ReleaseError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<serde_json::Error> for ReleaseError {
  fn from(err: serde_json::Error) -> Self {
    ReleaseError::message(format!("JSON error: {}", err))
  }
}

impl From<glob::PatternError> for ReleaseError {
  fn from(err: glob::PatternError) -> Self {
    ReleaseError::message(format!("Invalid artifact pattern: {}", err))
  }
}

impl From<glob::GlobError> for ReleaseError {
  fn from(err: glob::GlobError) -> Self {
    ReleaseError::message(format!("Failed to read artifact path: {}", err))
  }
}

/// Why formula extraction failed
#[derive(Debug)]
pub enum ExtractionError {
  /// Creating or populating the isolated environment failed
  Sandbox(ProcessFailure),

  /// The helper tool exited unsuccessfully
  Tool(ProcessFailure),

  /// No `resource "<name>" do` line in the helper output
  MissingResource { resource: String },

  /// The resource block never reached its `end`
  UnterminatedResource { resource: String },

  /// The resource block had fewer than the url and hash lines
  IncompleteResource { resource: String, found: usize },
}

impl ExtractionError {
  fn help_message(&self) -> Option<String> {
    match self {
      ExtractionError::Sandbox(failure) if failure.output.contains("No matching distribution") => Some(
        "The released version is not installable from the index yet. Wait for it to propagate and run `dbt-release formula`."
          .to_string(),
      ),
      ExtractionError::MissingResource { .. }
      | ExtractionError::UnterminatedResource { .. }
      | ExtractionError::IncompleteResource { .. } => {
        Some("Run `poet -s <package>` by hand inside the environment to inspect its output.".to_string())
      }
      _ => None,
    }
  }
}

impl fmt::Display for ExtractionError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ExtractionError::Sandbox(failure) => write!(f, "could not prepare the isolated environment: {}", failure),
      ExtractionError::Tool(failure) => write!(f, "helper tool failed: {}", failure),
      ExtractionError::MissingResource { resource } => {
        write!(f, "no `resource \"{}\" do` block in helper output", resource)
      }
      ExtractionError::UnterminatedResource { resource } => {
        write!(f, "`resource \"{}\"` block has no closing `end`", resource)
      }
      ExtractionError::IncompleteResource { resource, found } => write!(
        f,
        "`resource \"{}\"` block has {} line(s), expected url and sha256",
        resource, found
      ),
    }
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// Config file exists but is not valid
  Invalid { path: PathBuf, reason: String },

  /// A required value is empty
  MissingField { field: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::Invalid { .. } => Some("Fix the value or delete the key to fall back to the default.".to_string()),
      ConfigError::MissingField { field } => Some(format!("Set `{}` in release.toml or remove it.", field)),
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::Invalid { path, reason } => write!(f, "Invalid configuration in {}: {}", path.display(), reason),
      ConfigError::MissingField { field } => write!(f, "Missing required field in config: {}", field),
    }
  }
}

/// Git operation errors
#[derive(Debug)]
pub enum GitError {
  /// Git command failed
  CommandFailed { command: String, stderr: String },

  /// Repository not found
  RepoNotFound { path: PathBuf },
}

impl GitError {
  fn help_message(&self) -> Option<String> {
    match self {
      GitError::RepoNotFound { path } => Some(format!(
        "Clone the formula repository first or pass --homebrew-path: {}",
        path.display()
      )),
      GitError::CommandFailed { stderr, .. } if stderr.contains("nothing to commit") => {
        Some("The formula file is identical to what is already committed.".to_string())
      }
      _ => None,
    }
  }
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr)
      }
      GitError::RepoNotFound { path } => {
        write!(f, "Git repository not found at: {}", path.display())
      }
    }
  }
}

/// Result type alias for dbt-release
pub type ReleaseResult<T> = Result<T, ReleaseError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> ReleaseResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> ReleaseResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<ReleaseError>,
{
  fn context(self, ctx: impl Into<String>) -> ReleaseResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> ReleaseResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &ReleaseError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
