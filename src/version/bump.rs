//! Advancing the product version with bumpversion

use super::Version;
use crate::core::context::ReleaseContext;
use crate::core::error::{ReleaseError, ReleaseResult};
use crate::core::exec::Invocation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Version component bumpversion should treat as changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum VersionPart {
  Major,
  Minor,
  Patch,
  Prerelease,
  Num,
}

impl VersionPart {
  pub fn as_str(&self) -> &'static str {
    match self {
      VersionPart::Major => "major",
      VersionPart::Minor => "minor",
      VersionPart::Patch => "patch",
      VersionPart::Prerelease => "prerelease",
      VersionPart::Num => "num",
    }
  }
}

impl fmt::Display for VersionPart {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Rewrite version strings across the source tree and commit the change
///
/// Runs `bumpversion --commit --no-tag --new-version <version> <part>` in the
/// source root. Tagging is left to the operator.
pub fn bump_version(ctx: &ReleaseContext, version: &Version, part: VersionPart) -> ReleaseResult<()> {
  let inv = Invocation::new(&ctx.config.tools.bumpversion)
    .args(["--commit", "--no-tag", "--new-version"])
    .arg(version.as_str())
    .arg(part.as_str())
    .current_dir(ctx.source_root())
    .merged_output();

  ctx.runner.run_checked(&inv).map_err(ReleaseError::BumpFailed)?;
  tracing::info!(%version, %part, "version bumped");
  Ok(())
}
