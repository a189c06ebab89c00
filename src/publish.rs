//! Uploading release artifacts to the package index

use crate::build::ReleaseDirectory;
use crate::core::context::ReleaseContext;
use crate::core::error::{ProcessFailure, ReleaseError, ReleaseResult};
use crate::core::exec::Invocation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where artifacts are uploaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishTarget {
  /// The staging index, selected with twine's `--repository`
  Staging,
  /// twine's default repository
  Production,
}

impl fmt::Display for PublishTarget {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PublishTarget::Staging => write!(f, "staging"),
      PublishTarget::Production => write!(f, "production"),
    }
  }
}

/// Build the upload invocation for every artifact in `release`
pub fn upload_invocation(ctx: &ReleaseContext, release: &ReleaseDirectory, target: PublishTarget) -> Invocation {
  let mut inv = Invocation::new(&ctx.config.tools.twine).arg("upload");
  if target == PublishTarget::Staging {
    inv = inv.args(["--repository", ctx.config.index.staging_repository.as_str()]);
  }
  inv
    .args(release.artifact_paths())
    .current_dir(ctx.source_root())
    .merged_output()
}

/// Upload every artifact to `target`
///
/// No retry. An empty release directory fails without running anything.
pub fn publish(ctx: &ReleaseContext, release: &ReleaseDirectory, target: PublishTarget) -> ReleaseResult<()> {
  let index = index_name(ctx, target);

  if release.is_empty() {
    return Err(ReleaseError::PublishFailed {
      index,
      failure: ProcessFailure {
        command: format!("{} upload", ctx.config.tools.twine),
        status: None,
        output: format!("no artifacts in {}", release.path.display()),
      },
    });
  }

  let inv = upload_invocation(ctx, release, target);
  ctx
    .runner
    .run_checked(&inv)
    .map_err(|failure| ReleaseError::PublishFailed { index, failure })?;

  tracing::info!(%target, artifacts = release.artifacts.len(), "published release");
  Ok(())
}

fn index_name(ctx: &ReleaseContext, target: PublishTarget) -> String {
  match target {
    PublishTarget::Staging => format!("staging index ({})", ctx.config.index.staging_repository),
    PublishTarget::Production => "production index".to_string(),
  }
}
