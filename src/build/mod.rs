//! Package building
//!
//! Builds the sdist and wheel for every subpackage and then the main package,
//! and gathers everything into the main package's `dist/` directory, which is
//! the release directory handed to the publisher.
//!
//! # Side effects
//!
//! Each package's `dist/` is deleted before it is rebuilt. A failed build stops
//! the stage immediately; output of targets that already finished stays on disk.
//! Re-running the whole release is the recovery path, builds are repeatable for
//! the same version.

pub mod artifacts;

pub use artifacts::{Artifact, collect_artifacts};

use crate::core::context::ReleaseContext;
use crate::core::error::{ReleaseError, ReleaseResult, ResultExt};
use crate::core::exec::Invocation;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Something that gets built: a subpackage directory or the main package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseTarget {
  /// Subpackage directory relative to the source root
  Subpackage(PathBuf),
  /// The package at the source root
  Main,
}

impl ReleaseTarget {
  /// Directory the build tool runs in
  pub fn dir(&self, root: &Path) -> PathBuf {
    match self {
      ReleaseTarget::Subpackage(rel) => root.join(rel),
      ReleaseTarget::Main => root.to_path_buf(),
    }
  }
}

impl fmt::Display for ReleaseTarget {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ReleaseTarget::Subpackage(rel) => write!(f, "{}", rel.display()),
      ReleaseTarget::Main => write!(f, "main package"),
    }
  }
}

/// All targets in build order: configured subpackages, then the main package
pub fn release_targets(ctx: &ReleaseContext) -> Vec<ReleaseTarget> {
  ctx
    .config
    .product
    .subpackages
    .iter()
    .cloned()
    .map(ReleaseTarget::Subpackage)
    .chain(std::iter::once(ReleaseTarget::Main))
    .collect()
}

/// Artifacts produced by one target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildArtifactSet {
  pub target: ReleaseTarget,
  pub files: Vec<PathBuf>,
}

/// The aggregate directory holding every artifact of the release
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseDirectory {
  pub path: PathBuf,
  pub artifacts: Vec<Artifact>,
}

impl ReleaseDirectory {
  /// Describe an existing directory by scanning it for artifacts
  pub fn scan(path: &Path, patterns: &[String]) -> ReleaseResult<Self> {
    let artifacts = collect_artifacts(path, patterns)?
      .iter()
      .map(|p| Artifact::from_path(p))
      .collect::<ReleaseResult<Vec<_>>>()?;
    Ok(Self {
      path: path.to_path_buf(),
      artifacts,
    })
  }

  pub fn artifact_paths(&self) -> Vec<&Path> {
    self.artifacts.iter().map(|a| a.path.as_path()).collect()
  }

  pub fn is_empty(&self) -> bool {
    self.artifacts.is_empty()
  }
}

/// Remove a package's output directory, recreating it empty when `make` is set
pub fn clean_dist(dist: &Path, make: bool) -> ReleaseResult<()> {
  if dist.exists() {
    fs::remove_dir_all(dist).with_context(|| format!("Failed to remove {}", dist.display()))?;
  }
  if make {
    fs::create_dir_all(dist).with_context(|| format!("Failed to create {}", dist.display()))?;
  }
  Ok(())
}

/// Build every target and aggregate the artifacts
pub fn build_packages(ctx: &ReleaseContext) -> ReleaseResult<ReleaseDirectory> {
  build_packages_with(ctx, |_, _, _| {})
}

/// Build every target, calling `on_target(target, index, total)` before each build
pub fn build_packages_with<F>(ctx: &ReleaseContext, mut on_target: F) -> ReleaseResult<ReleaseDirectory>
where
  F: FnMut(&ReleaseTarget, usize, usize),
{
  let root = ctx.source_root();
  let patterns = &ctx.config.product.artifact_patterns;
  let targets = release_targets(ctx);
  let total = targets.len();

  let release_dist = ReleaseContext::dist_dir(root);
  clean_dist(&release_dist, false)?;

  let mut sub_sets = Vec::new();
  for (idx, target) in targets.iter().enumerate() {
    on_target(target, idx, total);
    if *target == ReleaseTarget::Main {
      build_one(ctx, target)?;
      continue;
    }

    let dir = target.dir(root);
    clean_dist(&ReleaseContext::dist_dir(&dir), false)?;
    build_one(ctx, target)?;

    let files = collect_artifacts(&ReleaseContext::dist_dir(&dir), patterns)?;
    tracing::debug!(target = %target, artifacts = files.len(), "collected subpackage artifacts");
    sub_sets.push(BuildArtifactSet {
      target: target.clone(),
      files,
    });
  }

  fs::create_dir_all(&release_dist).with_context(|| format!("Failed to create {}", release_dist.display()))?;
  for set in &sub_sets {
    for file in &set.files {
      let Some(name) = file.file_name() else {
        continue;
      };
      let dest = release_dist.join(name);
      fs::copy(file, &dest).with_context(|| format!("Failed to copy {} to {}", file.display(), dest.display()))?;
    }
  }

  let release = ReleaseDirectory::scan(&release_dist, patterns)?;
  tracing::info!(
    path = %release.path.display(),
    artifacts = release.artifacts.len(),
    "built packages"
  );
  Ok(release)
}

fn build_one(ctx: &ReleaseContext, target: &ReleaseTarget) -> ReleaseResult<()> {
  let inv = Invocation::new(&ctx.config.tools.python)
    .args(["setup.py", "sdist", "bdist_wheel"])
    .current_dir(target.dir(ctx.source_root()))
    .merged_output();

  ctx
    .runner
    .run_checked(&inv)
    .map_err(|failure| ReleaseError::BuildFailed {
      target: target.to_string(),
      failure,
    })?;
  Ok(())
}
