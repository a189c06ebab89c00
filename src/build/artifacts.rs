//! Artifact discovery and digests

use crate::core::error::{ReleaseResult, ResultExt};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

/// One distributable file in the aggregate release directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
  pub path: PathBuf,
  /// Lowercase hex SHA-256 of the file contents
  pub sha256: String,
  pub size: u64,
}

impl Artifact {
  pub fn from_path(path: &Path) -> ReleaseResult<Self> {
    let (sha256, size) = sha256_file(path)?;
    Ok(Self {
      path: path.to_path_buf(),
      sha256,
      size,
    })
  }

  pub fn file_name(&self) -> String {
    self
      .path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default()
  }
}

/// Every file directly in `dir` matching one of `patterns`, sorted, without duplicates
///
/// A missing directory yields no artifacts.
pub fn collect_artifacts(dir: &Path, patterns: &[String]) -> ReleaseResult<Vec<PathBuf>> {
  if !dir.is_dir() {
    return Ok(Vec::new());
  }

  let escaped = glob::Pattern::escape(&dir.to_string_lossy());
  let mut found = Vec::new();
  for pattern in patterns {
    let full = format!("{}/{}", escaped, pattern);
    for entry in glob::glob(&full)? {
      let path = entry?;
      if path.is_file() {
        found.push(path);
      }
    }
  }

  found.sort();
  found.dedup();
  Ok(found)
}

/// Stream a file through SHA-256
pub fn sha256_file(path: &Path) -> ReleaseResult<(String, u64)> {
  let mut file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
  let mut hasher = Sha256::new();
  let size = io::copy(&mut file, &mut hasher).with_context(|| format!("Failed to read {}", path.display()))?;
  Ok((format!("{:x}", hasher.finalize()), size))
}
