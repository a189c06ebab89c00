//! Writing formula files without clobbering

use crate::core::error::{ReleaseError, ReleaseResult, ResultExt};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// A rendered formula and where it goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormulaFile {
  pub path: PathBuf,
  pub text: String,
}

impl FormulaFile {
  pub fn new(path: PathBuf, text: String) -> Self {
    Self { path, text }
  }

  /// Create the file; an existing file is an error and is left untouched
  pub fn write(&self) -> ReleaseResult<()> {
    write_new(&self.path, &self.text)
  }
}

/// Exclusive create-and-write
pub fn write_new(path: &Path, text: &str) -> ReleaseResult<()> {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
  }

  let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
    Ok(file) => file,
    Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
      return Err(ReleaseError::AlreadyExists {
        path: path.to_path_buf(),
      });
    }
    Err(e) => return Err(ReleaseError::from(e).context(format!("Failed to create {}", path.display()))),
  };

  file
    .write_all(text.as_bytes())
    .with_context(|| format!("Failed to write {}", path.display()))?;
  tracing::debug!(path = %path.display(), bytes = text.len(), "wrote formula");
  Ok(())
}
