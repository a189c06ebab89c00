//! What a run did, for the operator and for CI

use super::stage::Stage;
use crate::build::ReleaseDirectory;
use crate::core::error::ReleaseResult;
use crate::version::VersionPart;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize)]
pub struct StageRecord {
  pub stage: Stage,
  pub at: DateTime<Utc>,
}

/// Stages reached, artifacts produced and formula files written
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
  pub version: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub part: Option<VersionPart>,
  pub started_at: DateTime<Utc>,
  pub finished_at: Option<DateTime<Utc>>,
  pub stages: Vec<StageRecord>,
  pub release: Option<ReleaseDirectory>,
  pub formula_path: Option<PathBuf>,
  pub default_formula_path: Option<PathBuf>,
  /// Print a status line as each stage is reached
  #[serde(skip)]
  echo: bool,
}

impl RunReport {
  pub fn new(version: impl Into<String>, part: Option<VersionPart>) -> Self {
    Self {
      version: version.into(),
      part,
      started_at: Utc::now(),
      finished_at: None,
      stages: Vec::new(),
      release: None,
      formula_path: None,
      default_formula_path: None,
      echo: false,
    }
  }

  pub fn with_echo(mut self, echo: bool) -> Self {
    self.echo = echo;
    self
  }

  pub fn echoes(&self) -> bool {
    self.echo
  }

  pub fn record(&mut self, stage: Stage) {
    tracing::info!(%stage, version = %self.version, "stage reached");
    if self.echo {
      println!("✅ {}", stage.message());
    }
    self.stages.push(StageRecord { stage, at: Utc::now() });
  }

  pub fn stage_list(&self) -> Vec<Stage> {
    self.stages.iter().map(|r| r.stage).collect()
  }

  pub fn finish(&mut self) {
    self.finished_at = Some(Utc::now());
  }

  pub fn to_json(&self) -> ReleaseResult<String> {
    Ok(serde_json::to_string_pretty(self)?)
  }

  pub fn print_human(&self) {
    println!("\n📦 Release summary for {}", self.version);
    for record in &self.stages {
      println!("   {}  {}", record.at.format("%H:%M:%S"), record.stage);
    }

    if let Some(release) = &self.release {
      println!("\n   Artifacts in {}:", release.path.display());
      for artifact in &release.artifacts {
        println!("   {}  {}", artifact.sha256, artifact.file_name());
      }
    }
    if let Some(path) = &self.formula_path {
      println!("\n   Formula: {}", path.display());
    }
    if let Some(path) = &self.default_formula_path {
      println!("   Default formula: {}", path.display());
    }
    if let Some(finished) = self.finished_at {
      let secs = (finished - self.started_at).num_seconds();
      println!("\n   Finished in {}s", secs);
    }
  }
}
