use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline states, in the only order they can be reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stage {
  VersionBumped,
  PackagesBuilt,
  StagingPublished,
  AwaitingHumanConfirmation,
  ProductionPublished,
  FormulaExtracted,
  FormulaWritten,
  FormulaVerified,
  FormulaCommitted,
  DefaultPointerUpdated,
}

impl Stage {
  pub const ALL: [Stage; 10] = [
    Stage::VersionBumped,
    Stage::PackagesBuilt,
    Stage::StagingPublished,
    Stage::AwaitingHumanConfirmation,
    Stage::ProductionPublished,
    Stage::FormulaExtracted,
    Stage::FormulaWritten,
    Stage::FormulaVerified,
    Stage::FormulaCommitted,
    Stage::DefaultPointerUpdated,
  ];

  /// The stage that follows this one, if any
  pub fn next(&self) -> Option<Stage> {
    let idx = Stage::ALL.iter().position(|s| s == self)?;
    Stage::ALL.get(idx + 1).copied()
  }

  /// Status line printed once the stage is reached
  pub fn message(&self) -> &'static str {
    match self {
      Stage::VersionBumped => "Version bumped and committed",
      Stage::PackagesBuilt => "Packages built",
      Stage::StagingPublished => "Published to the staging index",
      Stage::AwaitingHumanConfirmation => "Waiting for confirmation",
      Stage::ProductionPublished => "Published to the production index",
      Stage::FormulaExtracted => "Formula data extracted",
      Stage::FormulaWritten => "Formula written",
      Stage::FormulaVerified => "Formula installed, tested and audited",
      Stage::FormulaCommitted => "Formula committed",
      Stage::DefaultPointerUpdated => "Default formula updated",
    }
  }
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Stage::VersionBumped => "version-bumped",
      Stage::PackagesBuilt => "packages-built",
      Stage::StagingPublished => "staging-published",
      Stage::AwaitingHumanConfirmation => "awaiting-confirmation",
      Stage::ProductionPublished => "production-published",
      Stage::FormulaExtracted => "formula-extracted",
      Stage::FormulaWritten => "formula-written",
      Stage::FormulaVerified => "formula-verified",
      Stage::FormulaCommitted => "formula-committed",
      Stage::DefaultPointerUpdated => "default-pointer-updated",
    };
    f.write_str(name)
  }
}
