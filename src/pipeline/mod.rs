//! Release pipeline
//!
//! Drives one release through its stages, strictly in order:
//!
//! ```text
//! preflight checks
//!   -> VersionBumped -> PackagesBuilt -> StagingPublished
//!   -> AwaitingHumanConfirmation        (operator checks the staging index)
//!   -> ProductionPublished
//!   -> FormulaExtracted -> FormulaWritten -> FormulaVerified -> FormulaCommitted
//!   -> DefaultPointerUpdated            (only when requested)
//! ```
//!
//! The first failure stops the run. Nothing is retried or rolled back; the
//! report shows how far the run got.

pub mod confirm;
pub mod report;
pub mod stage;

pub use confirm::{AssumeYes, Confirm};
pub use report::RunReport;
pub use stage::Stage;

use crate::build::{self, ReleaseDirectory};
use crate::checks;
use crate::core::context::ReleaseContext;
use crate::core::error::{ReleaseError, ReleaseResult};
use crate::formula;
use crate::publish::{PublishTarget, publish};
use crate::ui::BuildProgress;
use crate::version::{Version, VersionPart, bump_version};
use serde::Serialize;

/// What to release
#[derive(Debug, Clone)]
pub struct ReleaseOptions {
  pub version: Version,
  pub part: VersionPart,
  /// Also replace the default formula
  pub set_default: bool,
}

/// One full release run
pub struct ReleasePipeline<'a> {
  ctx: &'a ReleaseContext<'a>,
  confirm: &'a mut dyn Confirm,
  options: ReleaseOptions,
  report: RunReport,
}

impl<'a> ReleasePipeline<'a> {
  pub fn new(ctx: &'a ReleaseContext<'a>, confirm: &'a mut dyn Confirm, options: ReleaseOptions) -> Self {
    let report = RunReport::new(options.version.as_str(), Some(options.part));
    Self {
      ctx,
      confirm,
      options,
      report,
    }
  }

  /// Print a status line per stage and draw a build progress bar
  pub fn with_echo(mut self, echo: bool) -> Self {
    self.report = self.report.with_echo(echo);
    self
  }

  pub fn into_report(self) -> RunReport {
    self.report
  }

  /// Run every stage; on error the report keeps the stages already reached
  pub fn run(&mut self) -> ReleaseResult<()> {
    let ctx = self.ctx;
    let version = self.options.version.clone();

    preflight(ctx)?;

    bump_version(ctx, &version, self.options.part)?;
    self.report.record(Stage::VersionBumped);

    let release = self.build()?;
    self.report.release = Some(release.clone());
    self.report.record(Stage::PackagesBuilt);

    publish(ctx, &release, PublishTarget::Staging)?;
    self.report.record(Stage::StagingPublished);

    self.report.record(Stage::AwaitingHumanConfirmation);
    let prompt = format!(
      "Ensure {} exists and looks reasonable",
      ctx.config.index.staging_url_for(version.as_str())
    );
    if !self.confirm.confirm(&prompt)? {
      return Err(ReleaseError::Aborted {
        stage: Stage::AwaitingHumanConfirmation.to_string(),
      });
    }

    publish(ctx, &release, PublishTarget::Production)?;
    self.report.record(Stage::ProductionPublished);

    publish_formula(ctx, &version, self.options.set_default, &mut self.report)?;
    self.report.finish();
    Ok(())
  }

  fn build(&mut self) -> ReleaseResult<ReleaseDirectory> {
    if !self.report.echoes() {
      return build::build_packages(self.ctx);
    }

    let total = build::release_targets(self.ctx).len();
    let mut bar = BuildProgress::new(total, "Building packages");
    let release = build::build_packages_with(self.ctx, |target, idx, _| {
      tracing::debug!(%target, "building");
      bar.set(idx);
    })?;
    bar.set(total);
    Ok(release)
  }
}

/// Refuse to start unless every blocking check passes
pub fn preflight(ctx: &ReleaseContext) -> ReleaseResult<()> {
  let results = checks::create_default_runner().run_all(ctx);
  checks::ensure_ready(&results)
}

/// Extract, write, verify and commit the formula for an already published version
pub fn publish_formula(
  ctx: &ReleaseContext,
  version: &Version,
  set_default: bool,
  report: &mut RunReport,
) -> ReleaseResult<()> {
  let data = formula::extract(ctx, version)?;
  report.record(Stage::FormulaExtracted);

  let file = formula::versioned_formula(ctx, &data);
  file.write()?;
  report.formula_path = Some(file.path.clone());
  report.record(Stage::FormulaWritten);

  formula::verify(ctx, &file.path)?;
  report.record(Stage::FormulaVerified);

  formula::commit_formula(ctx, &file.path, version)?;
  report.record(Stage::FormulaCommitted);

  if set_default {
    let path = formula::update_default(ctx, &data)?;
    report.default_formula_path = Some(path);
    report.record(Stage::DefaultPointerUpdated);
  }
  Ok(())
}

/// A stage and the external actions it would take
#[derive(Debug, Clone, Serialize)]
pub struct PlannedStep {
  pub stage: Stage,
  pub actions: Vec<String>,
}

/// Describe a run without executing anything
pub fn plan(ctx: &ReleaseContext, options: &ReleaseOptions) -> Vec<PlannedStep> {
  let tools = &ctx.config.tools;
  let name = &ctx.config.product.name;
  let version = &options.version;
  let root = ctx.source_root();
  let dist = ReleaseContext::dist_dir(root);
  let formula_path = formula::formula_path(ctx, version);
  let sandbox = ctx.sandbox_path();

  let mut steps = Vec::new();
  let mut step = |stage: Stage, actions: Vec<String>| steps.push(PlannedStep { stage, actions });

  step(
    Stage::VersionBumped,
    vec![format!(
      "{} --commit --no-tag --new-version {} {}",
      tools.bumpversion, version, options.part
    )],
  );
  step(
    Stage::PackagesBuilt,
    build::release_targets(ctx)
      .iter()
      .map(|t| format!("({}) {} setup.py sdist bdist_wheel", t.dir(root).display(), tools.python))
      .chain(std::iter::once(format!("collect artifacts into {}", dist.display())))
      .collect(),
  );
  step(
    Stage::StagingPublished,
    vec![format!(
      "{} upload --repository {} {}/*",
      tools.twine,
      ctx.config.index.staging_repository,
      dist.display()
    )],
  );
  step(
    Stage::AwaitingHumanConfirmation,
    vec![format!(
      "confirm {}",
      ctx.config.index.staging_url_for(version.as_str())
    )],
  );
  step(
    Stage::ProductionPublished,
    vec![format!("{} upload {}/*", tools.twine, dist.display())],
  );
  step(
    Stage::FormulaExtracted,
    vec![
      format!("{} -m venv {}", tools.python, sandbox.display()),
      format!(
        "{}/bin/python -m pip install --upgrade {} {}=={}",
        sandbox.display(),
        ctx.config.homebrew.helper_package,
        name,
        version
      ),
      format!("{}/bin/poet -s {}", sandbox.display(), name),
      format!("{}/bin/poet -r {}", sandbox.display(), name),
    ],
  );
  step(Stage::FormulaWritten, vec![format!("write {}", formula_path.display())]);
  step(
    Stage::FormulaVerified,
    vec![
      format!("{} uninstall --force {}", tools.brew, formula_path.display()),
      format!("{} install {}", tools.brew, formula_path.display()),
      format!("{} test {}", tools.brew, name),
      format!("{} audit --strict {}", tools.brew, name),
    ],
  );
  step(
    Stage::FormulaCommitted,
    vec![format!("{} commit -m 'add {}@{}'", tools.git, name, version)],
  );
  if options.set_default {
    let default_path = formula::default_pointer::default_formula_path(ctx);
    step(
      Stage::DefaultPointerUpdated,
      vec![
        format!("write {}", default_path.display()),
        format!("{} commit -m 'upgrade {} to {}'", tools.git, name, version),
      ],
    );
  }

  steps
}
