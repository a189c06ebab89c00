//! The Homebrew half of a release, on its own

use super::load_context;
use crate::core::error::ReleaseResult;
use crate::core::exec::SystemRunner;
use crate::formula::{self, FormulaKind};
use crate::pipeline::{self, RunReport};
use crate::version::Version;
use std::path::PathBuf;

pub struct FormulaArgs {
  pub version: String,
  pub path: Option<PathBuf>,
  pub homebrew_path: Option<PathBuf>,
  pub set_default: bool,
  /// Render to stdout instead of writing, verifying and committing
  pub print: bool,
}

pub fn run_formula(args: FormulaArgs) -> ReleaseResult<()> {
  let version = Version::parse(&args.version)?;
  let runner = SystemRunner;
  let ctx = load_context(args.path, args.homebrew_path, &runner)?;

  if args.print {
    let data = formula::extract(&ctx, &version)?;
    let kind = if args.set_default {
      FormulaKind::Default
    } else {
      FormulaKind::Versioned
    };
    print!("{}", formula::render(&data, kind, &ctx.config.product.formula_class_prefix));
    return Ok(());
  }

  println!("🍺 Generating Homebrew formula for {}\n", version);
  let mut report = RunReport::new(version.as_str(), None).with_echo(true);
  let result = pipeline::publish_formula(&ctx, &version, args.set_default, &mut report);
  if result.is_ok() {
    report.finish();
    report.print_human();
  }
  result
}
