//! The full release

use super::load_context;
use crate::core::error::ReleaseResult;
use crate::core::exec::SystemRunner;
use crate::pipeline::{self, AssumeYes, Confirm, ReleaseOptions, ReleasePipeline, confirm};
use crate::version::{Version, VersionPart};
use std::path::PathBuf;

pub struct ReleaseArgs {
  pub version: String,
  pub part: VersionPart,
  pub path: Option<PathBuf>,
  pub homebrew_path: Option<PathBuf>,
  pub homebrew_set_default: bool,
  pub yes: bool,
  pub dry_run: bool,
  pub json: bool,
}

pub fn run_release(args: ReleaseArgs) -> ReleaseResult<()> {
  let version = Version::parse(&args.version)?;
  let runner = SystemRunner;
  let ctx = load_context(args.path, args.homebrew_path, &runner)?;

  let options = ReleaseOptions {
    version,
    part: args.part,
    set_default: args.homebrew_set_default,
  };

  if args.dry_run {
    let steps = pipeline::plan(&ctx, &options);
    if args.json {
      println!("{}", serde_json::to_string_pretty(&steps)?);
    } else {
      println!("📋 Release plan for {} (dry run, nothing is executed)\n", options.version);
      for step in &steps {
        println!("▸ {}", step.stage);
        for action in &step.actions {
          println!("    {}", action);
        }
      }
    }
    return Ok(());
  }

  if options.set_default && options.version.is_prerelease() {
    tracing::warn!(version = %options.version, "making a prerelease the default Homebrew formula");
  }
  if !args.json {
    println!("🚀 Releasing {} ({} bump)\n", options.version, options.part);
  }

  let mut assume_yes = AssumeYes;
  let mut prompt = confirm::terminal();
  let confirmer: &mut dyn Confirm = if args.yes { &mut assume_yes } else { &mut prompt };

  let mut pipeline = ReleasePipeline::new(&ctx, confirmer, options).with_echo(!args.json);
  let result = pipeline.run();
  let report = pipeline.into_report();

  if args.json {
    println!("{}", report.to_json()?);
  } else if result.is_ok() {
    report.print_human();
  } else {
    match report.stage_list().last() {
      Some(stage) => match stage.next() {
        Some(next) => eprintln!("\nLast completed stage: {} (stopped before {})", stage, next),
        None => eprintln!("\nLast completed stage: {}", stage),
      },
      None => eprintln!("\nNo stage completed."),
    }
  }

  result
}
