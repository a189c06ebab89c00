//! The operator checkpoint between staging and production

use crate::core::error::{ReleaseResult, ResultExt};
use std::io::{self, BufRead, Write};

/// Asks the operator whether to continue
pub trait Confirm {
  /// `Ok(false)` means the operator declined
  fn confirm(&mut self, prompt: &str) -> ReleaseResult<bool>;
}

/// Prompts on a writer and reads one answer line
///
/// Enter, `y` or `yes` continues. Anything else, or end of input, declines.
pub struct PromptConfirm<R, W> {
  input: R,
  output: W,
}

impl<R: BufRead, W: Write> PromptConfirm<R, W> {
  pub fn new(input: R, output: W) -> Self {
    Self { input, output }
  }
}

/// Interactive confirmation on the terminal (prompt on stderr)
pub fn terminal() -> PromptConfirm<io::StdinLock<'static>, io::Stderr> {
  PromptConfirm::new(io::stdin().lock(), io::stderr())
}

impl<R: BufRead, W: Write> Confirm for PromptConfirm<R, W> {
  fn confirm(&mut self, prompt: &str) -> ReleaseResult<bool> {
    write!(self.output, "\n⏸  {} [Y/n] ", prompt).context("Failed to write prompt")?;
    self.output.flush().context("Failed to write prompt")?;

    let mut line = String::new();
    let read = self.input.read_line(&mut line).context("Failed to read answer")?;
    if read == 0 {
      tracing::debug!("end of input at confirmation");
      return Ok(false);
    }
    Ok(accepts(&line))
  }
}

fn accepts(answer: &str) -> bool {
  matches!(answer.trim().to_ascii_lowercase().as_str(), "" | "y" | "yes")
}

/// Non-interactive runs (`--yes`)
pub struct AssumeYes;

impl Confirm for AssumeYes {
  fn confirm(&mut self, prompt: &str) -> ReleaseResult<bool> {
    tracing::info!(%prompt, "confirmation skipped");
    Ok(true)
  }
}
