//! Release preconditions
//!
//! # Built-in Checks
//!
//! - **python-version**: the build interpreter matches `required_python`
//! - **wheel-installed**: `wheel` is importable so `bdist_wheel` works
//! - **tools-available**: bumpversion, twine, brew and git can be run

mod python;
mod runner;
mod tools;
mod trait_def;

pub use runner::{create_default_runner, ensure_ready};
pub use trait_def::Severity;
