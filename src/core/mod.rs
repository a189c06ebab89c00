//! Core building blocks shared by every release stage
//!
//! - **config**: release.toml parsing and validation
//! - **context**: explicit release context (paths, config, process runner)
//! - **error**: error types with contextual help messages and exit codes
//! - **exec**: external process invocation behind a runner trait
//! - **vcs**: git operations on the formula repository (SystemGit)

pub mod config;
pub mod context;
pub mod error;
pub mod exec;
pub mod vcs;
