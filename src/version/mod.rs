//! Product version model
//!
//! Versions follow the pattern bumpversion is configured with in the product
//! repository: `major.minor.patch` with an optional prerelease tag and number
//! glued on (`0.16.0b1`). This is deliberately not semver; `0.16.0b1` is not a
//! valid semver string.
//!
//! Two projections feed the Homebrew formula:
//!
//! - class name: `0.16.0b1` -> `DbtAT0160B1`
//! - file name:  `0.16.0b1` -> `dbt@0.16.0-b1.rb`

pub mod bump;

pub use bump::{VersionPart, bump_version};

use crate::core::error::{ReleaseError, ReleaseResult};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^(?P<major>\d+)\.(?P<minor>\d+)\.(?P<patch>\d+)(?:(?P<tag>[a-z]+)(?P<num>\d+))?$")
    .expect("regex for product versions")
});

/// Formula class prefix used when none is configured (`[product] formula_class_prefix`)
pub const DEFAULT_CLASS_PREFIX: &str = "Dbt";

/// Product and formula base name used when none is configured (`[product] name`)
pub const DEFAULT_FORMULA_NAME: &str = "dbt";

/// Prerelease segment, e.g. `b1` or `rc2`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prerelease {
  pub tag: String,
  pub num: u64,
}

/// A parsed product version
///
/// Only constructible through [`Version::parse`], so every value matches the
/// version pattern. The raw input is kept and is what `Display` prints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
  raw: String,
  pub major: u64,
  pub minor: u64,
  pub patch: u64,
  pub prerelease: Option<Prerelease>,
}

impl Version {
  /// Parse `major.minor.patch[tagnum]`
  ///
  /// The tag/number pair is all-or-nothing: `0.16.0b` and `0.16.0b1x` are
  /// rejected rather than silently dropping the suffix.
  pub fn parse(raw: &str) -> ReleaseResult<Self> {
    let invalid = || ReleaseError::InvalidVersion { raw: raw.to_string() };
    let caps = VERSION_PATTERN.captures(raw).ok_or_else(invalid)?;

    let number = |name: &str| -> ReleaseResult<u64> {
      caps
        .name(name)
        .ok_or_else(invalid)?
        .as_str()
        .parse::<u64>()
        .map_err(|_| invalid())
    };

    let prerelease = match (caps.name("tag"), caps.name("num")) {
      (Some(tag), Some(_)) => Some(Prerelease {
        tag: tag.as_str().to_string(),
        num: number("num")?,
      }),
      (None, None) => None,
      _ => return Err(invalid()),
    };

    Ok(Self {
      raw: raw.to_string(),
      major: number("major")?,
      minor: number("minor")?,
      patch: number("patch")?,
      prerelease,
    })
  }

  /// The string the version was parsed from
  pub fn as_str(&self) -> &str {
    &self.raw
  }

  pub fn is_prerelease(&self) -> bool {
    self.prerelease.is_some()
  }

  /// Versioned formula class name: `{prefix}AT{major}{minor}{patch}[{Tag}{num}]`
  pub fn class_name_for(&self, prefix: &str) -> String {
    let mut name = format!("{}AT{}{}{}", prefix, self.major, self.minor, self.patch);
    if let Some(pre) = &self.prerelease {
      name.push_str(&title_case(&pre.tag));
      name.push_str(&pre.num.to_string());
    }
    name
  }

  /// Versioned formula file name: `{name}@M.N.P[-tagnum].rb`
  pub fn filename_for(&self, name: &str) -> String {
    format!("{}@{}.rb", name, self.dotted())
  }

  /// Dotted core with a hyphen-joined prerelease: `0.16.0-b1`
  pub fn dotted(&self) -> String {
    let mut s = format!("{}.{}.{}", self.major, self.minor, self.patch);
    if let Some(pre) = &self.prerelease {
      s.push_str(&format!("-{}{}", pre.tag, pre.num));
    }
    s
  }
}

impl fmt::Display for Version {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.raw)
  }
}

fn title_case(word: &str) -> String {
  let mut chars = word.chars();
  match chars.next() {
    Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
    None => String::new(),
  }
}
