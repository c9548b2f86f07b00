//! Requirement spec and version directive parsing.
//!
//! A requirement spec is a single entry of a recipe's `requirements` section,
//! such as `numpy >=1.21,<2` or `python>=3.8`. Only the bare package name is
//! of interest here; version constraints are never evaluated.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Errors raised while parsing specs and recipe directives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequirementError {
  /// The spec was empty (or only whitespace).
  #[error("malformed requirement spec: {0:?}")]
  MalformedSpec(String),

  /// The recipe has no `{% set version = "..." %}` directive.
  #[error("no version directive found in recipe")]
  VersionNotFound,
}

static VERSION_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r#"\{%-?\s*set\s+version\s*=\s*(?:"([^"]*)"|'([^']*)')\s*-?%\}"#).expect("valid version regex")
});

fn is_separator(c: char) -> bool {
  c.is_whitespace() || matches!(c, '<' | '>' | '=' | '!')
}

/// Extract the bare package name from a requirement spec.
///
/// Splits on the first whitespace or comparator character and returns the
/// prefix. `"foo >=1.2"`, `"foo>=1.2"` and `"foo"` all yield `"foo"`.
pub fn extract_package_name(spec: &str) -> Result<&str, RequirementError> {
  let spec = spec.trim();
  if spec.is_empty() {
    return Err(RequirementError::MalformedSpec(spec.to_string()));
  }

  let end = spec.find(is_separator).unwrap_or(spec.len());
  Ok(&spec[..end])
}

/// Extract the value of the `{% set version = "..." %}` directive.
pub fn extract_declared_version(recipe_text: &str) -> Result<String, RequirementError> {
  let captures = VERSION_DIRECTIVE
    .captures(recipe_text)
    .ok_or(RequirementError::VersionNotFound)?;

  captures
    .get(1)
    .or_else(|| captures.get(2))
    .map(|m| m.as_str().to_string())
    .ok_or(RequirementError::VersionNotFound)
}
