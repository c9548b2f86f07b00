//! Desired state: the package versions a run should converge on.

use std::collections::HashSet;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DesiredStateError {
  /// An entry is not of the form `name@version`.
  #[error("invalid feedstock entry '{0}': expected 'name@version'")]
  InvalidEntry(String),

  /// The same package is listed twice.
  #[error("package '{0}' is listed more than once")]
  DuplicatePackage(String),
}

/// One package and its target version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
  pub name: String,
  pub version: String,
}

impl Target {
  /// Parse a `name@version` entry.
  pub fn parse(entry: &str) -> Result<Self, DesiredStateError> {
    let invalid = || DesiredStateError::InvalidEntry(entry.to_string());
    let (name, version) = entry.trim().split_once('@').ok_or_else(invalid)?;
    let (name, version) = (name.trim(), version.trim());
    if name.is_empty() || version.is_empty() || version.contains('@') {
      return Err(invalid());
    }
    Ok(Self {
      name: name.to_string(),
      version: version.to_string(),
    })
  }
}

/// Ordered package -> version mapping with unique names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DesiredState {
  targets: Vec<Target>,
}

impl DesiredState {
  pub fn new(targets: Vec<Target>) -> Result<Self, DesiredStateError> {
    let mut seen = HashSet::new();
    for target in &targets {
      if !seen.insert(target.name.as_str()) {
        return Err(DesiredStateError::DuplicatePackage(target.name.clone()));
      }
    }
    Ok(Self { targets })
  }

  /// Parse a list of `name@version` entries, keeping their order.
  pub fn parse<S: AsRef<str>>(entries: &[S]) -> Result<Self, DesiredStateError> {
    let targets = entries
      .iter()
      .map(|entry| Target::parse(entry.as_ref()))
      .collect::<Result<Vec<_>, _>>()?;
    Self::new(targets)
  }

  pub fn targets(&self) -> &[Target] {
    &self.targets
  }

  pub fn len(&self) -> usize {
    self.targets.len()
  }

  pub fn is_empty(&self) -> bool {
    self.targets.is_empty()
  }

  pub fn version_of(&self, name: &str) -> Option<&str> {
    self
      .targets
      .iter()
      .find(|t| t.name == name)
      .map(|t| t.version.as_str())
  }

  pub fn contains(&self, name: &str) -> bool {
    self.version_of(name).is_some()
  }

  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.targets.iter().map(|t| t.name.as_str())
  }

  /// Keep only the named packages, in desired order.
  pub fn restrict<S: AsRef<str>>(&self, names: &[S]) -> Self {
    Self {
      targets: self
        .targets
        .iter()
        .filter(|t| names.iter().any(|n| n.as_ref() == t.name))
        .cloned()
        .collect(),
    }
  }
}
