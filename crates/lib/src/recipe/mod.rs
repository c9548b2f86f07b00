//! Recipe model.
//!
//! A recipe is a Jinja-templated YAML document (`meta.yaml`). This module
//! extracts the declared version from the raw text and the requirement
//! sections from the rendered document.
//!
//! # Modules
//!
//! - [`render`] - Template rendering with stubbed conda-build helpers
//! - [`transform`] - Post-generation rewrites such as prefix injection

pub mod render;
pub mod transform;

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde_yaml::Value;
use thiserror::Error;

use crate::consts::RECIPE_FILENAME;
use crate::requirement::{RequirementError, extract_declared_version, extract_package_name};

pub use render::{is_helper_stub, render};
pub use transform::{PrefixTransform, RecipeTransform};

/// Errors that can occur while loading or interpreting a recipe.
#[derive(Debug, Error)]
pub enum RecipeError {
  #[error(transparent)]
  Requirement(#[from] RequirementError),

  #[error("failed to render recipe template: {0}")]
  Render(#[from] minijinja::Error),

  #[error("rendered recipe is not valid YAML: {0}")]
  Yaml(#[from] serde_yaml::Error),

  #[error("failed to read recipe '{path}': {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("recipe has no package name")]
  MissingName,
}

/// Requirement specs keyed by section (`build`, `host`, `run`, ...).
pub type Requirements = BTreeMap<String, Vec<String>>;

/// A parsed recipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
  /// Raw template text as fetched or read from disk.
  pub text: String,
  /// Value of the `{% set version = "..." %}` directive.
  pub version: String,
  /// Requirement specs from the rendered document.
  pub requirements: Requirements,
}

impl Recipe {
  /// Parse a recipe from its raw template text.
  pub fn parse(text: &str) -> Result<Self, RecipeError> {
    let version = extract_declared_version(text)?;
    let requirements = parse_requirements(text)?;
    Ok(Self {
      text: text.to_string(),
      version,
      requirements,
    })
  }

  /// Read and parse `meta.yaml` from a recipe directory.
  pub fn from_dir(dir: &Path) -> Result<Self, RecipeError> {
    let path = dir.join(RECIPE_FILENAME);
    let text = std::fs::read_to_string(&path).map_err(|source| RecipeError::Read { path, source })?;
    Self::parse(&text)
  }

  /// All requirement specs across every section.
  pub fn specs(&self) -> impl Iterator<Item = &str> {
    self.requirements.values().flatten().map(String::as_str)
  }

  /// Bare package names of every requirement, deduplicated.
  pub fn dependency_names(&self) -> Result<BTreeSet<String>, RequirementError> {
    self
      .specs()
      .map(|spec| extract_package_name(spec).map(str::to_string))
      .collect()
  }
}

/// Render a recipe and collect its requirement sections.
///
/// Sections of multi-output recipes (`outputs[*].requirements`) are merged
/// into the top-level sections of the same name. Null sections are empty.
pub fn parse_requirements(text: &str) -> Result<Requirements, RecipeError> {
  let document = rendered_document(text)?;
  let mut requirements = Requirements::new();

  if let Some(section) = document.get("requirements") {
    collect_sections(section, &mut requirements);
  }

  if let Some(Value::Sequence(outputs)) = document.get("outputs") {
    for output in outputs {
      if let Some(section) = output.get("requirements") {
        collect_sections(section, &mut requirements);
      }
    }
  }

  Ok(requirements)
}

/// The rendered `package.name` of a recipe.
pub fn package_name(text: &str) -> Result<String, RecipeError> {
  let document = rendered_document(text)?;
  document
    .get("package")
    .and_then(|package| package.get("name"))
    .and_then(scalar_to_string)
    .ok_or(RecipeError::MissingName)
}

fn rendered_document(text: &str) -> Result<Value, RecipeError> {
  let rendered = render(text)?;
  let document: Value = serde_yaml::from_str(&rendered)?;
  Ok(document)
}

fn collect_sections(value: &Value, requirements: &mut Requirements) {
  let Value::Mapping(sections) = value else {
    return;
  };

  for (key, items) in sections {
    let Some(section) = key.as_str() else {
      continue;
    };
    let specs = requirements.entry(section.to_string()).or_default();
    if let Value::Sequence(items) = items {
      specs.extend(items.iter().filter_map(scalar_to_string));
    }
  }
}

fn scalar_to_string(value: &Value) -> Option<String> {
  match value {
    Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
    Value::Number(n) => Some(n.to_string()),
    Value::Bool(b) => Some(b.to_string()),
    _ => None,
  }
}
