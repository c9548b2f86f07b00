//! Recipe rewrites applied after generation.
//!
//! Transforms work on the template text line by line rather than on a
//! rendered document, so Jinja expressions, comments and selectors that the
//! transform does not touch are preserved verbatim.

use std::collections::BTreeSet;

use tracing::debug;

use super::{RecipeError, package_name};
use crate::requirement::extract_package_name;

/// A rewrite of a freshly generated recipe.
///
/// `known_packages` is the set of packages processed together in this run;
/// transforms must not rediscover it on their own.
pub trait RecipeTransform: Send + Sync {
  fn apply(&self, recipe_text: &str, known_packages: &BTreeSet<String>) -> Result<String, RecipeError>;
}

/// Prefixes the recipe's own name and every requirement naming a known package.
#[derive(Debug, Clone)]
pub struct PrefixTransform {
  prefix: String,
}

impl PrefixTransform {
  pub fn new(prefix: impl Into<String>) -> Self {
    Self { prefix: prefix.into() }
  }

  pub fn prefix(&self) -> &str {
    &self.prefix
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
  Package,
  Requirements,
  Other,
}

impl RecipeTransform for PrefixTransform {
  fn apply(&self, recipe_text: &str, known_packages: &BTreeSet<String>) -> Result<String, RecipeError> {
    // The `name` variable is left alone: it also feeds the source URL.
    let name = package_name(recipe_text)?;
    let mut section = Section::Other;
    let mut out = Vec::new();

    for line in recipe_text.lines() {
      if let Some(top_level) = top_level_key(line) {
        section = match top_level {
          "package" => Section::Package,
          "requirements" => Section::Requirements,
          _ => Section::Other,
        };
        out.push(line.to_string());
        continue;
      }

      let rewritten = match section {
        Section::Package => self.rewrite_name(line, &name),
        Section::Requirements => self.rewrite_requirement(line, known_packages),
        Section::Other => None,
      };
      out.push(rewritten.unwrap_or_else(|| line.to_string()));
    }

    let mut text = out.join("\n");
    if recipe_text.ends_with('\n') {
      text.push('\n');
    }
    Ok(text)
  }
}

impl PrefixTransform {
  fn rewrite_name(&self, line: &str, name: &str) -> Option<String> {
    let indent = indentation(line);
    let rest = &line[indent.len()..];
    if indent.is_empty() || !rest.starts_with("name:") {
      return None;
    }
    debug!(name, prefix = %self.prefix, "prefixing package name");
    Some(format!("{indent}name: {}{name}", self.prefix))
  }

  fn rewrite_requirement(&self, line: &str, known_packages: &BTreeSet<String>) -> Option<String> {
    let indent = indentation(line);
    let item = line[indent.len()..].strip_prefix("- ")?;

    let (spec, comment) = match item.find(" #") {
      Some(pos) => item.split_at(pos),
      None => (item, ""),
    };

    let bare = extract_package_name(spec).ok()?;
    if !known_packages.contains(bare) {
      return None;
    }
    Some(format!("{indent}- {}{}{comment}", self.prefix, spec.trim_start()))
  }
}

fn indentation(line: &str) -> &str {
  let trimmed = line.trim_start();
  &line[..line.len() - trimmed.len()]
}

/// The key of a top-level mapping entry (`key:` with no indentation).
fn top_level_key(line: &str) -> Option<&str> {
  if line.starts_with(char::is_whitespace) || line.starts_with('#') || line.starts_with('{') {
    return None;
  }
  let (key, _) = line.split_once(':')?;
  key
    .chars()
    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    .then_some(key)
}
