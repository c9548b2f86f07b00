//! Implementation of the `feedstocks generate` command.

use std::path::Path;

use anyhow::{Context, Result, bail};

use super::Global;
use crate::output::{print_error, print_info, print_json, print_success};

/// Generate recipes into `dir`.
///
/// Every package is attempted; the command fails afterwards if any of them
/// could not be generated.
pub fn cmd_generate(global: &Global, dir: &Path, packages: &[String]) -> Result<()> {
  let orchestrator = global.orchestrator()?;
  let report = orchestrator
    .generate(dir, packages)
    .context("Failed to generate recipes")?;

  if global.format.is_json() {
    print_json(&report)?;
  } else {
    if report.generated.is_empty() && report.failed.is_empty() {
      print_info("Nothing to generate");
    }
    for (package, path) in &report.generated {
      print_success(&format!("{package} {}", path.display()));
    }
    for (package, error) in &report.failed {
      print_error(&format!("{package}: {error}"));
    }
  }

  if !report.failed.is_empty() {
    bail!("{} recipe(s) failed to generate", report.failed.len());
  }
  Ok(())
}
