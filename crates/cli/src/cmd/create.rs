//! Implementation of the `feedstocks create` command.

use anyhow::{Context, Result};

use super::Global;
use crate::output::{print_json, print_stat, print_success};

/// Generate recipes for new packages and push them to a staged-recipes branch.
pub fn cmd_create(global: &Global, packages: &[String], branch: Option<&str>) -> Result<()> {
  let orchestrator = global.orchestrator()?;
  let outcome = orchestrator
    .create(packages, branch)
    .context("Failed to create staged recipes")?;

  if global.format.is_json() {
    return print_json(&outcome);
  }

  print_success(&format!("Pushed {} recipe(s) to staged-recipes", outcome.packages.len()));
  print_stat("Branch", &outcome.branch);
  print_stat("Packages", &outcome.packages.join(", "));
  Ok(())
}
