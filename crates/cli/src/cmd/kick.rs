//! Implementation of the `feedstocks kick` command.

use anyhow::{Context, Result, bail};
use owo_colors::OwoColorize;

use super::Global;
use crate::output::{print_error, print_info, print_json, print_success, print_warning};

/// Push empty commits to the feedstocks whose artifacts are missing.
pub fn cmd_kick(global: &Global, packages: &[String], dry_run: bool) -> Result<()> {
  let orchestrator = global.orchestrator()?;
  let report = orchestrator
    .kick(packages, dry_run)
    .context("Failed to kick feedstocks")?;

  if global.format.is_json() {
    print_json(&report)?;
  } else {
    if dry_run {
      println!("{}", "Dry run - nothing pushed".yellow());
      println!();
    }
    if report.kicked.is_empty() && report.failed.is_empty() {
      print_info("Nothing to kick");
    }
    let verb = if dry_run { "Would kick" } else { "Kicked" };
    for package in &report.kicked {
      print_success(&format!("{verb} {package}"));
    }
    for (package, classification) in &report.not_kickable {
      print_warning(&format!("{package} is not kickable: {classification}"));
    }
    for (package, error) in &report.failed {
      print_error(&format!("{package}: {error}"));
    }
  }

  if !report.failed.is_empty() {
    bail!("{} feedstock(s) could not be kicked", report.failed.len());
  }
  Ok(())
}
