//! Implementation of the `feedstocks build` command.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use owo_colors::OwoColorize;

use feedstocks_lib::services::Conda;

use super::Global;
use super::order::print_plan;
use crate::output::{format_duration, print_error, print_json, print_stat, print_success, symbols};

/// Build the recipes in `dir` in dependency order.
///
/// With `dry_run` only the order and the build waves are printed.
pub fn cmd_build(global: &Global, dir: &Path, channels: Vec<String>, no_test: bool, dry_run: bool) -> Result<()> {
  let start = Instant::now();
  let orchestrator = global.orchestrator()?;

  if dry_run {
    let plan = orchestrator
      .plan(dir)
      .with_context(|| format!("Failed to order the recipes in {}", dir.display()))?;
    if global.format.is_json() {
      return print_json(&plan);
    }
    println!("{}", "Dry run - nothing will be built".yellow());
    println!();
    print_plan(&plan, global.verbose);
    return Ok(());
  }

  let builder = Conda::new(orchestrator.config().conda_bin())
    .with_channels(channels)
    .with_no_test(no_test);
  let report = orchestrator
    .build(dir, &builder)
    .with_context(|| format!("Failed to build the recipes in {}", dir.display()))?;

  if global.format.is_json() {
    print_json(&report)?;
  } else {
    for package in &report.built {
      print_success(&format!("Built {package}"));
    }
    if let Some((package, error)) = &report.failed {
      print_error(&format!("{package}: {error}"));
    }
    for package in &report.skipped {
      println!("  {} {} {}", symbols::INFO, package, "(skipped)".dimmed());
    }
    println!();
    print_stat("Took", &format_duration(start.elapsed()));
  }

  if let Some((package, _)) = &report.failed {
    bail!("build of {package} failed");
  }
  Ok(())
}
