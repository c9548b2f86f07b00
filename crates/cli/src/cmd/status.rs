//! Status command implementation.
//!
//! Reconciles the desired state and prints one line per package.

use std::time::Instant;

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};

use super::Global;
use crate::output::{classification_symbol, format_duration, print_json, print_stat, print_warning};

pub fn cmd_status(global: &Global) -> Result<()> {
  let start = Instant::now();
  let orchestrator = global.orchestrator()?;
  let result = orchestrator.status().context("Failed to reconcile feedstocks")?;

  if global.format.is_json() {
    return print_json(&result);
  }

  for report in result.reports() {
    println!(
      "  {} {} {} {}",
      classification_symbol(&report.classification),
      report.package.if_supports_color(Stream::Stdout, |s| s.bold()),
      report.version.if_supports_color(Stream::Stdout, |s| s.dimmed()),
      report.classification
    );
    if report.evidence_conflict {
      print_warning(&format!(
        "{}: the package listing and the channel index disagree",
        report.package
      ));
    }
  }

  println!();
  print_stat("Packages", &result.reports().len().to_string());
  print_stat("Missing recipes", &result.missing_recipes().len().to_string());
  print_stat("Kickable", &result.kickable().len().to_string());
  if global.verbose {
    print_stat("Took", &format_duration(start.elapsed()));
  }
  Ok(())
}
