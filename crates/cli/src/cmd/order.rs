//! Implementation of the `feedstocks order` command.

use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};

use feedstocks_lib::orchestrate::BuildPlan;

use super::Global;
use crate::output::{print_json, symbols};

pub fn cmd_order(global: &Global, dir: &Path) -> Result<()> {
  let orchestrator = global.orchestrator()?;
  let plan = orchestrator
    .plan(dir)
    .with_context(|| format!("Failed to order the recipes in {}", dir.display()))?;

  if global.format.is_json() {
    return print_json(&plan);
  }
  print_plan(&plan, global.verbose);
  Ok(())
}

/// Build order, then the waves that could build in parallel.
pub(super) fn print_plan(plan: &BuildPlan, verbose: bool) {
  for (position, recipe) in plan.recipes.iter().enumerate() {
    if verbose {
      println!(
        "{:>3}. {} {} {}",
        position + 1,
        recipe.name,
        recipe.version.if_supports_color(Stream::Stdout, |s| s.dimmed()),
        recipe.dir.display().if_supports_color(Stream::Stdout, |s| s.dimmed())
      );
    } else {
      println!("{:>3}. {}", position + 1, recipe.name);
    }
  }

  if plan.waves.is_empty() {
    return;
  }
  println!();
  println!("Waves:");
  for (wave, packages) in plan.waves.iter().enumerate() {
    println!("  {} {} {}", symbols::ARROW, wave + 1, packages.join(", "));
  }
}
