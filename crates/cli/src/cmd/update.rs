//! Implementation of the `feedstocks update` command.

use anyhow::{Context, Result};

use super::Global;
use crate::output::{print_json, print_stat, print_success};

pub fn cmd_update(global: &Global, package: &str, branch: Option<&str>) -> Result<()> {
  let orchestrator = global.orchestrator()?;
  let outcome = orchestrator
    .update(package, branch)
    .with_context(|| format!("Failed to update the {package} feedstock"))?;

  if global.format.is_json() {
    return print_json(&outcome);
  }

  print_success(&format!("Updated {} to {}", outcome.package, outcome.version));
  print_stat("Branch", &outcome.branch);
  Ok(())
}
