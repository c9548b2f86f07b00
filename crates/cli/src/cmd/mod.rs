//! Subcommand implementations.

mod build;
mod create;
mod generate;
mod kick;
mod order;
mod publish;
mod status;
mod update;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::debug;

use feedstocks_lib::config::{Config, find_config_path};
use feedstocks_lib::orchestrate::{Collaborators, Orchestrator};

use crate::output::OutputFormat;

pub use build::cmd_build;
pub use create::cmd_create;
pub use generate::cmd_generate;
pub use kick::cmd_kick;
pub use order::cmd_order;
pub use publish::cmd_publish;
pub use status::cmd_status;
pub use update::cmd_update;

/// Options shared by every subcommand.
pub struct Global {
  pub config: Option<PathBuf>,
  pub prefix: Option<String>,
  pub token: Option<String>,
  pub verbose: bool,
  pub format: OutputFormat,
}

impl Global {
  pub fn load_config(&self) -> Result<Config> {
    let path = find_config_path(self.config.as_deref()).context("Failed to find config file")?;
    debug!(path = %path.display(), "loading config");
    Config::load(&path).with_context(|| format!("Failed to load {}", path.display()))
  }

  pub fn orchestrator(&self) -> Result<Orchestrator> {
    let config = self.load_config()?;
    let services = Collaborators::from_config(&config, self.token.as_deref())?;
    let orchestrator = Orchestrator::new(config, services)?.with_prefix(self.prefix.clone());
    Ok(orchestrator)
  }
}
