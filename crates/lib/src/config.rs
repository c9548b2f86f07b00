//! Configuration file (`feedstocks.yml`).
//!
//! ```yaml
//! github_user: octocat
//! feedstocks:
//!   - databind.core@4.4.0
//!   - databind.json@4.4.0
//! conda_bin: ~/miniconda3/bin/conda
//! after_clone: git config user.email octocat@example.com
//! ```
//!
//! Everything except `feedstocks` is optional.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::consts::*;
use crate::desired::{DesiredState, DesiredStateError};
use crate::paths::{config_dir, expand_tilde};

/// Errors that can occur while locating or loading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
  /// Config file not found.
  #[error("config file not found: {path}")]
  NotFound { path: String },

  #[error("failed to read config '{path}': {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse config '{path}': {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_yaml::Error,
  },

  #[error(transparent)]
  Desired(#[from] DesiredStateError),

  #[error("invalid timeout '{value}': {source}")]
  Timeout {
    value: String,
    #[source]
    source: humantime::DurationError,
  },

  /// `jobs` must be at least one.
  #[error("jobs must be at least 1")]
  NoJobs,
}

fn default_channel() -> String {
  DEFAULT_CHANNEL.to_string()
}
fn default_channel_url() -> String {
  DEFAULT_CHANNEL_URL.to_string()
}
fn default_subdirs() -> Vec<String> {
  DEFAULT_SUBDIRS.iter().map(|s| s.to_string()).collect()
}
fn default_recipe_url() -> String {
  DEFAULT_RECIPE_URL.to_string()
}
fn default_listing_url() -> String {
  DEFAULT_LISTING_URL.to_string()
}
fn default_upstream_owner() -> String {
  DEFAULT_UPSTREAM_OWNER.to_string()
}
fn default_branch() -> String {
  DEFAULT_BRANCH.to_string()
}
fn default_clone_url() -> String {
  DEFAULT_CLONE_URL.to_string()
}
fn default_upstream_url() -> String {
  DEFAULT_UPSTREAM_URL.to_string()
}
fn default_runtime() -> String {
  DEFAULT_RUNTIME.to_string()
}
fn default_workdir() -> PathBuf {
  PathBuf::from(DEFAULT_WORKDIR)
}
fn default_jobs() -> usize {
  DEFAULT_JOBS
}
fn default_timeout() -> String {
  DEFAULT_TIMEOUT.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
  /// Account that owns the forks pushed to.
  #[serde(default)]
  pub github_user: Option<String>,
  /// Desired state as `name@version` entries.
  pub feedstocks: Vec<String>,
  #[serde(default)]
  pub conda_bin: Option<String>,
  #[serde(default)]
  pub grayskull_bin: Option<String>,
  /// Shell snippet run with `bash -c` inside a freshly cloned repository.
  #[serde(default)]
  pub after_clone: Option<String>,

  #[serde(default = "default_channel")]
  pub channel: String,
  /// Base URL of the channel; may contain `{channel}`.
  #[serde(default = "default_channel_url")]
  pub channel_url: String,
  #[serde(default = "default_subdirs")]
  pub subdirs: Vec<String>,
  /// Raw recipe URL; must contain `{package}`.
  #[serde(default = "default_recipe_url")]
  pub recipe_url: String,
  /// Published files page; may contain `{channel}` and `{package}`.
  #[serde(default = "default_listing_url")]
  pub listing_url: String,

  #[serde(default = "default_upstream_owner")]
  pub upstream_owner: String,
  #[serde(default = "default_branch")]
  pub default_branch: String,
  /// Push URL of a fork; `{user}` and `{repo}` are substituted.
  #[serde(default = "default_clone_url")]
  pub clone_url: String,
  /// Fetch URL of the upstream; `{owner}` and `{repo}` are substituted.
  #[serde(default = "default_upstream_url")]
  pub upstream_url: String,
  /// GitHub API base URL.
  #[serde(default)]
  pub github_api: Option<String>,

  #[serde(default = "default_runtime")]
  pub runtime: String,
  /// Where repositories are cloned.
  #[serde(default = "default_workdir")]
  pub workdir: PathBuf,
  /// Parallel fetches during reconciliation.
  #[serde(default = "default_jobs")]
  pub jobs: usize,
  /// HTTP timeout, e.g. `30s` or `2m`.
  #[serde(default = "default_timeout")]
  pub timeout: String,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      github_user: None,
      feedstocks: Vec::new(),
      conda_bin: None,
      grayskull_bin: None,
      after_clone: None,
      channel: default_channel(),
      channel_url: default_channel_url(),
      subdirs: default_subdirs(),
      recipe_url: default_recipe_url(),
      listing_url: default_listing_url(),
      upstream_owner: default_upstream_owner(),
      default_branch: default_branch(),
      clone_url: default_clone_url(),
      upstream_url: default_upstream_url(),
      github_api: None,
      runtime: default_runtime(),
      workdir: default_workdir(),
      jobs: default_jobs(),
      timeout: default_timeout(),
    }
  }
}

impl Config {
  /// Load and validate a config file.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    let config = Self::parse(&text).map_err(|e| match e {
      ConfigError::Parse { source, .. } => ConfigError::Parse {
        path: path.to_path_buf(),
        source,
      },
      other => other,
    })?;
    debug!(path = %path.display(), feedstocks = config.feedstocks.len(), "loaded config");
    Ok(config)
  }

  /// Parse and validate config text.
  pub fn parse(text: &str) -> Result<Self, ConfigError> {
    let config: Config = serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
      path: PathBuf::new(),
      source,
    })?;
    config.validate()?;
    Ok(config)
  }

  fn validate(&self) -> Result<(), ConfigError> {
    self.desired()?;
    self.timeout()?;
    if self.jobs == 0 {
      return Err(ConfigError::NoJobs);
    }
    Ok(())
  }

  /// The desired state declared by `feedstocks`.
  pub fn desired(&self) -> Result<DesiredState, DesiredStateError> {
    DesiredState::parse(&self.feedstocks)
  }

  pub fn timeout(&self) -> Result<Duration, ConfigError> {
    humantime::parse_duration(&self.timeout).map_err(|source| ConfigError::Timeout {
      value: self.timeout.clone(),
      source,
    })
  }

  /// The conda executable, with `~` expanded.
  pub fn conda_bin(&self) -> PathBuf {
    self
      .conda_bin
      .as_deref()
      .map(expand_tilde)
      .unwrap_or_else(|| PathBuf::from("conda"))
  }

  pub fn grayskull_bin(&self) -> PathBuf {
    self
      .grayskull_bin
      .as_deref()
      .map(expand_tilde)
      .unwrap_or_else(|| PathBuf::from("grayskull"))
  }

  pub fn github_api(&self) -> &str {
    self.github_api.as_deref().unwrap_or(GITHUB_API_URL)
  }

  /// Push URL for the user's fork of `repo`.
  pub fn fork_url(&self, user: &str, repo: &str) -> String {
    self.clone_url.replace("{user}", user).replace("{repo}", repo)
  }

  /// Fetch URL for the upstream `repo`.
  pub fn upstream_repo_url(&self, repo: &str) -> String {
    self
      .upstream_url
      .replace("{owner}", &self.upstream_owner)
      .replace("{repo}", repo)
  }
}

/// Find the config file path, with fallback resolution.
///
/// Priority order:
/// 1. Explicit path if provided and exists
/// 2. `./feedstocks.yml` in current directory
/// 3. `~/.config/feedstocks/feedstocks.yml` (user config dir)
pub fn find_config_path(explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
  if let Some(path) = explicit {
    if path.exists() {
      return Ok(path.to_path_buf());
    }
    return Err(ConfigError::NotFound {
      path: path.display().to_string(),
    });
  }

  let cwd_config = PathBuf::from(".").join(CONFIG_FILENAME);
  if cwd_config.exists() {
    return Ok(cwd_config);
  }

  let user_config = config_dir().join(CONFIG_FILENAME);
  if user_config.exists() {
    return Ok(user_config);
  }

  Err(ConfigError::NotFound {
    path: format!("{CONFIG_FILENAME} (tried ./{CONFIG_FILENAME} and {})", user_config.display()),
  })
}
