//! Orchestration of the user-facing actions.
//!
//! The [`Orchestrator`] owns the configuration and the fleet-wide
//! collaborators. Collaborators that depend on per-invocation options
//! (the package builder and the uploader) are passed to the operation that
//! needs them.
//!
//! # Modules
//!
//! - [`repos`] - `create`, `update` and `kick`, which push to repositories
//! - [`recipes`] - `generate`, `build`, `publish` and `order` on a local
//!   recipes directory

mod recipes;
mod repos;

#[cfg(test)]
mod fakes;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{Config, ConfigError};
use crate::consts::RECIPE_FILENAME;
use crate::desired::{DesiredState, DesiredStateError};
use crate::recipe::{PrefixTransform, RecipeError, RecipeTransform};
use crate::reconcile::{Reconciliation, Snapshot, reconcile};
use crate::schedule::{GraphError, ScheduleError};
use crate::services::{Conda, ForkService, Git, GitCli, GitHub, Grayskull, RecipeGenerator, Rerenderer, ServiceError};
use crate::sources::http::build_client;
use crate::sources::{
  HttpIndexSource, HttpListingSource, HttpRecipeSource, IndexSource, ListingSource, RecipeSource, SourceError,
};

pub use recipes::{BuildPlan, BuildReport, GenerateReport, PlannedRecipe, PublishReport};
pub use repos::{CreateOutcome, KickReport, UpdateOutcome};

/// Errors that abort an operation.
#[derive(Debug, Error)]
pub enum OrchestrateError {
  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error(transparent)]
  Desired(#[from] DesiredStateError),

  #[error(transparent)]
  Client(SourceError),

  /// The channel index is required and could not be loaded.
  #[error("failed to fetch channel index: {0}")]
  Index(#[source] SourceError),

  #[error("failed to fetch recipe for '{package}': {source}")]
  Source {
    package: String,
    #[source]
    source: SourceError,
  },

  #[error(transparent)]
  Service(#[from] ServiceError),

  #[error("invalid recipe in '{path}': {source}")]
  Recipe {
    path: PathBuf,
    #[source]
    source: RecipeError,
  },

  #[error(transparent)]
  Graph(#[from] GraphError),

  #[error(transparent)]
  Schedule(#[from] ScheduleError),

  #[error("package '{0}' is not in the desired state")]
  UnknownPackage(String),

  #[error("the feedstock for '{0}' already exists, use update instead")]
  FeedstockExists(String),

  #[error("github_user is not set in the config")]
  MissingGithubUser,

  #[error("more than one recipe builds '{0}'")]
  DuplicateRecipe(String),

  #[error("failed to create worker pool: {0}")]
  Pool(#[from] rayon::ThreadPoolBuildError),

  #[error("I/O error at '{path}': {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

impl OrchestrateError {
  pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
    let path = path.into();
    move |source| OrchestrateError::Io { path, source }
  }
}

/// Fleet-wide collaborators.
pub struct Collaborators {
  pub recipes: Box<dyn RecipeSource>,
  pub index: Box<dyn IndexSource>,
  pub listings: Box<dyn ListingSource>,
  pub generator: Box<dyn RecipeGenerator>,
  pub git: Box<dyn Git>,
  /// Absent without a GitHub token; forks are then assumed to exist.
  pub forks: Option<Box<dyn ForkService>>,
  pub rerenderer: Box<dyn Rerenderer>,
}

impl Collaborators {
  /// HTTP sources and command-line tools as configured.
  pub fn from_config(config: &Config, token: Option<&str>) -> Result<Self, OrchestrateError> {
    let client = build_client(config.timeout()?).map_err(OrchestrateError::Client)?;
    Ok(Self {
      recipes: Box::new(HttpRecipeSource::new(client.clone(), &config.recipe_url)),
      index: Box::new(HttpIndexSource::new(
        client.clone(),
        &config.channel_url,
        config.subdirs.clone(),
      )),
      listings: Box::new(HttpListingSource::new(client.clone(), &config.listing_url, &config.channel)),
      generator: Box::new(Grayskull::new(config.grayskull_bin())),
      git: Box::new(GitCli::default()),
      forks: token.map(|token| Box::new(GitHub::new(client, config.github_api(), token)) as Box<dyn ForkService>),
      rerenderer: Box::new(Conda::new(config.conda_bin())),
    })
  }
}

pub struct Orchestrator {
  config: Config,
  desired: DesiredState,
  services: Collaborators,
  /// Prepended to generated recipe directory names.
  prefix: String,
  transform: Option<Box<dyn RecipeTransform>>,
}

impl Orchestrator {
  pub fn new(config: Config, services: Collaborators) -> Result<Self, OrchestrateError> {
    let desired = config.desired()?;
    Ok(Self {
      config,
      desired,
      services,
      prefix: String::new(),
      transform: None,
    })
  }

  /// Prefix generated recipe names and in-batch requirements.
  pub fn with_prefix(mut self, prefix: Option<String>) -> Self {
    let prefix = prefix.unwrap_or_default();
    let transform = (!prefix.is_empty()).then(|| Box::new(PrefixTransform::new(&prefix)) as Box<dyn RecipeTransform>);
    self.prefix = prefix;
    self.with_transform(transform)
  }

  pub fn with_transform(mut self, transform: Option<Box<dyn RecipeTransform>>) -> Self {
    self.transform = transform;
    self
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  pub fn desired(&self) -> &DesiredState {
    &self.desired
  }

  fn pool(&self) -> Result<rayon::ThreadPool, OrchestrateError> {
    Ok(rayon::ThreadPoolBuilder::new().num_threads(self.config.jobs).build()?)
  }

  /// Classify every desired package.
  ///
  /// The channel index is fetched first; if it cannot be loaded nothing is
  /// classified.
  pub fn status(&self) -> Result<Reconciliation, OrchestrateError> {
    let index = self
      .services
      .index
      .fetch_index(&self.config.channel)
      .map_err(OrchestrateError::Index)?;

    let pool = self.pool()?;
    let snapshot = pool.install(|| {
      Snapshot::gather(
        &self.desired,
        self.services.recipes.as_ref(),
        self.services.listings.as_ref(),
      )
    });
    Ok(reconcile(&self.desired, &snapshot, &index, &self.config.runtime))
  }

  /// Desired packages that have no recipe upstream, in desired order.
  pub fn unpublished(&self) -> Result<Vec<String>, OrchestrateError> {
    let pool = self.pool()?;
    let fetched: Vec<(String, Result<bool, SourceError>)> = pool.install(|| {
      self
        .desired
        .targets()
        .par_iter()
        .map(|t| {
          let exists = self.services.recipes.fetch_recipe(&t.name).map(|r| r.is_some());
          (t.name.clone(), exists)
        })
        .collect()
    });

    let mut missing = Vec::new();
    for (package, exists) in fetched {
      match exists {
        Ok(true) => {}
        Ok(false) => missing.push(package),
        Err(source) => return Err(OrchestrateError::Source { package, source }),
      }
    }
    debug!(count = missing.len(), "packages without a recipe");
    Ok(missing)
  }

  /// The requested packages, or every unpublished one when none are named.
  fn select(&self, packages: &[String]) -> Result<DesiredState, OrchestrateError> {
    if packages.is_empty() {
      let unpublished = self.unpublished()?;
      return Ok(self.desired.restrict(&unpublished));
    }
    if let Some(unknown) = packages.iter().find(|p| !self.desired.contains(p)) {
      return Err(OrchestrateError::UnknownPackage(unknown.clone()));
    }
    Ok(self.desired.restrict(packages))
  }

  /// Directory name of a generated recipe; follows the prefixed package name.
  fn recipe_dirname(&self, package: &str) -> String {
    format!("{}{package}", self.prefix)
  }

  /// Run the configured transform over a generated recipe directory.
  fn apply_transform(&self, recipe_dir: &Path, known: &BTreeSet<String>) -> Result<(), OrchestrateError> {
    let Some(transform) = &self.transform else {
      return Ok(());
    };
    let path = recipe_dir.join(RECIPE_FILENAME);
    let text = std::fs::read_to_string(&path).map_err(OrchestrateError::io(&path))?;
    let rewritten = transform
      .apply(&text, known)
      .map_err(|source| OrchestrateError::Recipe {
        path: path.clone(),
        source,
      })?;
    std::fs::write(&path, rewritten).map_err(OrchestrateError::io(&path))?;
    info!(path = %path.display(), "applied recipe transform");
    Ok(())
  }

  fn github_user(&self) -> Result<&str, OrchestrateError> {
    self
      .config
      .github_user
      .as_deref()
      .ok_or(OrchestrateError::MissingGithubUser)
  }
}
