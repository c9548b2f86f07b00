//! External collaborators.
//!
//! Each collaborator sits behind a trait so the orchestrator can be driven
//! with fakes in tests:
//!
//! - [`generator`] - recipe synthesis (`grayskull`)
//! - [`git`] - clone / branch / commit / push (`git` CLI)
//! - [`github`] - fork management over the REST API
//! - [`conda`] - native package builds and feedstock rerendering
//! - [`uploader`] - artifact upload over HTTP
//!
//! Subprocesses are spawned through [`process`].

pub mod conda;
pub mod generator;
pub mod git;
pub mod github;
pub mod process;
pub mod uploader;

use std::path::PathBuf;

use thiserror::Error;

pub use conda::{Builder, Conda, Rerenderer};
pub use generator::{Grayskull, RecipeGenerator};
pub use git::{Git, GitCli};
pub use github::{ForkService, GitHub};
pub use uploader::{Artifact, HttpUploader, Uploader, collect_artifacts};

/// Errors raised by external collaborators.
#[derive(Debug, Error)]
pub enum ServiceError {
  /// The program could not be started.
  #[error("failed to run '{program}': {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  /// The program ran and reported failure.
  #[error("command failed ({status}): {command}")]
  Failed {
    command: String,
    status: String,
    stderr: String,
  },

  #[error("request to {url} failed: {message}")]
  Http { url: String, message: String },

  #[error("{url} returned HTTP {status}")]
  Status { url: String, status: u16 },

  /// The token belongs to someone other than the configured user.
  #[error("GitHub token belongs to '{actual}' but the config names '{expected}'")]
  UserMismatch { expected: String, actual: String },

  /// The generator finished without writing a recipe.
  #[error("no recipe was generated for '{package}'")]
  NoRecipe { package: String },

  #[error("I/O error at '{path}': {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

impl ServiceError {
  pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
    let path = path.into();
    move |source| ServiceError::Io { path, source }
  }
}
