//! `conda build` and `conda smithy rerender`.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use tracing::info;

use super::ServiceError;
use super::process::run;

/// Builds one recipe directory into an output folder.
pub trait Builder: Send + Sync {
  fn build(&self, recipe_dir: &Path, output_dir: &Path) -> Result<(), ServiceError>;
}

/// Regenerates a feedstock's CI configuration after its recipe changed.
pub trait Rerenderer: Send + Sync {
  fn rerender(&self, feedstock: &Path) -> Result<(), ServiceError>;
}

#[derive(Debug, Clone)]
pub struct Conda {
  program: PathBuf,
  channels: Vec<String>,
  no_test: bool,
}

impl Conda {
  pub fn new(program: impl Into<PathBuf>) -> Self {
    Self {
      program: program.into(),
      channels: Vec::new(),
      no_test: false,
    }
  }

  /// Extra channels passed to `conda build` with `-c`.
  pub fn with_channels(mut self, channels: Vec<String>) -> Self {
    self.channels = channels;
    self
  }

  pub fn with_no_test(mut self, no_test: bool) -> Self {
    self.no_test = no_test;
    self
  }

  /// Arguments for `conda build`, without the program itself.
  pub fn build_args(&self, recipe_dir: &Path, output_dir: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
      "build".into(),
      recipe_dir.as_os_str().to_owned(),
      "--output-folder".into(),
      output_dir.as_os_str().to_owned(),
    ];
    for channel in &self.channels {
      args.push("-c".into());
      args.push(channel.into());
    }
    if self.no_test {
      args.push("--no-test".into());
    }
    args
  }
}

impl Builder for Conda {
  fn build(&self, recipe_dir: &Path, output_dir: &Path) -> Result<(), ServiceError> {
    info!(recipe = %recipe_dir.display(), "building");
    run(self.program.as_os_str(), self.build_args(recipe_dir, output_dir), None).map(drop)
  }
}

impl Rerenderer for Conda {
  fn rerender(&self, feedstock: &Path) -> Result<(), ServiceError> {
    info!(feedstock = %feedstock.display(), "rerendering");
    run(
      self.program.as_os_str(),
      [OsStr::new("smithy"), OsStr::new("rerender")],
      Some(feedstock),
    )
    .map(drop)
  }
}
