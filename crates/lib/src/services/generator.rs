//! Recipe synthesis.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing::{info, warn};
use walkdir::WalkDir;

use super::ServiceError;
use super::process::run;
use crate::consts::RECIPE_FILENAME;

/// Produces a recipe directory for a package version.
pub trait RecipeGenerator: Send + Sync {
  /// Write the recipe for `package==version` into `dest`, creating it if
  /// needed. Existing files with the same names are overwritten.
  fn generate(&self, package: &str, version: &str, dest: &Path) -> Result<(), ServiceError>;

  /// Name and version of the generator, recorded in commit messages.
  fn describe(&self) -> String;
}

/// Generates recipes from PyPI metadata with `grayskull pypi`.
#[derive(Debug)]
pub struct Grayskull {
  program: PathBuf,
  version: OnceLock<Option<String>>,
}

impl Grayskull {
  pub fn new(program: impl Into<PathBuf>) -> Self {
    Self {
      program: program.into(),
      version: OnceLock::new(),
    }
  }

  fn version(&self) -> Option<&str> {
    self
      .version
      .get_or_init(|| match run(self.program.as_os_str(), ["--version"], None) {
        Ok(out) => out.split_whitespace().last().map(str::to_string),
        Err(e) => {
          warn!(error = %e, "could not determine grayskull version");
          None
        }
      })
      .as_deref()
  }
}

impl RecipeGenerator for Grayskull {
  fn generate(&self, package: &str, version: &str, dest: &Path) -> Result<(), ServiceError> {
    info!(package, version, dest = %dest.display(), "generating recipe");

    // grayskull writes `<out>/<name>/meta.yaml`; generate into a scratch dir
    // and move the files into place.
    let scratch = tempfile::tempdir().map_err(ServiceError::io(std::env::temp_dir()))?;
    let spec = format!("{package}=={version}");
    run(
      self.program.as_os_str(),
      [OsStr::new("pypi"), OsStr::new(&spec), OsStr::new("-o"), scratch.path().as_os_str()],
      None,
    )?;

    let generated = find_recipe_dir(scratch.path()).ok_or_else(|| ServiceError::NoRecipe {
      package: package.to_string(),
    })?;
    copy_dir_contents(&generated, dest)
  }

  fn describe(&self) -> String {
    match self.version() {
      Some(version) => format!("grayskull {version}"),
      None => "grayskull".to_string(),
    }
  }
}

/// The directory holding the first `meta.yaml` under `root`.
pub fn find_recipe_dir(root: &Path) -> Option<PathBuf> {
  WalkDir::new(root)
    .max_depth(2)
    .sort_by_file_name()
    .into_iter()
    .filter_map(Result::ok)
    .find(|entry| entry.file_type().is_file() && entry.file_name() == RECIPE_FILENAME)
    .and_then(|entry| entry.path().parent().map(Path::to_path_buf))
}

/// Copy every file under `src` into `dest`, keeping relative paths.
pub fn copy_dir_contents(src: &Path, dest: &Path) -> Result<(), ServiceError> {
  for entry in WalkDir::new(src).min_depth(1) {
    let entry = entry.map_err(|e| ServiceError::Io {
      path: src.to_path_buf(),
      source: e.into(),
    })?;
    let Ok(relative) = entry.path().strip_prefix(src) else {
      continue;
    };
    let target = dest.join(relative);

    if entry.file_type().is_dir() {
      fs::create_dir_all(&target).map_err(ServiceError::io(&target))?;
    } else {
      if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(ServiceError::io(parent))?;
      }
      fs::copy(entry.path(), &target).map_err(ServiceError::io(&target))?;
    }
  }
  Ok(())
}
