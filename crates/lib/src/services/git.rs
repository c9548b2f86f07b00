//! Version control through the `git` command line.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::info;

use super::ServiceError;
use super::process::run;

/// Repository operations the orchestrator needs.
pub trait Git: Send + Sync {
  fn clone_repo(&self, url: &str, path: &Path) -> Result<(), ServiceError>;
  fn add_remote(&self, repo: &Path, name: &str, url: &str) -> Result<(), ServiceError>;
  fn fetch(&self, repo: &Path, remote: &str) -> Result<(), ServiceError>;
  /// Check out `branch`, creating or resetting it to `start` with a hard reset.
  fn reset_branch(&self, repo: &Path, branch: &str, start: &str) -> Result<(), ServiceError>;
  fn add(&self, repo: &Path, paths: &[&Path]) -> Result<(), ServiceError>;
  fn commit(&self, repo: &Path, message: &str, allow_empty: bool) -> Result<(), ServiceError>;
  fn push(&self, repo: &Path, remote: &str, branch: &str, force: bool) -> Result<(), ServiceError>;
}

#[derive(Debug, Clone)]
pub struct GitCli {
  program: PathBuf,
}

impl Default for GitCli {
  fn default() -> Self {
    Self::new("git")
  }
}

impl GitCli {
  pub fn new(program: impl Into<PathBuf>) -> Self {
    Self {
      program: program.into(),
    }
  }

  fn git<I, S>(&self, repo: &Path, args: I) -> Result<String, ServiceError>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
  {
    run(self.program.as_os_str(), args, Some(repo))
  }
}

impl Git for GitCli {
  fn clone_repo(&self, url: &str, path: &Path) -> Result<(), ServiceError> {
    info!(url, path = %path.display(), "cloning");
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).map_err(ServiceError::io(parent))?;
    }
    run(
      self.program.as_os_str(),
      [OsStr::new("clone"), OsStr::new(url), path.as_os_str()],
      None,
    )?;
    Ok(())
  }

  fn add_remote(&self, repo: &Path, name: &str, url: &str) -> Result<(), ServiceError> {
    self.git(repo, ["remote", "add", name, url]).map(drop)
  }

  fn fetch(&self, repo: &Path, remote: &str) -> Result<(), ServiceError> {
    self.git(repo, ["fetch", remote]).map(drop)
  }

  fn reset_branch(&self, repo: &Path, branch: &str, start: &str) -> Result<(), ServiceError> {
    self.git(repo, ["checkout", "-B", branch, start])?;
    self.git(repo, ["reset", "--hard", start]).map(drop)
  }

  fn add(&self, repo: &Path, paths: &[&Path]) -> Result<(), ServiceError> {
    let args = std::iter::once(OsStr::new("add"))
      .chain(std::iter::once(OsStr::new("--")))
      .chain(paths.iter().map(|p| p.as_os_str()));
    self.git(repo, args).map(drop)
  }

  fn commit(&self, repo: &Path, message: &str, allow_empty: bool) -> Result<(), ServiceError> {
    let mut args = vec!["commit", "-m", message];
    if allow_empty {
      args.push("--allow-empty");
    }
    self.git(repo, args).map(drop)
  }

  fn push(&self, repo: &Path, remote: &str, branch: &str, force: bool) -> Result<(), ServiceError> {
    let refspec = format!("{branch}:{branch}");
    let mut args = vec!["push", remote, refspec.as_str()];
    if force {
      args.push("--force");
    }
    self.git(repo, args).map(drop)
  }
}
