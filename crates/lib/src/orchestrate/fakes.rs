//! In-memory collaborators for orchestrator tests.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tempfile::TempDir;

use super::{Collaborators, Orchestrator};
use crate::config::Config;
use crate::consts::RECIPE_FILENAME;
use crate::services::{Artifact, Builder, ForkService, Git, RecipeGenerator, Rerenderer, ServiceError, Uploader};
use crate::sources::{ChannelIndex, IndexRecord, IndexSource, ListingSource, RecipeSource, SourceError};

pub fn recipe_text(name: &str, version: &str, run: &[&str]) -> String {
  let mut text = format!(
    "{{% set name = \"{name}\" %}}\n{{% set version = \"{version}\" %}}\n\npackage:\n  name: {{{{ name }}}}\n  version: {{{{ version }}}}\n\nrequirements:\n  host:\n    - pip\n    - python\n  run:\n    - python\n"
  );
  for spec in run {
    text.push_str(&format!("    - {spec}\n"));
  }
  text
}

fn failure(message: &str) -> ServiceError {
  ServiceError::Failed {
    command: message.to_string(),
    status: "exit status: 1".to_string(),
    stderr: String::new(),
  }
}

#[derive(Default)]
pub struct World {
  pub recipes: BTreeMap<String, Result<Option<String>, SourceError>>,
  pub listings: BTreeMap<String, String>,
  pub index: ChannelIndex,
  pub index_fails: bool,
  /// Requirements written into generated recipes.
  pub generated_requirements: BTreeMap<String, Vec<String>>,
  pub generator_fails: BTreeSet<String>,
  pub generated: Vec<(String, String, PathBuf)>,
  pub git_log: Vec<String>,
  pub push_fails: bool,
  pub forks: Vec<String>,
  pub rerendered: Vec<PathBuf>,
  pub built: Vec<PathBuf>,
  pub build_fails: BTreeSet<String>,
  pub uploads: Vec<String>,
}

#[derive(Clone, Default)]
pub struct Shared(Arc<Mutex<World>>);

impl Shared {
  pub fn lock(&self) -> MutexGuard<'_, World> {
    self.0.lock().unwrap()
  }
}

impl RecipeSource for Shared {
  fn fetch_recipe(&self, package: &str) -> Result<Option<String>, SourceError> {
    self.lock().recipes.get(package).cloned().unwrap_or(Ok(None))
  }
}

impl ListingSource for Shared {
  fn fetch_listing(&self, package: &str) -> Result<String, SourceError> {
    Ok(self.lock().listings.get(package).cloned().unwrap_or_default())
  }
}

impl IndexSource for Shared {
  fn fetch_index(&self, _channel: &str) -> Result<ChannelIndex, SourceError> {
    let world = self.lock();
    if world.index_fails {
      return Err(SourceError::Status {
        url: "http://index".to_string(),
        status: 503,
      });
    }
    Ok(world.index.clone())
  }
}

impl RecipeGenerator for Shared {
  fn generate(&self, package: &str, version: &str, dest: &Path) -> Result<(), ServiceError> {
    let mut world = self.lock();
    if world.generator_fails.contains(package) {
      return Err(failure(&format!("grayskull pypi {package}=={version}")));
    }
    let requirements = world.generated_requirements.get(package).cloned().unwrap_or_default();
    let specs: Vec<&str> = requirements.iter().map(String::as_str).collect();
    fs::create_dir_all(dest).map_err(ServiceError::io(dest))?;
    fs::write(dest.join(RECIPE_FILENAME), recipe_text(package, version, &specs)).map_err(ServiceError::io(dest))?;
    world
      .generated
      .push((package.to_string(), version.to_string(), dest.to_path_buf()));
    Ok(())
  }

  fn describe(&self) -> String {
    "grayskull 2.7.3".to_string()
  }
}

impl Git for Shared {
  fn clone_repo(&self, url: &str, path: &Path) -> Result<(), ServiceError> {
    fs::create_dir_all(path).map_err(ServiceError::io(path))?;
    self.lock().git_log.push(format!("clone {url}"));
    Ok(())
  }

  fn add_remote(&self, _repo: &Path, name: &str, url: &str) -> Result<(), ServiceError> {
    self.lock().git_log.push(format!("remote {name} {url}"));
    Ok(())
  }

  fn fetch(&self, _repo: &Path, remote: &str) -> Result<(), ServiceError> {
    self.lock().git_log.push(format!("fetch {remote}"));
    Ok(())
  }

  fn reset_branch(&self, _repo: &Path, branch: &str, start: &str) -> Result<(), ServiceError> {
    self.lock().git_log.push(format!("branch {branch} {start}"));
    Ok(())
  }

  fn add(&self, repo: &Path, paths: &[&Path]) -> Result<(), ServiceError> {
    let names: Vec<String> = paths
      .iter()
      .map(|p| p.strip_prefix(repo).unwrap_or(p).display().to_string())
      .collect();
    self.lock().git_log.push(format!("add {}", names.join(" ")));
    Ok(())
  }

  fn commit(&self, _repo: &Path, message: &str, allow_empty: bool) -> Result<(), ServiceError> {
    let empty = if allow_empty { " (empty)" } else { "" };
    self.lock().git_log.push(format!("commit {message}{empty}"));
    Ok(())
  }

  fn push(&self, _repo: &Path, remote: &str, branch: &str, force: bool) -> Result<(), ServiceError> {
    let mut world = self.lock();
    if world.push_fails {
      return Err(failure("git push"));
    }
    let force = if force { " --force" } else { "" };
    world.git_log.push(format!("push {remote} {branch}{force}"));
    Ok(())
  }
}

impl ForkService for Shared {
  fn ensure_fork(&self, user: &str, owner: &str, repo: &str) -> Result<(), ServiceError> {
    self.lock().forks.push(format!("{user} {owner}/{repo}"));
    Ok(())
  }
}

impl Rerenderer for Shared {
  fn rerender(&self, feedstock: &Path) -> Result<(), ServiceError> {
    self.lock().rerendered.push(feedstock.to_path_buf());
    Ok(())
  }
}

impl Builder for Shared {
  fn build(&self, recipe_dir: &Path, _output_dir: &Path) -> Result<(), ServiceError> {
    let mut world = self.lock();
    let name = recipe_dir
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default();
    world.built.push(recipe_dir.to_path_buf());
    if world.build_fails.contains(&name) {
      return Err(failure(&format!("conda build {name}")));
    }
    Ok(())
  }
}

impl Uploader for Shared {
  fn upload(&self, artifact: &Artifact) -> Result<String, ServiceError> {
    let url = format!("http://upload/{}/{}", artifact.subdir, artifact.file_name());
    if artifact.file_name().starts_with("bad") {
      return Err(ServiceError::Status { url, status: 409 });
    }
    self.lock().uploads.push(url.clone());
    Ok(url)
  }
}

pub struct Fixture {
  pub shared: Shared,
  pub config: Config,
  pub temp: TempDir,
}

impl Fixture {
  pub fn new(entries: &[&str]) -> Self {
    let temp = TempDir::new().unwrap();
    let config = Config {
      github_user: Some("octocat".to_string()),
      feedstocks: entries.iter().map(|e| e.to_string()).collect(),
      workdir: temp.path().join("data"),
      jobs: 2,
      ..Config::default()
    };
    let fixture = Self {
      shared: Shared::default(),
      config,
      temp,
    };
    fixture.indexed("pip", "24.0");
    fixture
  }

  pub fn recipe(&self, name: &str, version: &str, run: &[&str]) {
    self
      .shared
      .lock()
      .recipes
      .insert(name.to_string(), Ok(Some(recipe_text(name, version, run))));
  }

  pub fn fail_recipe(&self, name: &str) {
    self.shared.lock().recipes.insert(
      name.to_string(),
      Err(SourceError::Transport {
        url: format!("http://recipes/{name}"),
        message: "connection reset".to_string(),
      }),
    );
  }

  pub fn listing(&self, name: &str, version: &str) {
    self
      .shared
      .lock()
      .listings
      .insert(name.to_string(), format!("noarch/{name}-{version}-pyh_0.conda"));
  }

  pub fn indexed(&self, name: &str, version: &str) {
    self.shared.lock().index.insert(
      format!("{name}-{version}-pyh_0.conda"),
      IndexRecord {
        name: name.to_string(),
        version: version.to_string(),
        build: "pyh_0".to_string(),
        build_number: 0,
        depends: Vec::new(),
        subdir: Some("noarch".to_string()),
      },
    );
  }

  pub fn fail_index(&self) {
    self.shared.lock().index_fails = true;
  }

  pub fn collaborators(&self) -> Collaborators {
    Collaborators {
      recipes: Box::new(self.shared.clone()),
      index: Box::new(self.shared.clone()),
      listings: Box::new(self.shared.clone()),
      generator: Box::new(self.shared.clone()),
      git: Box::new(self.shared.clone()),
      forks: Some(Box::new(self.shared.clone())),
      rerenderer: Box::new(self.shared.clone()),
    }
  }

  pub fn orchestrator(&self) -> Orchestrator {
    Orchestrator::new(self.config.clone(), self.collaborators()).unwrap()
  }

  pub fn git_log(&self) -> Vec<String> {
    self.shared.lock().git_log.clone()
  }
}
