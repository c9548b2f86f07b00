use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use super::{OrchestrateError, Orchestrator};
use crate::consts::{MAX_BRANCH_NAME_LEN, STAGED_RECIPES_REPO, UPSTREAM_CHECKOUTS_DIRNAME};
use crate::reconcile::Classification;
use crate::services::process::run_shell;

#[derive(Debug, Clone, Serialize)]
pub struct CreateOutcome {
  pub branch: String,
  pub packages: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateOutcome {
  pub package: String,
  pub version: String,
  pub branch: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct KickReport {
  /// Packages that got (or, in a dry run, would get) a rebuild commit.
  pub kicked: Vec<String>,
  pub failed: Vec<(String, String)>,
  /// Named packages that are not pending publication.
  pub not_kickable: Vec<(String, Classification)>,
  pub dry_run: bool,
}

/// `add-a-b`, or `add-<n>-packages` when that gets too long.
pub fn staged_branch_name(packages: &[&str]) -> String {
  let name = format!("add-{}", packages.join("-"));
  if name.len() > MAX_BRANCH_NAME_LEN {
    format!("add-{}-packages", packages.len())
  } else {
    name
  }
}

impl Orchestrator {
  /// Submit recipes for packages that have no feedstock yet.
  ///
  /// Recipes are generated into the user's `staged-recipes` fork on a fresh
  /// branch off upstream, committed and force-pushed. Fails before touching
  /// any repository if one of the packages already has a feedstock.
  pub fn create(&self, packages: &[String], branch: Option<&str>) -> Result<CreateOutcome, OrchestrateError> {
    let selected = self.select(packages)?;
    let names: Vec<&str> = selected.names().collect();

    for name in &names {
      let existing = self
        .services
        .recipes
        .fetch_recipe(name)
        .map_err(|source| OrchestrateError::Source {
          package: name.to_string(),
          source,
        })?;
      if existing.is_some() {
        return Err(OrchestrateError::FeedstockExists(name.to_string()));
      }
    }
    if names.is_empty() {
      info!("no packages to create");
      return Ok(CreateOutcome {
        branch: String::new(),
        packages: Vec::new(),
      });
    }

    let repo = self.prepare_fork(STAGED_RECIPES_REPO)?;
    let branch = branch.map(str::to_string).unwrap_or_else(|| staged_branch_name(&names));
    let start = format!("upstream/{}", self.config.default_branch);
    self.services.git.reset_branch(&repo, &branch, &start)?;

    let recipes_dir = repo.join("recipes");
    let known: BTreeSet<String> = self.desired.names().map(str::to_string).collect();
    for target in selected.targets() {
      info!(package = %target.name, version = %target.version, "creating recipe");
      let dest = recipes_dir.join(self.recipe_dirname(&target.name));
      self.services.generator.generate(&target.name, &target.version, &dest)?;
      self.apply_transform(&dest, &known)?;
    }

    self.services.git.add(&repo, &[recipes_dir.as_path()])?;
    self.services.git.commit(&repo, &format!("Add {}", names.join(", ")), false)?;
    self.services.git.push(&repo, "origin", &branch, true)?;

    Ok(CreateOutcome {
      branch,
      packages: names.iter().map(|n| n.to_string()).collect(),
    })
  }

  /// Regenerate an existing feedstock's recipe at the desired version.
  pub fn update(&self, package: &str, branch: Option<&str>) -> Result<UpdateOutcome, OrchestrateError> {
    let version = self
      .desired
      .version_of(package)
      .ok_or_else(|| OrchestrateError::UnknownPackage(package.to_string()))?
      .to_string();

    let repo = self.prepare_fork(&format!("{package}-feedstock"))?;
    let branch = branch
      .map(str::to_string)
      .unwrap_or_else(|| format!("upgrade-to-{version}"));
    let start = format!("upstream/{}", self.config.default_branch);
    info!(package, version = %version, branch = %branch, "creating upgrade branch");
    self.services.git.reset_branch(&repo, &branch, &start)?;

    let recipe_dir = repo.join("recipe");
    self.services.generator.generate(package, &version, &recipe_dir)?;
    let known: BTreeSet<String> = self.desired.names().map(str::to_string).collect();
    self.apply_transform(&recipe_dir, &known)?;
    self.services.rerenderer.rerender(&repo)?;

    let message = format!("{package}@{version} ({})", self.services.generator.describe());
    self.services.git.add(&repo, &[recipe_dir.as_path()])?;
    self.services.git.commit(&repo, &message, false)?;
    self.services.git.push(&repo, "origin", &branch, true)?;

    Ok(UpdateOutcome {
      package: package.to_string(),
      version,
      branch,
    })
  }

  /// Push an empty commit to every feedstock pending publication.
  ///
  /// With `packages` empty every kickable package is considered. A failure
  /// for one feedstock is recorded and the rest are still kicked.
  pub fn kick(&self, packages: &[String], dry_run: bool) -> Result<KickReport, OrchestrateError> {
    if let Some(unknown) = packages.iter().find(|p| !self.desired.contains(p)) {
      return Err(OrchestrateError::UnknownPackage(unknown.clone()));
    }
    // The whole batch is reconciled so blockers are judged consistently.
    let reconciliation = self.status()?;

    let mut report = KickReport {
      dry_run,
      ..KickReport::default()
    };
    for entry in reconciliation.reports() {
      if !packages.is_empty() && !packages.contains(&entry.package) {
        continue;
      }
      if !entry.classification.is_kickable() {
        if !packages.is_empty() {
          report
            .not_kickable
            .push((entry.package.clone(), entry.classification.clone()));
        }
        continue;
      }
      if dry_run {
        report.kicked.push(entry.package.clone());
        continue;
      }
      match self.kick_one(&entry.package, &entry.version) {
        Ok(()) => report.kicked.push(entry.package.clone()),
        Err(e) => {
          warn!(package = %entry.package, error = %e, "kick failed");
          report.failed.push((entry.package.clone(), e.to_string()));
        }
      }
    }
    Ok(report)
  }

  fn kick_one(&self, package: &str, version: &str) -> Result<(), OrchestrateError> {
    let repo_name = format!("{package}-feedstock");
    // Fork clones live directly under the workdir and push to the fork.
    let path = self.config.workdir.join(UPSTREAM_CHECKOUTS_DIRNAME).join(&repo_name);
    let url = self.config.upstream_repo_url(&repo_name);
    self.ensure_cloned(&path, &url, None)?;

    let branch = &self.config.default_branch;
    self.services.git.fetch(&path, "origin")?;
    self.services.git.reset_branch(&path, branch, &format!("origin/{branch}"))?;
    self
      .services
      .git
      .commit(&path, &format!("Trigger rebuild of {package} {version}"), true)?;
    self.services.git.push(&path, "origin", branch, false)?;
    info!(package, version, "kicked");
    Ok(())
  }

  /// Make sure the user's fork of `repo` exists and is cloned with an
  /// up-to-date `upstream` remote. Returns the clone's path.
  fn prepare_fork(&self, repo: &str) -> Result<PathBuf, OrchestrateError> {
    let user = self.github_user()?;
    if let Some(forks) = &self.services.forks {
      forks.ensure_fork(user, &self.config.upstream_owner, repo)?;
    }

    let path = self.config.workdir.join(repo);
    let upstream = self.config.upstream_repo_url(repo);
    self.ensure_cloned(&path, &self.config.fork_url(user, repo), Some(&upstream))?;
    self.services.git.fetch(&path, "upstream")?;
    Ok(path)
  }

  /// Clone once; later runs reuse the existing checkout.
  fn ensure_cloned(&self, path: &Path, url: &str, upstream: Option<&str>) -> Result<(), OrchestrateError> {
    if path.is_dir() {
      return Ok(());
    }
    self.services.git.clone_repo(url, path)?;
    if let Some(upstream) = upstream {
      self.services.git.add_remote(path, "upstream", upstream)?;
    }
    if let Some(steps) = &self.config.after_clone {
      info!(path = %path.display(), "running after_clone steps");
      run_shell(steps, path)?;
    }
    Ok(())
  }
}
