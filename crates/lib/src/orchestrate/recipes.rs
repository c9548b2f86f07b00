use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use super::{OrchestrateError, Orchestrator};
use crate::consts::{BUILD_DIRNAME, RECIPE_FILENAME};
use crate::recipe::{Recipe, package_name};
use crate::schedule::{build_graph, build_waves, topological_order};
use crate::services::{Builder, Uploader, collect_artifacts};

#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerateReport {
  pub generated: Vec<(String, PathBuf)>,
  pub failed: Vec<(String, String)>,
}

/// A recipe directory found in a recipes directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedRecipe {
  /// Rendered `package.name`.
  pub name: String,
  pub version: String,
  pub dir: PathBuf,
}

/// Recipes in build order, plus the waves that could build in parallel.
#[derive(Debug, Clone, Serialize)]
pub struct BuildPlan {
  pub recipes: Vec<PlannedRecipe>,
  pub waves: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildReport {
  pub built: Vec<String>,
  /// The package whose build stopped the run, with the error.
  pub failed: Option<(String, String)>,
  /// Packages never attempted because an earlier build failed.
  pub skipped: Vec<String>,
}

impl BuildReport {
  pub fn success(&self) -> bool {
    self.failed.is_none()
  }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PublishReport {
  pub uploaded: Vec<String>,
  pub failed: Vec<(String, String)>,
}

impl Orchestrator {
  /// Generate recipes into `{dir}/{prefix}{package}`.
  ///
  /// The generated batch is the known-package set for the transform. A
  /// generator failure is recorded and the remaining packages still run.
  pub fn generate(&self, dir: &Path, packages: &[String]) -> Result<GenerateReport, OrchestrateError> {
    let selected = self.select(packages)?;
    std::fs::create_dir_all(dir).map_err(OrchestrateError::io(dir))?;
    let known: BTreeSet<String> = selected.names().map(str::to_string).collect();

    let mut report = GenerateReport::default();
    for target in selected.targets() {
      let dest = dir.join(self.recipe_dirname(&target.name));
      let result = self
        .services
        .generator
        .generate(&target.name, &target.version, &dest)
        .map_err(OrchestrateError::from)
        .and_then(|()| self.apply_transform(&dest, &known));

      match result {
        Ok(()) => {
          info!(package = %target.name, dest = %dest.display(), "generated recipe");
          report.generated.push((target.name.clone(), dest));
        }
        Err(e) => {
          warn!(package = %target.name, error = %e, "failed to generate recipe");
          report.failed.push((target.name.clone(), e.to_string()));
        }
      }
    }
    Ok(report)
  }

  /// Read every recipe under `dir` and compute the build order.
  pub fn plan(&self, dir: &Path) -> Result<BuildPlan, OrchestrateError> {
    let recipes = read_recipes(dir)?;

    let working_set: BTreeSet<String> = recipes.keys().cloned().collect();
    let requirements: BTreeMap<String, Vec<String>> = recipes
      .iter()
      .map(|(name, (_, recipe))| (name.clone(), recipe.specs().map(str::to_string).collect()))
      .collect();

    let graph = build_graph(&working_set, &requirements)?;
    let order = topological_order(&graph)?;
    let waves = build_waves(&graph)?;

    let mut recipes = recipes;
    let planned = order
      .into_iter()
      .filter_map(|name| {
        recipes.remove(&name).map(|(dir, recipe)| PlannedRecipe {
          name,
          version: recipe.version,
          dir,
        })
      })
      .collect();

    Ok(BuildPlan {
      recipes: planned,
      waves,
    })
  }

  /// Build every recipe under `dir` in dependency order into `{dir}/build`.
  ///
  /// The first failing build stops the run.
  pub fn build(&self, dir: &Path, builder: &dyn Builder) -> Result<BuildReport, OrchestrateError> {
    let plan = self.plan(dir)?;
    let output = dir.join(BUILD_DIRNAME);
    std::fs::create_dir_all(&output).map_err(OrchestrateError::io(&output))?;

    let mut report = BuildReport::default();
    let mut recipes = plan.recipes.into_iter();
    for recipe in recipes.by_ref() {
      match builder.build(&recipe.dir, &output) {
        Ok(()) => {
          info!(package = %recipe.name, "built");
          report.built.push(recipe.name);
        }
        Err(e) => {
          warn!(package = %recipe.name, error = %e, "build failed");
          report.failed = Some((recipe.name, e.to_string()));
          break;
        }
      }
    }
    report.skipped = recipes.map(|r| r.name).collect();
    Ok(report)
  }

  /// Upload every artifact under `{dir}/build`.
  pub fn publish(&self, dir: &Path, uploader: &dyn Uploader) -> Result<PublishReport, OrchestrateError> {
    let artifacts = collect_artifacts(&dir.join(BUILD_DIRNAME))?;
    let mut report = PublishReport::default();
    for artifact in &artifacts {
      match uploader.upload(artifact) {
        Ok(url) => report.uploaded.push(url),
        Err(e) => {
          warn!(file = %artifact.path.display(), error = %e, "upload failed");
          report.failed.push((artifact.file_name(), e.to_string()));
        }
      }
    }
    Ok(report)
  }
}

/// Recipes keyed by rendered package name, skipping the build output folder.
fn read_recipes(dir: &Path) -> Result<BTreeMap<String, (PathBuf, Recipe)>, OrchestrateError> {
  let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
    .map_err(OrchestrateError::io(dir))?
    .filter_map(Result::ok)
    .map(|entry| entry.path())
    .filter(|path| path.is_dir() && path.join(RECIPE_FILENAME).is_file())
    .filter(|path| path.file_name().is_none_or(|name| name != BUILD_DIRNAME))
    .collect();
  entries.sort();

  let mut recipes = BTreeMap::new();
  for path in entries {
    let recipe = Recipe::from_dir(&path).map_err(|source| OrchestrateError::Recipe {
      path: path.clone(),
      source,
    })?;
    let name = package_name(&recipe.text).map_err(|source| OrchestrateError::Recipe {
      path: path.clone(),
      source,
    })?;
    if recipes.contains_key(&name) {
      return Err(OrchestrateError::DuplicateRecipe(name));
    }
    recipes.insert(name, (path, recipe));
  }
  Ok(recipes)
}

#[cfg(test)]
mod tests {
  use std::fs;

  use tempfile::TempDir;

  use super::super::fakes::*;
  use super::*;
  use crate::schedule::ScheduleError;

  fn write_recipe(dir: &Path, folder: &str, name: &str, run: &[&str]) {
    let path = dir.join(folder);
    fs::create_dir_all(&path).unwrap();
    fs::write(path.join(RECIPE_FILENAME), recipe_text(name, "1.0", run)).unwrap();
  }

  fn chain(dir: &Path) {
    write_recipe(dir, "fx-z", "fx-z", &["fx-y"]);
    write_recipe(dir, "fx-y", "fx-y", &["fx-x >=1.0", "numpy"]);
    write_recipe(dir, "fx-x", "fx-x", &[]);
    // Stale output from an earlier build is never a recipe.
    write_recipe(dir, BUILD_DIRNAME, "fx-x", &[]);
  }

  #[test]
  fn generate_with_prefix() {
    let fixture = Fixture::new(&["a@1.0", "b@2.0", "c@1.0"]);
    fixture.recipe("c", "1.0", &[]);
    fixture
      .shared
      .lock()
      .generated_requirements
      .insert("b".to_string(), vec!["a >=1.0".to_string(), "c".to_string()]);
    let out = TempDir::new().unwrap();

    let report = fixture
      .orchestrator()
      .with_prefix(Some("fx-".to_string()))
      .generate(out.path(), &[])
      .unwrap();

    let names: Vec<_> = report.generated.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
    let recipe = fs::read_to_string(out.path().join("fx-b").join(RECIPE_FILENAME)).unwrap();
    assert!(recipe.contains("  name: fx-b\n"));
    assert!(recipe.contains("    - fx-a >=1.0\n"));
    // c was not part of the generated batch.
    assert!(recipe.contains("    - c\n"));
  }

  #[test]
  fn generate_continues_after_failure() {
    let fixture = Fixture::new(&["a@1.0", "b@1.0"]);
    fixture.shared.lock().generator_fails.insert("a".to_string());
    let out = TempDir::new().unwrap();

    let report = fixture.orchestrator().generate(out.path(), &[]).unwrap();
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "a");
    assert_eq!(report.generated.len(), 1);
    assert!(out.path().join("b").join(RECIPE_FILENAME).exists());
  }

  #[test]
  fn plan_orders_by_dependencies() {
    let fixture = Fixture::new(&[]);
    let dir = TempDir::new().unwrap();
    chain(dir.path());

    let plan = fixture.orchestrator().plan(dir.path()).unwrap();
    let order: Vec<_> = plan.recipes.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(order, vec!["fx-x", "fx-y", "fx-z"]);
    assert_eq!(plan.waves, vec![vec!["fx-x"], vec!["fx-y"], vec!["fx-z"]]);
    assert_eq!(plan.recipes[0].dir, dir.path().join("fx-x"));
  }

  #[test]
  fn plan_rejects_cycles() {
    let fixture = Fixture::new(&[]);
    let dir = TempDir::new().unwrap();
    write_recipe(dir.path(), "p", "p", &["q"]);
    write_recipe(dir.path(), "q", "q", &["p"]);

    let err = fixture.orchestrator().plan(dir.path()).unwrap_err();
    assert!(matches!(err, OrchestrateError::Schedule(ScheduleError::CyclicDependency { .. })));
  }

  #[test]
  fn plan_rejects_duplicate_names() {
    let fixture = Fixture::new(&[]);
    let dir = TempDir::new().unwrap();
    write_recipe(dir.path(), "one", "same", &[]);
    write_recipe(dir.path(), "two", "same", &[]);

    assert!(matches!(
      fixture.orchestrator().plan(dir.path()),
      Err(OrchestrateError::DuplicateRecipe(ref n)) if n == "same"
    ));
  }

  #[test]
  fn build_stops_at_first_failure() {
    let fixture = Fixture::new(&[]);
    let dir = TempDir::new().unwrap();
    chain(dir.path());
    fixture.shared.lock().build_fails.insert("fx-y".to_string());

    let report = fixture.orchestrator().build(dir.path(), &fixture.shared).unwrap();
    assert!(!report.success());
    assert_eq!(report.built, vec!["fx-x"]);
    assert_eq!(report.failed.as_ref().unwrap().0, "fx-y");
    assert_eq!(report.skipped, vec!["fx-z"]);
    assert_eq!(fixture.shared.lock().built.len(), 2);
  }

  #[test]
  fn build_all() {
    let fixture = Fixture::new(&[]);
    let dir = TempDir::new().unwrap();
    chain(dir.path());

    let report = fixture.orchestrator().build(dir.path(), &fixture.shared).unwrap();
    assert!(report.success());
    assert_eq!(report.built, vec!["fx-x", "fx-y", "fx-z"]);
    assert!(dir.path().join(BUILD_DIRNAME).is_dir());
  }

  #[test]
  fn publish_uploads_every_artifact() {
    let fixture = Fixture::new(&[]);
    let dir = TempDir::new().unwrap();
    let noarch = dir.path().join(BUILD_DIRNAME).join("noarch");
    fs::create_dir_all(&noarch).unwrap();
    fs::write(noarch.join("fx-x-1.0-pyh_0.conda"), "x").unwrap();
    fs::write(noarch.join("bad-1.0-pyh_0.tar.bz2"), "x").unwrap();
    fs::write(noarch.join("repodata.json"), "{}").unwrap();

    let report = fixture.orchestrator().publish(dir.path(), &fixture.shared).unwrap();
    assert_eq!(report.uploaded, vec!["http://upload/noarch/fx-x-1.0-pyh_0.conda"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "bad-1.0-pyh_0.tar.bz2");
  }
}
