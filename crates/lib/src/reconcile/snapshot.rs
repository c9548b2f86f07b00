//! Per-run observations of the version sources.

use std::collections::BTreeMap;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::desired::{DesiredState, Target};
use crate::recipe::Recipe;
use crate::requirement::extract_declared_version;
use crate::sources::{ListingSource, RecipeSource, is_listed};

/// What the recipe source said about a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipeState {
  Absent,
  Present(Recipe),
  /// The version directive was read but the requirements could not be.
  Unreadable { version: String, reason: String },
  /// Transport failure, or a recipe without a readable version.
  Failed(String),
}

impl RecipeState {
  /// Version the recipe declares, if it could be read.
  pub fn declared_version(&self) -> Option<&str> {
    match self {
      RecipeState::Present(recipe) => Some(&recipe.version),
      RecipeState::Unreadable { version, .. } => Some(version),
      RecipeState::Absent | RecipeState::Failed(_) => None,
    }
  }
}

/// What the web listing said about a package's desired version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingState {
  /// Only checked when the recipe is current.
  NotChecked,
  Listed(bool),
  Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSnapshot {
  pub recipe: RecipeState,
  pub listing: ListingState,
}

/// Observations for every package of a run, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
  packages: BTreeMap<String, PackageSnapshot>,
}

impl Snapshot {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, package: impl Into<String>, observed: PackageSnapshot) {
    self.packages.insert(package.into(), observed);
  }

  pub fn get(&self, package: &str) -> Option<&PackageSnapshot> {
    self.packages.get(package)
  }

  pub fn len(&self) -> usize {
    self.packages.len()
  }

  pub fn is_empty(&self) -> bool {
    self.packages.is_empty()
  }

  /// Observe every desired package on the current rayon pool.
  ///
  /// A failure for one package is recorded in its entry and never affects
  /// the others.
  pub fn gather(desired: &DesiredState, recipes: &dyn RecipeSource, listings: &dyn ListingSource) -> Self {
    let packages = desired
      .targets()
      .par_iter()
      .map(|target| (target.name.clone(), observe(target, recipes, listings)))
      .collect();
    Self { packages }
  }
}

fn observe(target: &Target, recipes: &dyn RecipeSource, listings: &dyn ListingSource) -> PackageSnapshot {
  let package = target.name.as_str();

  let recipe = match recipes.fetch_recipe(package) {
    Ok(None) => RecipeState::Absent,
    Ok(Some(text)) => match Recipe::parse(&text) {
      Ok(recipe) => RecipeState::Present(recipe),
      Err(e) => {
        warn!(package, error = %e, "unusable recipe");
        let reason = format!("invalid recipe: {e}");
        match extract_declared_version(&text) {
          Ok(version) => RecipeState::Unreadable { version, reason },
          Err(_) => RecipeState::Failed(reason),
        }
      }
    },
    Err(e) => {
      warn!(package, error = %e, "failed to fetch recipe");
      RecipeState::Failed(e.to_string())
    }
  };

  let listing = if recipe.declared_version() == Some(target.version.as_str()) {
    match listings.fetch_listing(package) {
      Ok(page) => ListingState::Listed(is_listed(&page, package, &target.version)),
      Err(e) => {
        warn!(package, error = %e, "failed to fetch listing");
        ListingState::Failed(e.to_string())
      }
    }
  } else {
    ListingState::NotChecked
  };

  debug!(package, ?listing, "observed package");
  PackageSnapshot { recipe, listing }
}
