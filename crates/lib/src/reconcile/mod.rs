//! State reconciliation.
//!
//! Classifies every package of the desired state using three partially
//! stale views: the feedstock recipe, the binary index and the web listing.
//! Classification is pure: the same snapshot and index always produce the
//! same result.
//!
//! Two passes run over the batch. The first settles what each package's own
//! sources can decide (missing, stale, published). The second classifies
//! the remaining ambiguous packages against the first-pass results of their
//! in-batch dependencies.

mod snapshot;
mod types;

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use crate::desired::{DesiredState, Target};
use crate::recipe::{Recipe, is_helper_stub};
use crate::sources::ChannelIndex;

pub use snapshot::{ListingState, PackageSnapshot, RecipeState, Snapshot};
pub use types::{Classification, PackageReport, Reconciliation};

/// First-pass result: either settled, or ambiguous and waiting on its
/// dependencies.
enum FirstPass<'a> {
  Settled(Classification),
  /// Carries the recipe, or why its requirements could not be read.
  Ambiguous(Result<&'a Recipe, &'a str>),
}

/// Classify every desired package.
///
/// `runtime` names the language runtime, which is never a blocker and is
/// never looked up in the index.
pub fn reconcile(desired: &DesiredState, snapshot: &Snapshot, index: &ChannelIndex, runtime: &str) -> Reconciliation {
  let mut first: BTreeMap<&str, FirstPass<'_>> = BTreeMap::new();
  let mut conflicts: BTreeSet<&str> = BTreeSet::new();

  for target in desired.targets() {
    let (pass, conflict) = first_pass(target, snapshot.get(&target.name), index);
    if conflict {
      conflicts.insert(&target.name);
    }
    first.insert(&target.name, pass);
  }

  let reports: Vec<PackageReport> = desired
    .targets()
    .iter()
    .map(|target| {
      let classification = match &first[target.name.as_str()] {
        FirstPass::Settled(classification) => classification.clone(),
        FirstPass::Ambiguous(recipe) => second_pass(&target.name, *recipe, &first, index, runtime),
      };
      debug!(package = %target.name, state = classification.label(), "classified");
      PackageReport {
        package: target.name.clone(),
        version: target.version.clone(),
        classification,
        evidence_conflict: conflicts.contains(target.name.as_str()),
      }
    })
    .collect();

  let reconciliation = Reconciliation::new(reports);
  info!(
    packages = desired.len(),
    kickable = reconciliation.kickable().len(),
    missing = reconciliation.missing_recipes().len(),
    "reconciled"
  );
  reconciliation
}

fn first_pass<'a>(target: &Target, observed: Option<&'a PackageSnapshot>, index: &ChannelIndex) -> (FirstPass<'a>, bool) {
  let settled = |c| (FirstPass::Settled(c), false);

  let Some(observed) = observed else {
    return settled(Classification::Unresolved {
      reason: "package was not observed".to_string(),
    });
  };

  // Steps up to publication only need the declared version.
  let (version, recipe) = match &observed.recipe {
    RecipeState::Absent => return settled(Classification::MissingRecipe),
    RecipeState::Failed(reason) => return settled(Classification::Unresolved { reason: reason.clone() }),
    RecipeState::Present(recipe) => (recipe.version.as_str(), Ok(recipe)),
    RecipeState::Unreadable { version, reason } => (version.as_str(), Err(reason.as_str())),
  };

  if version != target.version {
    return settled(Classification::StaleRecipe {
      declared: version.to_string(),
    });
  }

  let listed = match &observed.listing {
    ListingState::Listed(listed) => *listed,
    ListingState::NotChecked => false,
    ListingState::Failed(reason) => return settled(Classification::Unresolved { reason: reason.clone() }),
  };
  let indexed = index.has_version(&target.name, &target.version);

  if listed && indexed {
    return settled(Classification::UpToDate);
  }
  // One source says published, the other does not: treat as unpublished.
  (FirstPass::Ambiguous(recipe), listed != indexed)
}

fn second_pass(
  package: &str,
  recipe: Result<&Recipe, &str>,
  first: &BTreeMap<&str, FirstPass<'_>>,
  index: &ChannelIndex,
  runtime: &str,
) -> Classification {
  let recipe = match recipe {
    Ok(recipe) => recipe,
    Err(reason) => {
      return Classification::Unresolved {
        reason: reason.to_string(),
      };
    }
  };
  let dependencies = match recipe.dependency_names() {
    Ok(names) => names,
    Err(e) => return Classification::Unresolved { reason: e.to_string() },
  };
  if dependencies.contains(package) {
    return Classification::Unresolved {
      reason: format!("package '{package}' depends on itself"),
    };
  }

  let relevant = dependencies
    .iter()
    .filter(|name| name.as_str() != runtime && !is_helper_stub(name));

  let blockers: Vec<String> = relevant
    .clone()
    .filter(|name| match first.get(name.as_str()) {
      Some(FirstPass::Settled(Classification::UpToDate)) | None => false,
      Some(_) => true,
    })
    .cloned()
    .collect();
  if !blockers.is_empty() {
    return Classification::BlockedByDependency { blockers };
  }

  let missing: Vec<String> = relevant.filter(|name| !index.contains_name(name)).cloned().collect();
  if !missing.is_empty() {
    return Classification::BlockedByIndexLag { missing };
  }

  Classification::PendingPublication
}
