//! Reconciliation outcome types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a package stands against its desired version.
///
/// Assigned once per run; a package never changes classification mid-run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Classification {
  /// Recipe is current and the artifact is published.
  UpToDate,
  /// No recipe exists upstream.
  MissingRecipe,
  /// The recipe declares a different version.
  StaleRecipe { declared: String },
  /// Recipe is current, dependencies are available, artifact is missing.
  PendingPublication,
  /// An in-batch dependency is not settled yet.
  BlockedByDependency { blockers: Vec<String> },
  /// A dependency has no artifact in the index at all.
  BlockedByIndexLag { missing: Vec<String> },
  /// The package's state could not be determined.
  Unresolved { reason: String },
}

impl Classification {
  /// Short machine-friendly name.
  pub fn label(&self) -> &'static str {
    match self {
      Classification::UpToDate => "up-to-date",
      Classification::MissingRecipe => "missing-recipe",
      Classification::StaleRecipe { .. } => "stale-recipe",
      Classification::PendingPublication => "pending-publication",
      Classification::BlockedByDependency { .. } => "blocked-by-dependency",
      Classification::BlockedByIndexLag { .. } => "blocked-by-index-lag",
      Classification::Unresolved { .. } => "unresolved",
    }
  }

  /// Only pending packages may be re-triggered.
  pub fn is_kickable(&self) -> bool {
    matches!(self, Classification::PendingPublication)
  }
}

impl fmt::Display for Classification {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Classification::UpToDate => write!(f, "up to date"),
      Classification::MissingRecipe => write!(f, "missing recipe"),
      Classification::StaleRecipe { declared } => write!(f, "stale recipe (declares {declared})"),
      Classification::PendingPublication => write!(f, "pending publication"),
      Classification::BlockedByDependency { blockers } => {
        write!(f, "blocked by dependency: {}", blockers.join(", "))
      }
      Classification::BlockedByIndexLag { missing } => write!(f, "blocked by index lag: {}", missing.join(", ")),
      Classification::Unresolved { reason } => write!(f, "unresolved: {reason}"),
    }
  }
}

/// The outcome for one package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageReport {
  pub package: String,
  pub version: String,
  #[serde(flatten)]
  pub classification: Classification,
  /// The index and the listing disagreed about publication.
  #[serde(default, skip_serializing_if = "std::ops::Not::not")]
  pub evidence_conflict: bool,
}

/// Reports for every package of a run, in desired order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reconciliation {
  reports: Vec<PackageReport>,
}

impl Reconciliation {
  pub(super) fn new(reports: Vec<PackageReport>) -> Self {
    Self { reports }
  }

  pub fn reports(&self) -> &[PackageReport] {
    &self.reports
  }

  pub fn get(&self, package: &str) -> Option<&PackageReport> {
    self.reports.iter().find(|r| r.package == package)
  }

  pub fn classification(&self, package: &str) -> Option<&Classification> {
    self.get(package).map(|r| &r.classification)
  }

  /// Packages with no recipe upstream.
  pub fn missing_recipes(&self) -> Vec<&str> {
    self.names_where(|c| matches!(c, Classification::MissingRecipe))
  }

  /// Packages eligible for a rebuild trigger.
  pub fn kickable(&self) -> Vec<&PackageReport> {
    self.reports.iter().filter(|r| r.classification.is_kickable()).collect()
  }

  fn names_where(&self, pred: impl Fn(&Classification) -> bool) -> Vec<&str> {
    self
      .reports
      .iter()
      .filter(|r| pred(&r.classification))
      .map(|r| r.package.as_str())
      .collect()
  }
}
