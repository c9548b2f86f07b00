use std::collections::{BTreeMap, BTreeSet};

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use thiserror::Error;
use tracing::debug;

use crate::requirement::{RequirementError, extract_package_name};

/// Errors raised while building a dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
  /// A package lists itself as a requirement.
  #[error("package '{0}' depends on itself")]
  SelfDependency(String),

  /// One of the package's specs could not be parsed.
  #[error("invalid requirement in '{package}': {source}")]
  Requirement {
    package: String,
    #[source]
    source: RequirementError,
  },
}

impl GraphError {
  /// The package the error belongs to.
  pub fn package(&self) -> &str {
    match self {
      GraphError::SelfDependency(package) | GraphError::Requirement { package, .. } => package,
    }
  }
}

/// Directed graph with an edge `dependency -> dependent` for every
/// in-batch requirement.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
  pub(super) graph: DiGraph<String, ()>,
  nodes: BTreeMap<String, NodeIndex>,
}

impl DependencyGraph {
  pub fn node_count(&self) -> usize {
    self.graph.node_count()
  }

  pub fn edge_count(&self) -> usize {
    self.graph.edge_count()
  }

  /// Package names in sorted order.
  pub fn packages(&self) -> impl Iterator<Item = &str> {
    self.nodes.keys().map(String::as_str)
  }

  pub fn contains(&self, package: &str) -> bool {
    self.nodes.contains_key(package)
  }

  /// Whether `dependent` directly requires `dependency`.
  pub fn has_edge(&self, dependency: &str, dependent: &str) -> bool {
    match (self.nodes.get(dependency), self.nodes.get(dependent)) {
      (Some(&from), Some(&to)) => self.graph.contains_edge(from, to),
      _ => false,
    }
  }

  /// Direct in-batch dependencies of a package, sorted.
  pub fn dependencies(&self, package: &str) -> Vec<&str> {
    self.neighbors(package, Direction::Incoming)
  }

  /// Packages that directly require `package`, sorted.
  pub fn dependents(&self, package: &str) -> Vec<&str> {
    self.neighbors(package, Direction::Outgoing)
  }

  fn neighbors(&self, package: &str, direction: Direction) -> Vec<&str> {
    let Some(&idx) = self.nodes.get(package) else {
      return Vec::new();
    };
    let mut names: Vec<&str> = self
      .graph
      .neighbors_directed(idx, direction)
      .map(|n| self.graph[n].as_str())
      .collect();
    names.sort_unstable();
    names
  }

  fn add_edge(&mut self, dependency: &str, dependent: &str) {
    let from = self.nodes[dependency];
    let to = self.nodes[dependent];
    self.graph.update_edge(from, to, ());
  }
}

/// Build the dependency graph for a working set.
///
/// `requirements` maps each package to its requirement specs from every
/// section. Packages without an entry are isolated nodes.
pub fn build_graph(
  working_set: &BTreeSet<String>,
  requirements: &BTreeMap<String, Vec<String>>,
) -> Result<DependencyGraph, GraphError> {
  let mut dag = DependencyGraph::default();

  for package in working_set {
    let idx = dag.graph.add_node(package.clone());
    dag.nodes.insert(package.clone(), idx);
  }

  for package in working_set {
    let Some(specs) = requirements.get(package) else {
      continue;
    };

    for spec in specs {
      let name = extract_package_name(spec).map_err(|source| GraphError::Requirement {
        package: package.clone(),
        source,
      })?;

      if name == package {
        return Err(GraphError::SelfDependency(package.clone()));
      }
      if working_set.contains(name) {
        dag.add_edge(name, package);
      }
    }
  }

  debug!(
    packages = dag.node_count(),
    edges = dag.edge_count(),
    "built dependency graph"
  );
  Ok(dag)
}
