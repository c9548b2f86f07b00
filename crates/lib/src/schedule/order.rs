use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use petgraph::Direction;
use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::NodeIndex;
use thiserror::Error;

use super::graph::DependencyGraph;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
  /// The graph has a cycle. `cycle` starts and ends with the same package.
  #[error("dependency cycle: {}", cycle.join(" -> "))]
  CyclicDependency { cycle: Vec<String> },
}

/// Order packages so every dependency comes before its dependents.
pub fn topological_order(graph: &DependencyGraph) -> Result<Vec<String>, ScheduleError> {
  let sorted = toposort(&graph.graph, None).map_err(|_| cycle_error(graph))?;
  Ok(sorted.into_iter().map(|idx| graph.graph[idx].clone()).collect())
}

/// Group packages into waves that can be built in parallel.
///
/// Every package's dependencies are in earlier waves. Waves are sorted by name.
pub fn build_waves(graph: &DependencyGraph) -> Result<Vec<Vec<String>>, ScheduleError> {
  let g = &graph.graph;
  let mut in_degree: HashMap<NodeIndex, usize> = g
    .node_indices()
    .map(|idx| (idx, g.neighbors_directed(idx, Direction::Incoming).count()))
    .collect();
  let mut remaining: BTreeSet<NodeIndex> = g.node_indices().collect();
  let mut waves = Vec::new();

  while !remaining.is_empty() {
    let ready: Vec<NodeIndex> = remaining.iter().filter(|&&idx| in_degree[&idx] == 0).copied().collect();
    if ready.is_empty() {
      return Err(cycle_error(graph));
    }

    for idx in &ready {
      remaining.remove(idx);
      for dependent in g.neighbors_directed(*idx, Direction::Outgoing) {
        if let Some(degree) = in_degree.get_mut(&dependent) {
          *degree = degree.saturating_sub(1);
        }
      }
    }

    let mut wave: Vec<String> = ready.into_iter().map(|idx| g[idx].clone()).collect();
    wave.sort();
    waves.push(wave);
  }

  Ok(waves)
}

fn cycle_error(graph: &DependencyGraph) -> ScheduleError {
  ScheduleError::CyclicDependency {
    cycle: find_cycle(graph).unwrap_or_default(),
  }
}

/// Find one concrete cycle, starting from the smallest name in the first
/// strongly connected component that has one.
fn find_cycle(graph: &DependencyGraph) -> Option<Vec<String>> {
  let g = &graph.graph;
  let component = tarjan_scc(g)
    .into_iter()
    .filter(|scc| scc.len() > 1)
    .min_by(|a, b| smallest_name(graph, a).cmp(smallest_name(graph, b)))?;

  let members: BTreeSet<NodeIndex> = component.iter().copied().collect();
  let start = *component.iter().min_by_key(|idx| &g[**idx])?;

  // Shortest path from start back to itself, staying inside the component.
  let mut parent: BTreeMap<NodeIndex, NodeIndex> = BTreeMap::new();
  let mut queue = VecDeque::from([start]);
  while let Some(node) = queue.pop_front() {
    let mut successors: Vec<NodeIndex> = g
      .neighbors_directed(node, Direction::Outgoing)
      .filter(|n| members.contains(n))
      .collect();
    successors.sort_by(|a, b| g[*a].cmp(&g[*b]));

    for next in successors {
      if next == start {
        let mut path = vec![node];
        while let Some(&prev) = parent.get(path.last()?) {
          path.push(prev);
        }
        path.reverse();
        path.push(start);
        return Some(path.into_iter().map(|idx| g[idx].clone()).collect());
      }
      if !parent.contains_key(&next) {
        parent.insert(next, node);
        queue.push_back(next);
      }
    }
  }
  None
}

fn smallest_name<'a>(graph: &'a DependencyGraph, nodes: &[NodeIndex]) -> &'a str {
  nodes
    .iter()
    .map(|idx| graph.graph[*idx].as_str())
    .min()
    .unwrap_or_default()
}
