//! Dependency graph and build scheduling.
//!
//! The graph covers only the working set: requirements naming packages
//! outside the batch are dropped. Scheduling is pure and deterministic.

mod graph;
mod order;

pub use graph::{DependencyGraph, GraphError, build_graph};
pub use order::{ScheduleError, build_waves, topological_order};
