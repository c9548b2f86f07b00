//! feedstocks-lib: reconciliation and build ordering for a fleet of feedstocks
//!
//! This crate holds everything except the command line:
//! - `desired`: the target package versions for a run
//! - `requirement` / `recipe`: parsing dependency specs and recipe templates
//! - `sources`: the recipe, binary index and web listing adapters
//! - `schedule`: the dependency graph and the build order computed from it
//! - `reconcile`: classifying each package against the desired state
//! - `services`: git, GitHub, generator, builder and uploader collaborators
//! - `orchestrate`: sequencing the above for each user-facing action

pub mod config;
pub mod consts;
pub mod desired;
pub mod orchestrate;
pub mod paths;
pub mod recipe;
pub mod reconcile;
pub mod requirement;
pub mod schedule;
pub mod services;
pub mod sources;
