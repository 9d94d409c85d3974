//! Scenario-based tests for buildgraph

#[path = "../helpers/mod.rs"]
mod helpers;

mod failure_handling;
mod ordering;
mod skip_propagation;
mod standard_build;
