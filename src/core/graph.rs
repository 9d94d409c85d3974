//! Target graph - registration and validation

use crate::core::target::TargetDefinition;
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use thiserror::Error;

/// Kind of relation one target declares on another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    DependsOn,
    Before,
    After,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Relation::DependsOn => "depends on",
            Relation::Before => "before",
            Relation::After => "after",
        };
        f.write_str(s)
    }
}

/// Errors detected while registering targets, before anything runs
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("Target '{0}' is registered more than once")]
    DuplicateTarget(String),

    #[error("Target '{target}' references unknown target '{reference}' ({relation})")]
    UnknownTargetReference {
        target: String,
        reference: String,
        relation: Relation,
    },

    #[error("Target '{target}' references itself ({relation})")]
    SelfReference { target: String, relation: Relation },

    #[error("Cyclic dependency: {}", .0.join(" -> "))]
    CyclicDependency(Vec<String>),

    #[error("Default target '{0}' is not registered")]
    UnknownDefaultTarget(String),
}

/// A soft ordering edge: `first` must precede `then` when both are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct OrderingEdge {
    pub first: usize,
    pub then: usize,
    /// Which declaration produced the edge
    pub relation: Relation,
}

/// Validated, immutable graph of targets
///
/// Targets keep their registration order, which the scheduler uses for
/// tie-breaking.
#[derive(Debug, Clone)]
pub struct TargetGraph {
    targets: Vec<TargetDefinition>,
    index: HashMap<String, usize>,
    dependencies: Vec<Vec<usize>>,
    dependents: Vec<Vec<usize>>,
    ordering: Vec<OrderingEdge>,
    default_target: Option<String>,
}

impl TargetGraph {
    /// Register a set of target definitions and validate the result
    pub fn register<I>(definitions: I) -> Result<Self, GraphError>
    where
        I: IntoIterator<Item = TargetDefinition>,
    {
        let targets: Vec<TargetDefinition> = definitions.into_iter().collect();

        let mut index = HashMap::with_capacity(targets.len());
        for (i, target) in targets.iter().enumerate() {
            if index.insert(target.name.clone(), i).is_some() {
                return Err(GraphError::DuplicateTarget(target.name.clone()));
            }
        }

        let lookup = |target: &TargetDefinition, reference: &str, relation: Relation| {
            if reference == target.name {
                return Err(GraphError::SelfReference {
                    target: target.name.clone(),
                    relation,
                });
            }
            index
                .get(reference)
                .copied()
                .ok_or_else(|| GraphError::UnknownTargetReference {
                    target: target.name.clone(),
                    reference: reference.to_string(),
                    relation,
                })
        };

        let mut dependencies = vec![Vec::new(); targets.len()];
        let mut dependents = vec![Vec::new(); targets.len()];
        let mut ordering = Vec::new();

        for (i, target) in targets.iter().enumerate() {
            for dep in &target.depends_on {
                let j = lookup(target, dep, Relation::DependsOn)?;
                dependencies[i].push(j);
                dependents[j].push(i);
            }
            for successor in &target.before {
                let j = lookup(target, successor, Relation::Before)?;
                ordering.push(OrderingEdge {
                    first: i,
                    then: j,
                    relation: Relation::Before,
                });
            }
            for predecessor in &target.after {
                let j = lookup(target, predecessor, Relation::After)?;
                ordering.push(OrderingEdge {
                    first: j,
                    then: i,
                    relation: Relation::After,
                });
            }
        }

        if let Some(cycle) = find_dependency_cycle(&targets, &dependencies) {
            return Err(GraphError::CyclicDependency(cycle));
        }

        Ok(Self {
            targets,
            index,
            dependencies,
            dependents,
            ordering,
            default_target: None,
        })
    }

    /// Set the target used when a run requests no goals
    pub fn with_default_target(mut self, name: &str) -> Result<Self, GraphError> {
        if !self.index.contains_key(name) {
            return Err(GraphError::UnknownDefaultTarget(name.to_string()));
        }
        self.default_target = Some(name.to_string());
        Ok(self)
    }

    pub fn default_target(&self) -> Option<&str> {
        self.default_target.as_deref()
    }

    /// Look up a target by name
    pub fn target(&self, name: &str) -> Option<&TargetDefinition> {
        self.index.get(name).map(|&i| &self.targets[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// All targets in registration order
    pub fn targets(&self) -> impl Iterator<Item = &TargetDefinition> {
        self.targets.iter()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Direct hard dependencies of a target
    pub fn dependencies_of(&self, name: &str) -> Vec<&str> {
        self.names_at(self.index.get(name).map(|&i| self.dependencies[i].as_slice()))
    }

    /// Targets that declare a hard dependency on the given target
    pub fn dependents_of(&self, name: &str) -> Vec<&str> {
        self.names_at(self.index.get(name).map(|&i| self.dependents[i].as_slice()))
    }

    /// Every target that depends on `name`, directly or transitively
    pub fn transitive_dependents(&self, name: &str) -> Vec<&str> {
        let Some(&start) = self.index.get(name) else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([start]);
        let mut result = Vec::new();

        while let Some(i) = queue.pop_front() {
            for &dependent in &self.dependents[i] {
                if seen.insert(dependent) {
                    result.push(self.targets[dependent].name.as_str());
                    queue.push_back(dependent);
                }
            }
        }

        result
    }

    /// Soft ordering pairs `(first, then)` with the relation that declared them
    pub fn ordering_constraints(&self) -> impl Iterator<Item = (&str, &str, Relation)> {
        self.ordering.iter().map(|edge| {
            (
                self.targets[edge.first].name.as_str(),
                self.targets[edge.then].name.as_str(),
                edge.relation,
            )
        })
    }

    pub(crate) fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub(crate) fn name_at(&self, i: usize) -> &str {
        &self.targets[i].name
    }

    pub(crate) fn dependency_indices(&self, i: usize) -> &[usize] {
        &self.dependencies[i]
    }

    pub(crate) fn ordering_edges(&self) -> &[OrderingEdge] {
        &self.ordering
    }

    fn names_at(&self, indices: Option<&[usize]>) -> Vec<&str> {
        indices
            .unwrap_or(&[])
            .iter()
            .map(|&i| self.targets[i].name.as_str())
            .collect()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

/// Depth-first search over hard dependencies with a recursion stack.
/// Returns the cycle path (first member repeated at the end) if one exists.
fn find_dependency_cycle(
    targets: &[TargetDefinition],
    dependencies: &[Vec<usize>],
) -> Option<Vec<String>> {
    let mut marks = vec![Mark::Unvisited; targets.len()];
    let mut stack = Vec::new();

    for start in 0..targets.len() {
        if marks[start] == Mark::Unvisited {
            if let Some(cycle) = visit(start, targets, dependencies, &mut marks, &mut stack) {
                return Some(cycle);
            }
        }
    }

    None
}

fn visit(
    i: usize,
    targets: &[TargetDefinition],
    dependencies: &[Vec<usize>],
    marks: &mut [Mark],
    stack: &mut Vec<usize>,
) -> Option<Vec<String>> {
    marks[i] = Mark::OnStack;
    stack.push(i);

    for &dep in &dependencies[i] {
        match marks[dep] {
            Mark::OnStack => {
                let start = stack.iter().position(|&s| s == dep).unwrap_or(0);
                let mut cycle: Vec<String> = stack[start..]
                    .iter()
                    .map(|&s| targets[s].name.clone())
                    .collect();
                cycle.push(targets[dep].name.clone());
                return Some(cycle);
            }
            Mark::Unvisited => {
                if let Some(cycle) = visit(dep, targets, dependencies, marks, stack) {
                    return Some(cycle);
                }
            }
            Mark::Done => {}
        }
    }

    stack.pop();
    marks[i] = Mark::Done;
    None
}
