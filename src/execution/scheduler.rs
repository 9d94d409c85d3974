//! Execution scheduler - resolves goals into an ordered list of targets

use crate::core::graph::{Relation, TargetGraph};
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use thiserror::Error;
use tracing::debug;

/// Errors raised while resolving the execution order
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchedulingError {
    #[error("Unknown target '{0}' requested")]
    UnknownGoal(String),

    #[error("No targets requested and no default target registered")]
    NoGoals,

    #[error("Ordering constraint '{constraint}' cannot be satisfied (cycle: {})", .cycle.join(" -> "))]
    UnsatisfiableOrdering {
        constraint: String,
        cycle: Vec<String>,
    },
}

/// Ordered, deduplicated list of targets to evaluate for a set of goals
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionPlan {
    /// Goals after defaulting and deduplication
    pub goals: Vec<String>,

    /// Targets in the order they will be evaluated
    pub order: Vec<String>,
}

impl ExecutionPlan {
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.order.iter().position(|n| n == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }
}

#[derive(Debug, Clone, Copy)]
struct Edge {
    from: usize,
    to: usize,
    relation: Relation,
}

/// Scheduler over a validated target graph
pub struct ExecutionScheduler<'g> {
    graph: &'g TargetGraph,
}

impl<'g> ExecutionScheduler<'g> {
    pub fn new(graph: &'g TargetGraph) -> Self {
        Self { graph }
    }

    /// Resolve goals into an execution order
    ///
    /// Only targets reachable from the goals through hard dependencies are
    /// included. Soft `before`/`after` constraints reorder included targets
    /// but never pull new ones in. Ties go to registration order.
    pub fn resolve_order<S: AsRef<str>>(&self, goals: &[S]) -> Result<ExecutionPlan, SchedulingError> {
        let goals = self.normalize_goals(goals)?;
        let n = self.graph.len();

        let mut included = vec![false; n];
        let mut stack: Vec<usize> = goals
            .iter()
            .filter_map(|g| self.graph.index_of(g))
            .collect();
        while let Some(i) = stack.pop() {
            if included[i] {
                continue;
            }
            included[i] = true;
            stack.extend(self.graph.dependency_indices(i).iter().copied());
        }

        let mut edges = Vec::new();
        for to in (0..n).filter(|&i| included[i]) {
            for &from in self.graph.dependency_indices(to) {
                edges.push(Edge {
                    from,
                    to,
                    relation: Relation::DependsOn,
                });
            }
        }
        for edge in self.graph.ordering_edges() {
            if included[edge.first] && included[edge.then] {
                edges.push(Edge {
                    from: edge.first,
                    to: edge.then,
                    relation: edge.relation,
                });
            }
        }

        let mut successors: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut in_degree = vec![0usize; n];
        for edge in &edges {
            successors[edge.from].push(edge.to);
            in_degree[edge.to] += 1;
        }

        let mut ready: BinaryHeap<Reverse<usize>> = (0..n)
            .filter(|&i| included[i] && in_degree[i] == 0)
            .map(Reverse)
            .collect();
        let total = included.iter().filter(|&&b| b).count();
        let mut order = Vec::with_capacity(total);

        while let Some(Reverse(i)) = ready.pop() {
            order.push(self.graph.name_at(i).to_string());
            for &next in &successors[i] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    ready.push(Reverse(next));
                }
            }
        }

        if order.len() < total {
            let remaining: Vec<bool> = (0..n).map(|i| included[i] && in_degree[i] > 0).collect();
            return Err(self.unsatisfiable(&edges, &remaining));
        }

        debug!("Resolved {:?} into {:?}", goals, order);
        Ok(ExecutionPlan { goals, order })
    }

    fn normalize_goals<S: AsRef<str>>(&self, goals: &[S]) -> Result<Vec<String>, SchedulingError> {
        let mut result: Vec<String> = Vec::new();
        for goal in goals {
            let goal = goal.as_ref();
            if !self.graph.contains(goal) {
                return Err(SchedulingError::UnknownGoal(goal.to_string()));
            }
            if !result.iter().any(|g| g == goal) {
                result.push(goal.to_string());
            }
        }

        if result.is_empty() {
            match self.graph.default_target() {
                Some(default) => result.push(default.to_string()),
                None => return Err(SchedulingError::NoGoals),
            }
        }

        Ok(result)
    }

    /// Build the error for a cycle left over after topological sorting.
    ///
    /// Every remaining node still has a remaining predecessor, so walking
    /// predecessors must revisit a node; that loop is the cycle.
    fn unsatisfiable(&self, edges: &[Edge], remaining: &[bool]) -> SchedulingError {
        let mut predecessors: HashMap<usize, Vec<&Edge>> = HashMap::new();
        for edge in edges {
            if remaining[edge.from] && remaining[edge.to] {
                predecessors.entry(edge.to).or_default().push(edge);
            }
        }

        let Some(start) = remaining.iter().position(|&r| r) else {
            return SchedulingError::UnsatisfiableOrdering {
                constraint: String::new(),
                cycle: Vec::new(),
            };
        };

        let mut path = vec![start];
        let mut taken: Vec<&Edge> = Vec::new();
        let mut current = start;
        let cycle_start = loop {
            let Some(edge) = predecessors.get(&current).and_then(|p| p.first()) else {
                break 0;
            };
            taken.push(edge);
            current = edge.from;
            if let Some(pos) = path.iter().position(|&p| p == current) {
                break pos;
            }
            path.push(current);
        };

        // Walked backwards; flip into forward order.
        let cycle_edges: Vec<&Edge> = taken[cycle_start..].iter().rev().copied().collect();
        let mut cycle: Vec<String> = cycle_edges
            .iter()
            .map(|e| self.graph.name_at(e.from).to_string())
            .collect();
        if let Some(first) = cycle.first().cloned() {
            cycle.push(first);
        }

        let culprit = cycle_edges
            .iter()
            .find(|e| e.relation != Relation::DependsOn)
            .or_else(|| cycle_edges.first())
            .copied();

        SchedulingError::UnsatisfiableOrdering {
            constraint: culprit.map(|e| self.describe(e)).unwrap_or_default(),
            cycle,
        }
    }

    fn describe(&self, edge: &Edge) -> String {
        let from = self.graph.name_at(edge.from);
        let to = self.graph.name_at(edge.to);
        match edge.relation {
            Relation::DependsOn => format!("{} depends on {}", to, from),
            Relation::Before => format!("{} before {}", from, to),
            Relation::After => format!("{} after {}", to, from),
        }
    }
}

/// Convenience wrapper around [`ExecutionScheduler::resolve_order`]
pub fn resolve_order<S: AsRef<str>>(
    graph: &TargetGraph,
    goals: &[S],
) -> Result<ExecutionPlan, SchedulingError> {
    ExecutionScheduler::new(graph).resolve_order(goals)
}
