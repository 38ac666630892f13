//! Breadth-first topological leveling (Kahn's algorithm).
//!
//! # Algorithm
//! 1. Seed the ready queue with every node of in-degree zero.
//! 2. Drain the whole queue as one level.
//! 3. Decrement the in-degree of each drained node's dependents; those
//!    reaching zero form the next queue.
//! 4. Stop when the queue is empty. Nodes never drained are excluded and
//!    classified (dangling prerequisite, cycle, or blocked by either).
//!
//! # Complexity
//! O(V + E) for leveling, O(U · (U + E)) for classifying U excluded nodes.

use std::collections::VecDeque;

use super::DependencyGraph;
use crate::models::{CourseId, UnplacedReason};

/// Result of leveling a dependency graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Leveling {
    /// Levels in order; within a level, catalog order.
    pub levels: Vec<Vec<CourseId>>,
    /// Courses that never reached in-degree zero, in catalog order.
    pub excluded: Vec<(CourseId, UnplacedReason)>,
}

impl Leveling {
    /// All leveled courses, level by level.
    pub fn order(&self) -> Vec<CourseId> {
        self.levels.iter().flatten().copied().collect()
    }

    /// Level index of a course.
    pub fn level_of(&self, id: CourseId) -> Option<usize> {
        self.levels.iter().position(|l| l.contains(&id))
    }

    /// Exclusion reason of a course.
    pub fn excluded_reason(&self, id: CourseId) -> Option<&UnplacedReason> {
        self.excluded
            .iter()
            .find(|(c, _)| *c == id)
            .map(|(_, r)| r)
    }
}

/// Groups the graph's nodes into dependency levels.
///
/// # Example
/// ```
/// use std::collections::HashSet;
/// use u_curriculum::graph::{build_levels, DependencyGraph};
/// use u_curriculum::models::Course;
///
/// let courses = vec![
///     Course::new(1, "Algebra"),
///     Course::new(2, "Calculus").with_correlative(1),
///     Course::new(3, "English"),
/// ];
/// let graph = DependencyGraph::build(&courses, &HashSet::new());
/// let leveling = build_levels(&graph);
/// assert_eq!(leveling.levels, vec![vec![1, 3], vec![2]]);
/// ```
pub fn build_levels(graph: &DependencyGraph) -> Leveling {
    let n = graph.len();
    let mut in_degree = graph.node_in_degrees().to_vec();
    let mut leveled = vec![false; n];

    let mut queue: VecDeque<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
    let mut levels = Vec::new();

    while !queue.is_empty() {
        let mut level: Vec<usize> = queue.drain(..).collect();
        level.sort_unstable();
        for &node in &level {
            leveled[node] = true;
            for &dep in graph.node_dependents(node) {
                in_degree[dep] -= 1;
                if in_degree[dep] == 0 {
                    queue.push_back(dep);
                }
            }
        }
        levels.push(level.into_iter().map(|i| graph.nodes()[i]).collect());
    }

    let excluded = classify_excluded(graph, &leveled);
    Leveling { levels, excluded }
}

fn classify_excluded(graph: &DependencyGraph, leveled: &[bool]) -> Vec<(CourseId, UnplacedReason)> {
    let n = graph.len();
    let remaining: Vec<usize> = (0..n).filter(|&i| !leveled[i]).collect();
    if remaining.is_empty() {
        return Vec::new();
    }

    // reach[v][u]: u is reachable from v along prerequisite edges.
    let mut reach = vec![Vec::new(); n];
    for &v in &remaining {
        let mut seen = vec![false; n];
        let mut stack: Vec<usize> = graph.node_prerequisites(v).to_vec();
        while let Some(u) = stack.pop() {
            if leveled[u] || seen[u] {
                continue;
            }
            seen[u] = true;
            stack.extend_from_slice(graph.node_prerequisites(u));
        }
        reach[v] = seen;
    }

    remaining
        .iter()
        .map(|&v| {
            let id = graph.nodes()[v];
            let dangling = graph.node_dangling(v);
            let reason = if !dangling.is_empty() {
                UnplacedReason::DanglingPrerequisite {
                    missing: dangling.to_vec(),
                }
            } else if reach[v][v] {
                let members = remaining
                    .iter()
                    .filter(|&&u| reach[v][u] && reach[u][v])
                    .map(|&u| graph.nodes()[u])
                    .collect::<Vec<_>>();
                UnplacedReason::Cycle {
                    members: sorted(members),
                }
            } else {
                let missing = graph
                    .node_prerequisites(v)
                    .iter()
                    .filter(|&&p| !leveled[p])
                    .map(|&p| graph.nodes()[p])
                    .collect::<Vec<_>>();
                UnplacedReason::PrerequisiteUnplaced {
                    missing: sorted(missing),
                }
            };
            (id, reason)
        })
        .collect()
}

fn sorted(mut ids: Vec<CourseId>) -> Vec<CourseId> {
    ids.sort_unstable();
    ids
}
