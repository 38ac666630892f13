//! Prerequisite graph and topological leveling.
//!
//! The graph contains the courses still to be scheduled. Approved and
//! locked courses are *resolved*: they satisfy prerequisites but are not
//! nodes. Edges run from a prerequisite to the courses that need it.
//!
//! A prerequisite that is neither resolved nor a node is *dangling*
//! (typically an ID missing from the catalog). It counts as a permanently
//! unmet prerequisite, so the course never reaches in-degree zero.
//!
//! # Reference
//! Kahn (1962), "Topological sorting of large networks", CACM 5(11)

mod levels;

pub use levels::{build_levels, Leveling};

use std::collections::{HashMap, HashSet};

use crate::models::{Course, CourseId};

/// Directed prerequisite graph over pending courses.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: Vec<CourseId>,
    index: HashMap<CourseId, usize>,
    prerequisites: Vec<Vec<usize>>,
    dependents: Vec<Vec<usize>>,
    dangling: Vec<Vec<CourseId>>,
    in_degree: Vec<usize>,
}

impl DependencyGraph {
    /// Builds the graph for every course not in `resolved`.
    ///
    /// Node order follows `courses` order. Adjacency lists are in
    /// ascending node order.
    pub fn build(courses: &[Course], resolved: &HashSet<CourseId>) -> Self {
        let nodes: Vec<CourseId> = courses
            .iter()
            .filter(|c| !resolved.contains(&c.id))
            .map(|c| c.id)
            .collect();
        let index: HashMap<CourseId, usize> =
            nodes.iter().enumerate().map(|(i, &id)| (id, i)).collect();

        let n = nodes.len();
        let mut prerequisites = vec![Vec::new(); n];
        let mut dependents = vec![Vec::new(); n];
        let mut dangling = vec![Vec::new(); n];
        let mut in_degree = vec![0usize; n];

        for course in courses {
            let Some(&node) = index.get(&course.id) else {
                continue;
            };
            for pre in &course.correlatives {
                if resolved.contains(pre) {
                    continue;
                }
                match index.get(pre) {
                    Some(&p) => {
                        prerequisites[node].push(p);
                        dependents[p].push(node);
                    }
                    None => dangling[node].push(*pre),
                }
                in_degree[node] += 1;
            }
        }

        for list in prerequisites.iter_mut().chain(dependents.iter_mut()) {
            list.sort_unstable();
        }

        Self {
            nodes,
            index,
            prerequisites,
            dependents,
            dangling,
            in_degree,
        }
    }

    /// Number of pending courses.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Pending course IDs in catalog order.
    pub fn nodes(&self) -> &[CourseId] {
        &self.nodes
    }

    /// Whether a course is pending.
    pub fn contains(&self, id: CourseId) -> bool {
        self.index.contains_key(&id)
    }

    /// Number of unmet prerequisites (pending or dangling).
    pub fn in_degree(&self, id: CourseId) -> Option<usize> {
        self.index.get(&id).map(|&i| self.in_degree[i])
    }

    /// Pending prerequisites of a course.
    pub fn prerequisites_of(&self, id: CourseId) -> Vec<CourseId> {
        self.ids(id, &self.prerequisites)
    }

    /// Pending courses that list `id` as a prerequisite.
    pub fn dependents_of(&self, id: CourseId) -> Vec<CourseId> {
        self.ids(id, &self.dependents)
    }

    /// Prerequisite IDs that are neither pending nor resolved.
    pub fn dangling_of(&self, id: CourseId) -> &[CourseId] {
        self.index
            .get(&id)
            .map(|&i| self.dangling[i].as_slice())
            .unwrap_or(&[])
    }

    /// Number of direct dependents per pending course.
    pub fn dependent_counts(&self) -> HashMap<CourseId, usize> {
        self.nodes
            .iter()
            .zip(&self.dependents)
            .map(|(&id, deps)| (id, deps.len()))
            .collect()
    }

    fn ids(&self, id: CourseId, adjacency: &[Vec<usize>]) -> Vec<CourseId> {
        self.index
            .get(&id)
            .map(|&i| adjacency[i].iter().map(|&j| self.nodes[j]).collect())
            .unwrap_or_default()
    }

    pub(crate) fn node_in_degrees(&self) -> &[usize] {
        &self.in_degree
    }

    pub(crate) fn node_prerequisites(&self, node: usize) -> &[usize] {
        &self.prerequisites[node]
    }

    pub(crate) fn node_dependents(&self, node: usize) -> &[usize] {
        &self.dependents[node]
    }

    pub(crate) fn node_dangling(&self, node: usize) -> &[CourseId] {
        &self.dangling[node]
    }
}
