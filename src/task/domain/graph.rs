//! Dependency graph over a snapshot of one project's tasks.
//!
//! Edges point from a task to the tasks it depends on. The graph answers the
//! three questions the lifecycle needs: is a task's dependency set satisfied,
//! would a new edge close a cycle, and which tasks wait on a given task.

use super::{Task, TaskId, TaskOwner, TaskStatus};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
struct GraphNode {
    status: TaskStatus,
    owner: TaskOwner,
    revision: u64,
    depends_on: Vec<TaskId>,
}

impl GraphNode {
    fn from_task(task: &Task) -> Self {
        Self {
            status: task.status(),
            owner: task.owner(),
            revision: task.revision(),
            depends_on: task.depends_on().to_vec(),
        }
    }
}

/// Result of a reachability search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reachability {
    /// Whether the target was reached.
    pub reached: bool,
    /// Every node the search expanded, in visit order.
    pub visited: Vec<TaskId>,
}

/// Read-only dependency graph built from task records.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    order: Vec<TaskId>,
    nodes: HashMap<TaskId, GraphNode>,
}

impl DependencyGraph {
    /// Builds a graph from task records. Later duplicates replace earlier ones.
    #[must_use]
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut graph = Self::default();
        for task in tasks {
            graph.record(task);
        }
        graph
    }

    /// Inserts or refreshes the node for `task`.
    pub fn record(&mut self, task: &Task) {
        if self
            .nodes
            .insert(task.id(), GraphNode::from_task(task))
            .is_none()
        {
            self.order.push(task.id());
        }
    }

    /// Returns `true` when the graph knows `id`.
    #[must_use]
    pub fn contains(&self, id: TaskId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Returns the recorded status of `id`.
    #[must_use]
    pub fn status_of(&self, id: TaskId) -> Option<TaskStatus> {
        self.nodes.get(&id).map(|node| node.status)
    }

    /// Returns the recorded owner of `id`.
    #[must_use]
    pub fn owner_of(&self, id: TaskId) -> Option<TaskOwner> {
        self.nodes.get(&id).map(|node| node.owner)
    }

    /// Returns the recorded storage revision of `id`.
    #[must_use]
    pub fn revision_of(&self, id: TaskId) -> Option<u64> {
        self.nodes.get(&id).map(|node| node.revision)
    }

    /// Returns `true` when every dependency of `task` is done.
    ///
    /// An empty dependency set is trivially satisfied; an unknown dependency
    /// never is.
    #[must_use]
    pub fn is_satisfied(&self, task: &Task) -> bool {
        self.dependencies_satisfied(task.depends_on())
    }

    /// Returns `true` when every id in `dependencies` is done.
    #[must_use]
    pub fn dependencies_satisfied(&self, dependencies: &[TaskId]) -> bool {
        dependencies
            .iter()
            .all(|id| self.status_of(*id) == Some(TaskStatus::Done))
    }

    /// Depth-first search from `from` along existing dependency edges.
    #[must_use]
    pub fn trace(&self, from: TaskId, target: TaskId) -> Reachability {
        let mut visited = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![from];
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            visited.push(current);
            if current == target {
                return Reachability {
                    reached: true,
                    visited,
                };
            }
            if let Some(node) = self.nodes.get(&current) {
                stack.extend(node.depends_on.iter().rev().copied());
            }
        }
        Reachability {
            reached: false,
            visited,
        }
    }

    /// Returns `true` when adding `task_id -> dependency_id` would close a
    /// cycle (including the self-edge).
    #[must_use]
    pub fn would_create_cycle(&self, task_id: TaskId, dependency_id: TaskId) -> bool {
        task_id == dependency_id || self.trace(dependency_id, task_id).reached
    }

    /// Returns every task whose dependency set contains `id`, in snapshot
    /// order.
    #[must_use]
    pub fn downstream_of(&self, id: TaskId) -> Vec<TaskId> {
        self.order
            .iter()
            .filter(|candidate| {
                self.nodes
                    .get(candidate)
                    .is_some_and(|node| node.depends_on.contains(&id))
            })
            .copied()
            .collect()
    }
}
