// src/graph.rs

//! Materialized dependency DAG for drivers.
//!
//! The task model itself is pull-based; this module walks `deps()` from a
//! set of root tasks and builds an explicit graph, so a driver can validate
//! acyclicity, compute a dependencies-first execution order, and prune
//! branches that are already complete.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

use crate::errors::GraphError;
use crate::task::TaskRef;

/// Dependency DAG keyed by task id.
///
/// Edge direction: dependency -> dependent, so a topological order yields
/// dependencies first.
pub struct DepGraph {
    graph: DiGraph<TaskRef, ()>,
    index: HashMap<String, NodeIndex>,
    roots: Vec<NodeIndex>,
    /// Dependencies-first order over the whole graph, fixed at build time.
    topo: Vec<NodeIndex>,
}

impl DepGraph {
    /// Walk `deps()` recursively from `roots` and build the DAG.
    ///
    /// Tasks are identified by task id, so two instances with the same id
    /// share a node. Fails on cycles.
    pub fn build(roots: &[TaskRef]) -> Result<Self, GraphError> {
        let mut graph: DiGraph<TaskRef, ()> = DiGraph::new();
        let mut index: HashMap<String, NodeIndex> = HashMap::new();

        let mut expanded: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<TaskRef> = roots.iter().cloned().collect();

        while let Some(task) = queue.pop_front() {
            let id = task.task_id().to_string();
            if !expanded.insert(id) {
                continue;
            }
            let node = intern(&mut graph, &mut index, &task);
            for dep in task.deps() {
                let dep_node = intern(&mut graph, &mut index, &dep);
                graph.update_edge(dep_node, node, ());
                queue.push_back(dep);
            }
        }

        let topo = toposort(&graph, None).map_err(|cycle| GraphError::Cycle {
            task_id: graph[cycle.node_id()].task_id().to_string(),
        })?;

        let root_nodes = roots
            .iter()
            .filter_map(|task| index.get(task.task_id()).copied())
            .collect();

        debug!(tasks = graph.node_count(), "dependency graph materialized");

        Ok(Self {
            graph,
            index,
            roots: root_nodes,
            topo,
        })
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn contains(&self, task_id: &str) -> bool {
        self.index.contains_key(task_id)
    }

    pub fn get(&self, task_id: &str) -> Option<&TaskRef> {
        self.index.get(task_id).map(|&node| &self.graph[node])
    }

    /// Immediate dependencies of a task.
    pub fn dependencies_of(&self, task_id: &str) -> Vec<TaskRef> {
        self.neighbors(task_id, petgraph::Direction::Incoming)
    }

    /// Immediate dependents of a task.
    pub fn dependents_of(&self, task_id: &str) -> Vec<TaskRef> {
        self.neighbors(task_id, petgraph::Direction::Outgoing)
    }

    fn neighbors(&self, task_id: &str, direction: petgraph::Direction) -> Vec<TaskRef> {
        match self.index.get(task_id) {
            Some(&node) => self
                .graph
                .neighbors_directed(node, direction)
                .map(|n| self.graph[n].clone())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Every task, dependencies first.
    pub fn topo_order(&self) -> Vec<TaskRef> {
        self.topo.iter().map(|&node| self.graph[node].clone()).collect()
    }

    /// Dependencies-first order over the tasks that still need to run.
    ///
    /// Walks from the roots; a task reporting `complete()` is neither
    /// scheduled nor expanded, so entire satisfied branches are pruned with
    /// one completeness check at the branch point. Each task is checked at
    /// most once.
    pub fn execution_plan(&self) -> Vec<TaskRef> {
        let mut pending: HashSet<NodeIndex> = HashSet::new();
        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut queue: VecDeque<NodeIndex> = self.roots.iter().copied().collect();

        while let Some(node) = queue.pop_front() {
            if !visited.insert(node) {
                continue;
            }
            let task = &self.graph[node];
            if task.complete() {
                debug!(task = %task.core(), "already complete; pruning branch");
                continue;
            }
            pending.insert(node);
            queue.extend(
                self.graph
                    .neighbors_directed(node, petgraph::Direction::Incoming),
            );
        }

        self.topo
            .iter()
            .filter(|node| pending.contains(node))
            .map(|&node| self.graph[node].clone())
            .collect()
    }
}

/// Node for the task's id, creating it on first sight.
fn intern(
    graph: &mut DiGraph<TaskRef, ()>,
    index: &mut HashMap<String, NodeIndex>,
    task: &TaskRef,
) -> NodeIndex {
    match index.get(task.task_id()) {
        Some(&node) => node,
        None => {
            let node = graph.add_node(task.clone());
            index.insert(task.task_id().to_string(), node);
            node
        }
    }
}
