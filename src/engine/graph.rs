// ABOUTME: Task graph construction and structural validation
// ABOUTME: Validates acyclicity, single entry and terminal tasks, and full reachability

use indexmap::IndexMap;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{HashMap, HashSet, VecDeque};

use super::error::GraphError;
use super::task::Task;

/// Builder for a [`TaskGraph`]. Tasks are registered with their incoming
/// edges; upstreams may be registered later, so any edge set - including a
/// cyclic one - can be expressed and then rejected by [`GraphBuilder::build`].
#[derive(Default)]
pub struct GraphBuilder {
    tasks: IndexMap<String, Task>,
    edges: Vec<(String, String)>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task with its incoming edges. Fails immediately on a
    /// duplicate name; unknown upstreams are checked at build time.
    pub fn task(mut self, task: Task, upstreams: &[&str]) -> Result<Self, GraphError> {
        let name = task.name().to_string();
        if self.tasks.contains_key(&name) {
            return Err(GraphError::DuplicateTask { name });
        }
        for upstream in upstreams {
            self.edges.push((upstream.to_string(), name.clone()));
        }
        self.tasks.insert(name, task);
        Ok(self)
    }

    /// Validate the registered edge set and produce an immutable graph.
    pub fn build(self) -> Result<TaskGraph, GraphError> {
        if self.tasks.is_empty() {
            return Err(GraphError::Empty);
        }

        let mut graph: DiGraph<String, ()> = DiGraph::new();
        let mut indices: HashMap<String, NodeIndex> = HashMap::new();
        for name in self.tasks.keys() {
            let idx = graph.add_node(name.clone());
            indices.insert(name.clone(), idx);
        }

        let mut seen_edges = HashSet::new();
        for (upstream, downstream) in &self.edges {
            let up = *indices
                .get(upstream)
                .ok_or_else(|| GraphError::UnknownUpstream {
                    task: downstream.clone(),
                    upstream: upstream.clone(),
                })?;
            let down = indices[downstream];
            // A repeated upstream collapses to a single edge.
            if seen_edges.insert((up, down)) {
                graph.add_edge(up, down, ());
            }
        }

        toposort(&graph, None).map_err(|cycle| GraphError::CycleDetected {
            task: graph[cycle.node_id()].clone(),
        })?;

        let sources: Vec<String> = self
            .tasks
            .keys()
            .filter(|name| {
                graph
                    .neighbors_directed(indices[*name], Direction::Incoming)
                    .next()
                    .is_none()
            })
            .cloned()
            .collect();
        let source = match sources.len() {
            0 => return Err(GraphError::NoSource),
            1 => sources[0].clone(),
            _ => return Err(GraphError::MultipleSources { names: sources }),
        };

        let sinks: Vec<String> = self
            .tasks
            .keys()
            .filter(|name| {
                graph
                    .neighbors_directed(indices[*name], Direction::Outgoing)
                    .next()
                    .is_none()
            })
            .cloned()
            .collect();
        let sink = match sinks.len() {
            0 => return Err(GraphError::NoSink),
            1 => sinks[0].clone(),
            _ => return Err(GraphError::MultipleSinks { names: sinks }),
        };

        // No orphans: every task sits on a path from source to sink.
        let from_source = reachable(&graph, indices[&source], Direction::Outgoing);
        for name in self.tasks.keys() {
            if !from_source.contains(&indices[name]) {
                return Err(GraphError::Unreachable { name: name.clone() });
            }
        }
        let to_sink = reachable(&graph, indices[&sink], Direction::Incoming);
        for name in self.tasks.keys() {
            if !to_sink.contains(&indices[name]) {
                return Err(GraphError::DeadEnd { name: name.clone() });
            }
        }

        Ok(TaskGraph {
            tasks: self.tasks,
            graph,
            indices,
            source,
            sink,
        })
    }
}

fn reachable(
    graph: &DiGraph<String, ()>,
    start: NodeIndex,
    direction: Direction,
) -> HashSet<NodeIndex> {
    let mut seen = HashSet::new();
    let mut queue = VecDeque::new();
    seen.insert(start);
    queue.push_back(start);

    while let Some(node) = queue.pop_front() {
        for next in graph.neighbors_directed(node, direction) {
            if seen.insert(next) {
                queue.push_back(next);
            }
        }
    }
    seen
}

/// An immutable, validated task graph: acyclic, one entry task, one terminal
/// task, no orphans. Constructed once at pipeline-definition time.
pub struct TaskGraph {
    tasks: IndexMap<String, Task>,
    graph: DiGraph<String, ()>,
    indices: HashMap<String, NodeIndex>,
    source: String,
    sink: String,
}

impl TaskGraph {
    pub fn builder() -> GraphBuilder {
        GraphBuilder::new()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn task(&self, name: &str) -> Option<&Task> {
        self.tasks.get(name)
    }

    /// Tasks in registration order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn sink(&self) -> &str {
        &self.sink
    }

    pub fn upstreams(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, Direction::Incoming)
    }

    pub fn downstreams(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, Direction::Outgoing)
    }

    pub fn in_degree(&self, name: &str) -> usize {
        self.upstreams(name).len()
    }

    /// Task names in a valid execution order.
    pub fn topo_order(&self) -> Vec<&str> {
        let sorted = toposort(&self.graph, None).expect("validated graph is acyclic");
        sorted
            .into_iter()
            .map(|idx| self.graph[idx].as_str())
            .collect()
    }

    fn neighbors(&self, name: &str, direction: Direction) -> Vec<&str> {
        match self.indices.get(name) {
            Some(&idx) => self
                .graph
                .neighbors_directed(idx, direction)
                .map(|n| self.graph[n].as_str())
                .collect(),
            None => Vec::new(),
        }
    }
}

impl std::fmt::Debug for TaskGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskGraph")
            .field("tasks", &self.tasks.keys().collect::<Vec<_>>())
            .field("source", &self.source)
            .field("sink", &self.sink)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> TaskGraph {
        TaskGraph::builder()
            .task(Task::no_op("begin"), &[])
            .unwrap()
            .task(Task::no_op("left"), &["begin"])
            .unwrap()
            .task(Task::no_op("right"), &["begin"])
            .unwrap()
            .task(Task::no_op("end"), &["left", "right"])
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn test_diamond_shape_queries() {
        let graph = diamond();

        assert_eq!(graph.len(), 4);
        assert_eq!(graph.source(), "begin");
        assert_eq!(graph.sink(), "end");
        assert_eq!(graph.in_degree("end"), 2);

        let mut downstream = graph.downstreams("begin");
        downstream.sort_unstable();
        assert_eq!(downstream, vec!["left", "right"]);

        let order = graph.topo_order();
        assert_eq!(order.first(), Some(&"begin"));
        assert_eq!(order.last(), Some(&"end"));
    }

    #[test]
    fn test_duplicate_task_rejected() {
        let result = TaskGraph::builder()
            .task(Task::no_op("a"), &[])
            .unwrap()
            .task(Task::no_op("a"), &[]);

        assert!(matches!(
            result.err().unwrap(),
            GraphError::DuplicateTask { name } if name == "a"
        ));
    }

    #[test]
    fn test_cycle_rejected() {
        let result = TaskGraph::builder()
            .task(Task::no_op("a"), &["b"])
            .unwrap()
            .task(Task::no_op("b"), &["a"])
            .unwrap()
            .build();

        assert!(matches!(
            result.err().unwrap(),
            GraphError::CycleDetected { .. }
        ));
    }

    #[test]
    fn test_unknown_upstream_rejected() {
        let result = TaskGraph::builder()
            .task(Task::no_op("a"), &["ghost"])
            .unwrap()
            .build();

        assert!(matches!(
            result.err().unwrap(),
            GraphError::UnknownUpstream { task, upstream }
                if task == "a" && upstream == "ghost"
        ));
    }

    #[test]
    fn test_multiple_sources_rejected() {
        let result = TaskGraph::builder()
            .task(Task::no_op("a"), &[])
            .unwrap()
            .task(Task::no_op("b"), &[])
            .unwrap()
            .task(Task::no_op("end"), &["a", "b"])
            .unwrap()
            .build();

        assert!(matches!(
            result.err().unwrap(),
            GraphError::MultipleSources { .. }
        ));
    }

    #[test]
    fn test_empty_graph_rejected() {
        assert_eq!(TaskGraph::builder().build().err(), Some(GraphError::Empty));
    }

    #[test]
    fn test_disconnected_cycle_rejected() {
        // A valid chain plus a detached two-task cycle: the cycle is caught
        // before reachability is even considered.
        let result = TaskGraph::builder()
            .task(Task::no_op("begin"), &[])
            .unwrap()
            .task(Task::no_op("end"), &["begin"])
            .unwrap()
            .task(Task::no_op("x"), &["y"])
            .unwrap()
            .task(Task::no_op("y"), &["x"])
            .unwrap()
            .build();

        assert!(matches!(
            result.err().unwrap(),
            GraphError::CycleDetected { .. }
        ));
    }
}
