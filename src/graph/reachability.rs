//! Dependency reachability and cycle detection
//!
//! Both the declared-edge check behind `output_path` and the executor's
//! ordering walk the graph depth-first with an explicit stack, so deep
//! dependency chains never grow the call stack.

use crate::error::FetchError;
use crate::graph::{BuildGraph, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    /// Entered, subtree not finished yet
    InProgress,
    Done,
}

/// Depth-first walker with visit marks scoped to one traversal
pub(crate) struct Walk<'graph> {
    graph: &'graph BuildGraph,
    marks: Vec<Mark>,
}

impl<'graph> Walk<'graph> {
    pub(crate) fn new(graph: &'graph BuildGraph) -> Self {
        Self {
            graph,
            marks: vec![Mark::Unvisited; graph.len()],
        }
    }

    /// Visit everything reachable from `start`, calling `on_done` in post-order
    ///
    /// Nodes already finished by an earlier call are skipped. Reaching a node
    /// whose subtree is still in progress means the graph has a cycle.
    pub(crate) fn visit<F>(&mut self, start: NodeId, mut on_done: F) -> Result<(), FetchError>
    where
        F: FnMut(NodeId),
    {
        if self.marks[start.index()] != Mark::Unvisited {
            return Ok(());
        }

        self.marks[start.index()] = Mark::InProgress;
        let mut stack: Vec<(NodeId, usize)> = vec![(start, 0)];

        while let Some(frame) = stack.last_mut() {
            let (node, next_edge) = *frame;
            frame.1 += 1;

            match self.graph.node(node).dependencies().get(next_edge).copied() {
                Some(dependency) => match self.marks[dependency.index()] {
                    Mark::Unvisited => {
                        self.marks[dependency.index()] = Mark::InProgress;
                        stack.push((dependency, 0));
                    }
                    Mark::InProgress => {
                        return Err(FetchError::CircularDependency {
                            node: self.graph.node(dependency).name().to_owned(),
                        });
                    }
                    Mark::Done => {}
                },
                None => {
                    self.marks[node.index()] = Mark::Done;
                    on_done(node);
                    stack.pop();
                }
            }
        }

        Ok(())
    }

    fn is_done(&self, node: NodeId) -> bool {
        self.marks[node.index()] == Mark::Done
    }
}

/// Whether `to` is a direct or transitive dependency of `from`
///
/// The whole dependency closure of `from` is walked before answering, so a
/// cycle anywhere in that closure is reported no matter where `to` sits.
/// A node only reaches itself through a cycle, so `from == to` is `false`
/// for any acyclic graph.
///
/// # Errors
///
/// Returns an error if:
/// - Either node does not belong to `graph` (`FetchError::Configuration`)
/// - A cycle is reachable from `from` (`FetchError::CircularDependency`)
#[inline]
pub fn is_reachable(graph: &BuildGraph, from: NodeId, to: NodeId) -> Result<bool, FetchError> {
    for id in [from, to] {
        if id.index() >= graph.len() {
            return Err(FetchError::configuration(format!(
                "Node {id} does not belong to this build graph"
            )));
        }
    }

    let mut walk = Walk::new(graph);
    walk.visit(from, |_| {})?;

    Ok(from != to && walk.is_done(to))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::Noop;
    use std::sync::Arc;

    fn graph_with(names: &[&str]) -> (BuildGraph, Vec<NodeId>) {
        let mut graph = BuildGraph::new();
        let ids = names
            .iter()
            .map(|name| graph.add_node(*name, Arc::new(Noop)))
            .collect();
        (graph, ids)
    }

    #[test]
    fn test_direct_and_transitive() {
        let (mut graph, ids) = graph_with(&["app", "lib", "dep"]);
        graph.depend_on(ids[0], ids[1]).unwrap();
        graph.depend_on(ids[1], ids[2]).unwrap();

        assert!(is_reachable(&graph, ids[0], ids[1]).unwrap());
        assert!(is_reachable(&graph, ids[0], ids[2]).unwrap());
        assert!(!is_reachable(&graph, ids[2], ids[0]).unwrap());
        assert!(!is_reachable(&graph, ids[1], ids[0]).unwrap());
    }

    #[test]
    fn test_node_does_not_reach_itself() {
        let (graph, ids) = graph_with(&["alone"]);
        assert!(!is_reachable(&graph, ids[0], ids[0]).unwrap());
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let (mut graph, ids) = graph_with(&["top", "left", "right", "bottom"]);
        graph.depend_on(ids[0], ids[1]).unwrap();
        graph.depend_on(ids[0], ids[2]).unwrap();
        graph.depend_on(ids[1], ids[3]).unwrap();
        graph.depend_on(ids[2], ids[3]).unwrap();

        assert!(is_reachable(&graph, ids[0], ids[3]).unwrap());
        assert!(!is_reachable(&graph, ids[1], ids[2]).unwrap());
    }

    #[test]
    fn test_cycle_is_reported() {
        let (mut graph, ids) = graph_with(&["a", "b", "c"]);
        graph.depend_on(ids[0], ids[1]).unwrap();
        graph.depend_on(ids[1], ids[2]).unwrap();
        graph.depend_on(ids[2], ids[0]).unwrap();

        let err = is_reachable(&graph, ids[0], ids[2]).unwrap_err();
        assert!(matches!(err, FetchError::CircularDependency { .. }));
    }

    #[test]
    fn test_cycle_behind_target_is_still_reported() {
        let (mut graph, ids) = graph_with(&["consumer", "step", "x", "y"]);
        graph.depend_on(ids[0], ids[1]).unwrap();
        graph.depend_on(ids[0], ids[2]).unwrap();
        graph.depend_on(ids[2], ids[3]).unwrap();
        graph.depend_on(ids[3], ids[2]).unwrap();

        let err = is_reachable(&graph, ids[0], ids[1]).unwrap_err();
        assert!(matches!(err, FetchError::CircularDependency { .. }));
    }

    #[test]
    fn test_self_loop_is_a_cycle() {
        let (mut graph, ids) = graph_with(&["loop"]);
        graph.depend_on(ids[0], ids[0]).unwrap();
        assert!(is_reachable(&graph, ids[0], ids[0]).is_err());
    }

    #[test]
    fn test_unreachable_cycle_is_ignored() {
        let (mut graph, ids) = graph_with(&["a", "b", "c", "d"]);
        graph.depend_on(ids[0], ids[1]).unwrap();
        graph.depend_on(ids[2], ids[3]).unwrap();
        graph.depend_on(ids[3], ids[2]).unwrap();

        assert!(is_reachable(&graph, ids[0], ids[1]).unwrap());
    }

    #[test]
    fn test_deep_chain_does_not_recurse() {
        let names: Vec<String> = (0..50_000).map(|i| format!("n{i}")).collect();
        let mut graph = BuildGraph::new();
        let ids: Vec<NodeId> = names
            .iter()
            .map(|name| graph.add_node(name.as_str(), Arc::new(Noop)))
            .collect();
        for pair in ids.windows(2) {
            graph.depend_on(pair[0], pair[1]).unwrap();
        }

        assert!(is_reachable(&graph, ids[0], ids[ids.len() - 1]).unwrap());
    }

    #[test]
    fn test_foreign_node_is_rejected() {
        let (graph, ids) = graph_with(&["a"]);
        let (_, other_ids) = graph_with(&["x", "y", "z"]);
        assert!(is_reachable(&graph, ids[0], other_ids[2]).is_err());
    }
}
