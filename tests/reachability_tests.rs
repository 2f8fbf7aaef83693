//! Property-based tests for dependency reachability and cycle detection

use anyhow::Result;
use proptest::prelude::*;
use sparsedep::error::FetchError;
use sparsedep::graph::{Action, BuildGraph, NodeId, StepRun, is_reachable};
use std::sync::Arc;

struct Noop;

impl Action for Noop {
    fn make(&self, _run: &StepRun<'_>) -> Result<()> {
        Ok(())
    }
}

/// Graph whose node `i` may only depend on nodes with a lower index
fn dag(size: usize, edges: &[(usize, usize)]) -> (BuildGraph, Vec<NodeId>) {
    let mut graph = BuildGraph::new();
    let ids: Vec<NodeId> = (0..size)
        .map(|i| graph.add_node(format!("n{i}"), Arc::new(Noop)))
        .collect();
    for &(a, b) in edges {
        let (from, to) = (a.max(b), a.min(b));
        if from != to {
            graph.depend_on(ids[from], ids[to]).unwrap();
        }
    }
    (graph, ids)
}

/// Transitive closure by repeated relaxation, `closure[a][b]` meaning `a` reaches `b`
fn closure(size: usize, edges: &[(usize, usize)]) -> Vec<Vec<bool>> {
    let mut reach = vec![vec![false; size]; size];
    for &(a, b) in edges {
        if a != b {
            reach[a.max(b)][a.min(b)] = true;
        }
    }
    for k in 0..size {
        for i in 0..size {
            if reach[i][k] {
                for j in 0..size {
                    if reach[k][j] {
                        reach[i][j] = true;
                    }
                }
            }
        }
    }
    reach
}

fn graph_strategy() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    (1_usize..24).prop_flat_map(|size| {
        (
            Just(size),
            prop::collection::vec((0..size, 0..size), 0..(size * 3)),
        )
    })
}

proptest! {
    /// Property: on acyclic graphs reachability matches the transitive closure
    #[test]
    fn reachability_matches_closure((size, edges) in graph_strategy()) {
        let (graph, ids) = dag(size, &edges);
        let reach = closure(size, &edges);

        for from in 0..size {
            for to in 0..size {
                prop_assert_eq!(
                    is_reachable(&graph, ids[from], ids[to]).unwrap(),
                    reach[from][to],
                    "n{} -> n{}", from, to
                );
            }
        }
    }

    /// Property: execution order lists every node once, after its dependencies
    #[test]
    fn execution_order_respects_dependencies((size, edges) in graph_strategy()) {
        let (graph, ids) = dag(size, &edges);
        let order = graph.execution_order().unwrap();
        prop_assert_eq!(order.len(), size);

        let position = |id: NodeId| order.iter().position(|&n| n == id).unwrap();
        for &id in &ids {
            for &dependency in graph.node(id).dependencies() {
                prop_assert!(position(dependency) < position(id));
            }
        }
    }

    /// Property: closing a path into a cycle is reported from every node that reaches it
    #[test]
    fn cycles_are_reported((size, edges) in graph_strategy()) {
        let reach = closure(size, &edges);
        let path = (0..size)
            .flat_map(|a| (0..size).map(move |b| (a, b)))
            .find(|&(a, b)| reach[a][b]);
        prop_assume!(path.is_some());
        let Some((top, bottom)) = path else { return Ok(()) };

        let (mut graph, ids) = dag(size, &edges);
        graph.depend_on(ids[bottom], ids[top]).unwrap();

        let is_cycle_error =
            |result: Result<bool, FetchError>| matches!(result, Err(FetchError::CircularDependency { .. }));
        prop_assert!(is_cycle_error(is_reachable(&graph, ids[top], ids[bottom])));
        prop_assert!(is_cycle_error(is_reachable(&graph, ids[bottom], ids[top])));
        prop_assert!(graph.execution_order().is_err());

        for other in 0..size {
            if !reach[other][top] && !reach[other][bottom] && other != top && other != bottom {
                prop_assert!(is_reachable(&graph, ids[other], ids[top]).is_ok());
            }
        }
    }
}
