//! Topological ordering (Kahn's algorithm) and cycle reporting
//!
//! `topological_sort` never fails: nodes that never reach in-degree zero
//! (cycle members, their dependents, and targets of edges whose source is
//! not a node) are left out of the result. Callers that care use
//! [`dropped_nodes`] and [`find_cycle`] to decide what to do about it.

use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};

use super::edge_index::EdgeIndex;
use super::node::Node;

/// Execution order for `nodes`
///
/// In-degree comes from the target index. The queue is seeded with every
/// zero in-degree node in list order and drained FIFO, so ties keep
/// discovery order and the result is deterministic for a fixed input.
pub fn topological_sort<'a>(nodes: &'a [Node], index: &EdgeIndex<'_>) -> Vec<&'a Node> {
    let by_id: FxHashMap<&str, &'a Node> = nodes.iter().map(|n| (n.id.as_str(), n)).collect();
    let mut in_degree: FxHashMap<&str, usize> = nodes
        .iter()
        .map(|n| (n.id.as_str(), index.in_degree(&n.id)))
        .collect();

    let mut queue: VecDeque<&'a Node> = nodes
        .iter()
        .filter(|n| in_degree.get(n.id.as_str()) == Some(&0))
        .collect();
    let mut sorted = Vec::with_capacity(nodes.len());

    while let Some(node) = queue.pop_front() {
        sorted.push(node);

        for edge in index.outgoing(&node.id) {
            let Some(degree) = in_degree.get_mut(edge.target.as_str()) else {
                continue;
            };
            if *degree == 0 {
                continue;
            }
            *degree -= 1;
            if *degree == 0 {
                if let Some(successor) = by_id.get(edge.target.as_str()) {
                    queue.push_back(successor);
                }
            }
        }
    }

    sorted
}

/// Nodes of `nodes` missing from `sorted`, in list order
pub fn dropped_nodes<'a>(nodes: &'a [Node], sorted: &[&Node]) -> Vec<&'a Node> {
    let kept: FxHashSet<&str> = sorted.iter().map(|n| n.id.as_str()).collect();
    nodes
        .iter()
        .filter(|n| !kept.contains(n.id.as_str()))
        .collect()
}

/// Find one cycle using DFS three-colour marking
///
/// Returns the cycle as a path whose last element repeats the first
/// (`a → b → a`), or `None` if the graph is acyclic. Edges pointing at
/// unknown nodes are ignored. The walk keeps its own stack of
/// `(node, next outgoing edge)` so graph depth never grows the call stack.
pub fn find_cycle<'a>(nodes: &'a [Node], index: &EdgeIndex<'a>) -> Option<Vec<String>> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Color {
        White,
        Gray,
        Black,
    }

    let mut colors: FxHashMap<&'a str, Color> = nodes
        .iter()
        .map(|n| (n.id.as_str(), Color::White))
        .collect();
    let mut path: Vec<(&'a str, usize)> = Vec::new();

    for node in nodes {
        let root = node.id.as_str();
        if colors.get(root) != Some(&Color::White) {
            continue;
        }
        colors.insert(root, Color::Gray);
        path.push((root, 0));

        while let Some(top) = path.last_mut() {
            let (current, cursor) = *top;
            let outgoing = index.outgoing(current);
            let Some(&edge) = outgoing.get(cursor) else {
                colors.insert(current, Color::Black);
                path.pop();
                continue;
            };
            top.1 += 1;

            let next = edge.target.as_str();
            match colors.get(next) {
                Some(Color::Gray) => {
                    let start = path.iter().position(|(id, _)| *id == next).unwrap_or(0);
                    let mut cycle: Vec<String> =
                        path[start..].iter().map(|(id, _)| id.to_string()).collect();
                    cycle.push(next.to_string());
                    return Some(cycle);
                }
                Some(Color::White) => {
                    colors.insert(next, Color::Gray);
                    path.push((next, 0));
                }
                Some(Color::Black) | None => {}
            }
        }
    }

    None
}
