//! Inactive-node propagation
//!
//! A node with `active: false` disables itself and everything reachable
//! from it. Membership is about reachability only: a node that also has an
//! active parent is still skipped.

use std::collections::VecDeque;

use rustc_hash::FxHashSet;

use super::edge_index::EdgeIndex;
use super::node::Node;

/// Ids of explicitly inactive nodes plus all their descendants
///
/// Breadth-first over outgoing edges. Each id is enqueued at most once, so
/// cycles terminate. Descendants that are not in `nodes` (dangling edge
/// targets) are still included; the runner never looks them up.
pub fn inactive_closure<'a>(nodes: &'a [Node], index: &EdgeIndex<'a>) -> FxHashSet<&'a str> {
    let mut closure: FxHashSet<&'a str> = FxHashSet::default();
    let mut queue: VecDeque<&'a str> = VecDeque::new();

    for node in nodes.iter().filter(|n| !n.is_active()) {
        if closure.insert(node.id.as_str()) {
            queue.push_back(node.id.as_str());
        }
    }

    while let Some(id) = queue.pop_front() {
        for edge in index.outgoing(id) {
            if closure.insert(edge.target.as_str()) {
                queue.push_back(edge.target.as_str());
            }
        }
    }

    closure
}
