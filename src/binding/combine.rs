//! Parent-output combiner
//!
//! Gathers a node's direct predecessor outputs in edge-list order. That
//! order, not completion order, defines `${1}..${N}`.

use crate::graph::EdgeIndex;
use crate::store::ExecutionContext;

/// Outputs of `node_id`'s parents, one per incoming edge
///
/// Missing outputs (skipped or failed parent) become `""`. Each entry has
/// `\r\n` normalized to `\n` and is trimmed.
pub fn combine_parent_outputs_by_connection_order(
    node_id: &str,
    index: &EdgeIndex<'_>,
    context: &ExecutionContext,
) -> Vec<String> {
    index
        .incoming(node_id)
        .iter()
        .map(|edge| normalize(context.get(&edge.source).unwrap_or_default()))
        .collect()
}

fn normalize(output: &str) -> String {
    if output.contains("\r\n") {
        output.replace("\r\n", "\n").trim().to_string()
    } else {
        output.trim().to_string()
    }
}
