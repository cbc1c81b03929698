//! ExecutionPlan - what a run will do, computed before it starts
//!
//! Ordering, the inactive skip-set, and nodes the sort could not place.
//! Shared by the runner and `nodeflow validate`.

use rustc_hash::FxHashSet;
use tracing::{debug, warn};

use crate::config::CyclePolicy;
use crate::error::{FlowError, Result};
use crate::graph::{
    dropped_nodes, find_cycle, inactive_closure, topological_sort, EdgeIndex, Node, NodeKind,
    Workflow,
};

#[derive(Debug)]
pub struct ExecutionPlan<'w> {
    /// Topological order (cycle members excluded)
    pub order: Vec<&'w Node>,
    /// Inactive nodes and everything downstream of them
    pub skipped: FxHashSet<&'w str>,
    /// Nodes the sort could not place, in list order
    pub dropped: Vec<&'w Node>,
    /// One concrete cycle, if the graph has any
    pub cycle: Option<Vec<String>>,
}

impl<'w> ExecutionPlan<'w> {
    pub fn build(workflow: &'w Workflow, index: &EdgeIndex<'w>) -> Self {
        let order = topological_sort(&workflow.nodes, index);
        let dropped = dropped_nodes(&workflow.nodes, &order);
        let cycle = if dropped.is_empty() {
            None
        } else {
            find_cycle(&workflow.nodes, index)
        };
        let skipped = inactive_closure(&workflow.nodes, index);

        debug!(
            order = ?order.iter().map(|n| n.id.as_str()).collect::<Vec<_>>(),
            skipped = skipped.len(),
            dropped = dropped.len(),
            "execution plan"
        );

        Self {
            order,
            skipped,
            dropped,
            cycle,
        }
    }

    /// Apply the cycle policy: `Reject` refuses any graph the sort could not
    /// fully order, `Skip` logs and lets the ordered subset run.
    pub fn enforce(&self, policy: CyclePolicy) -> Result<()> {
        if self.dropped.is_empty() {
            return Ok(());
        }

        match policy {
            CyclePolicy::Reject => match &self.cycle {
                Some(cycle) => Err(FlowError::CycleDetected {
                    cycle: cycle.join(" → "),
                }),
                None => Err(FlowError::UnreachableNodes {
                    nodes: self.dropped_ids(),
                }),
            },
            CyclePolicy::Skip => {
                warn!(nodes = ?self.dropped_ids(), "nodes in or behind a cycle will not run");
                Ok(())
            }
        }
    }

    pub fn dropped_ids(&self) -> Vec<String> {
        self.dropped.iter().map(|n| n.id.clone()).collect()
    }

    /// Ordered nodes that will actually execute
    pub fn runnable(&self) -> impl Iterator<Item = &'w Node> + '_ {
        self.order
            .iter()
            .copied()
            .filter(|n| !self.skipped.contains(n.id.as_str()))
    }

    /// Whether any runnable node needs the shell
    pub fn needs_shell(&self) -> bool {
        self.runnable().any(|n| matches!(n.kind, NodeKind::Cli(_)))
    }
}
