//! Run-level failure policy
//!
//! Every node failure reaches the runner as a [`NodeFailure`]; this decides
//! whether the run halts or moves on to the next node.

use serde::{Deserialize, Serialize};

use crate::executor::{FailureKind, NodeFailure};
use crate::graph::{Node, NodeType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureAction {
    /// Stop the run; no further nodes execute
    Halt,
    /// Report the failure and keep going
    Continue,
}

/// Default action per node kind (`[failure]` in config.toml)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FailurePolicy {
    pub cli: FailureAction,
    pub llm: FailureAction,
    pub preview: FailureAction,
    pub input: FailureAction,
    pub search_context: FailureAction,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        Self {
            // the shell session is stateful and may be left inconsistent
            cli: FailureAction::Halt,
            llm: FailureAction::Continue,
            preview: FailureAction::Continue,
            input: FailureAction::Continue,
            search_context: FailureAction::Continue,
        }
    }
}

impl FailurePolicy {
    pub fn default_for(&self, node_type: NodeType) -> FailureAction {
        match node_type {
            NodeType::Cli => self.cli,
            NodeType::Llm => self.llm,
            NodeType::Preview => self.preview,
            NodeType::Input => self.input,
            NodeType::SearchContext => self.search_context,
        }
    }

    /// Cancellation always halts; otherwise the node's `haltOnFailure`
    /// wins over the per-kind default.
    pub fn action_for(&self, node: &Node, failure: &NodeFailure) -> FailureAction {
        if failure.kind == FailureKind::Cancelled {
            return FailureAction::Halt;
        }
        match node.common().halt_on_failure {
            Some(true) => FailureAction::Halt,
            Some(false) => FailureAction::Continue,
            None => self.default_for(node.node_type()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_halt_only_cli() {
        let policy = FailurePolicy::default();
        let failure = NodeFailure::transport("boom");

        assert_eq!(
            policy.action_for(&Node::cli("c", "ls"), &failure),
            FailureAction::Halt
        );
        assert_eq!(
            policy.action_for(&Node::llm("l", "hi"), &failure),
            FailureAction::Continue
        );
    }

    #[test]
    fn node_override_beats_default() {
        let policy = FailurePolicy::default();
        let failure = NodeFailure::transport("boom");

        let lenient_cli = Node::cli("c", "ls").with_halt_on_failure(false);
        assert_eq!(policy.action_for(&lenient_cli, &failure), FailureAction::Continue);

        let strict_llm = Node::llm("l", "hi").with_halt_on_failure(true);
        assert_eq!(policy.action_for(&strict_llm, &failure), FailureAction::Halt);
    }

    #[test]
    fn cancellation_always_halts() {
        let policy = FailurePolicy::default();
        let node = Node::llm("l", "hi").with_halt_on_failure(false);
        assert_eq!(
            policy.action_for(&node, &NodeFailure::cancelled("aborted")),
            FailureAction::Halt
        );
    }

    #[test]
    fn parses_from_toml() {
        let policy: FailurePolicy = toml::from_str("llm = \"halt\"").unwrap();
        assert_eq!(policy.llm, FailureAction::Halt);
        assert_eq!(policy.cli, FailureAction::Halt);
        assert_eq!(policy.preview, FailureAction::Continue);
    }
}
