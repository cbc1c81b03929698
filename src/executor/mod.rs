//! Node Executors - one per node kind
//!
//! Every executor returns `Result<String, NodeFailure>`: the node's output
//! or a tagged failure. Executors never decide whether the run continues;
//! that is the runner's [`FailurePolicy`](crate::runtime::FailurePolicy).
//!
//! Status events (`running`, `completed`, `error`, `interrupted`) belong to
//! the runner. Executors only emit what is specific to their kind:
//! `pending_approval` (CLI) and `token_count` (Preview).

mod cli;
mod input;
mod llm;
mod preview;
mod search_context;
#[cfg(test)]
mod test_support;

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::binding::combine_parent_outputs_by_connection_order;
use crate::client::Collaborators;
use crate::config::EngineConfig;
use crate::event::EventSink;
use crate::graph::{EdgeIndex, Node, NodeKind};
use crate::shell::ShellScope;
use crate::store::ExecutionContext;

// ═══════════════════════════════════════════════════════════════
// FAILURES
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// No shell, untrusted workspace, empty command or prompt
    Configuration,
    /// Denylisted command, refused approval
    Policy,
    /// LLM did not finish within its time limit
    Timeout,
    /// LLM response exceeded the size ceiling
    ResponseTooLarge,
    /// Abort signal fired
    Cancelled,
    /// Shell process or completion API error
    Transport,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Configuration => "configuration",
            FailureKind::Policy => "policy",
            FailureKind::Timeout => "timeout",
            FailureKind::ResponseTooLarge => "response_too_large",
            FailureKind::Cancelled => "cancelled",
            FailureKind::Transport => "transport",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single node's failure
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{kind} failure: {message}")]
pub struct NodeFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl NodeFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Configuration, message)
    }

    pub fn policy(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Policy, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Timeout, message)
    }

    pub fn too_large(message: impl Into<String>) -> Self {
        Self::new(FailureKind::ResponseTooLarge, message)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Cancelled, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Transport, message)
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind == FailureKind::Cancelled
    }
}

// ═══════════════════════════════════════════════════════════════
// DISPATCH
// ═══════════════════════════════════════════════════════════════

/// Everything an executor may read or call during one node
pub struct NodeEnv<'r, 'g> {
    pub index: &'r EdgeIndex<'g>,
    pub context: &'r ExecutionContext,
    pub config: &'r EngineConfig,
    pub collaborators: &'r Collaborators,
    pub shell: &'r ShellScope,
    pub sink: &'r dyn EventSink,
    pub cancel: &'r CancellationToken,
}

impl NodeEnv<'_, '_> {
    /// Combined parent outputs, `${1}..${N}` in order
    pub fn parent_outputs(&self, node_id: &str) -> Vec<String> {
        combine_parent_outputs_by_connection_order(node_id, self.index, self.context)
    }
}

/// Run one node with the executor matching its kind
#[instrument(skip(node, env), fields(node_id = %node.id, node_type = %node.node_type()))]
pub async fn execute_node(node: &Node, env: &NodeEnv<'_, '_>) -> Result<String, NodeFailure> {
    debug!("executing node");
    match &node.kind {
        NodeKind::Cli(data) => cli::execute(node, data, env).await,
        NodeKind::Llm(data) => llm::execute(node, data, env).await,
        NodeKind::Preview(_) => preview::execute(node, env),
        NodeKind::Input(data) => input::execute(data),
        NodeKind::SearchContext(data) => search_context::execute(node, data, env).await,
    }
}
