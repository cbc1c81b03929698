//! Error types with fix suggestions
//!
//! Error code ranges:
//! - FLOW-000-009: Workflow file / parse errors
//! - FLOW-010-019: Graph structure errors
//! - FLOW-020-029: Configuration / run state errors
//! - FLOW-030-039: Collaborator errors (provider, shell, approval, retrieval)
//!
//! Node-level failures (a single node's executor failing) are not `FlowError`s;
//! see [`crate::executor::NodeFailure`].

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FlowError>;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

#[derive(Error, Debug)]
pub enum FlowError {
    // ─────────────────────────────────────────────────────────────
    // Workflow file errors (FLOW-000 to FLOW-009)
    // ─────────────────────────────────────────────────────────────
    #[error("[FLOW-001] YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("[FLOW-002] JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("[FLOW-003] IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("[FLOW-004] Unsupported workflow file '{path}' (expected .yaml, .yml or .json)")]
    UnsupportedFormat { path: String },

    // ─────────────────────────────────────────────────────────────
    // Graph errors (FLOW-010 to FLOW-019)
    // ─────────────────────────────────────────────────────────────
    #[error("[FLOW-010] Cycle detected in workflow graph: {cycle}")]
    CycleDetected { cycle: String },

    #[error("[FLOW-011] Duplicate node id '{node_id}'")]
    DuplicateNode { node_id: String },

    #[error("[FLOW-012] Nodes never became ready: {}", .nodes.join(", "))]
    UnreachableNodes { nodes: Vec<String> },

    #[error("[FLOW-013] Output for node '{node_id}' was already recorded")]
    OutputAlreadyRecorded { node_id: String },

    // ─────────────────────────────────────────────────────────────
    // Configuration / state errors (FLOW-020 to FLOW-029)
    // ─────────────────────────────────────────────────────────────
    #[error("[FLOW-020] Configuration error: {reason}")]
    Config { reason: String },

    #[error("[FLOW-021] Invalid run state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    // ─────────────────────────────────────────────────────────────
    // Collaborator errors (FLOW-030 to FLOW-039)
    // ─────────────────────────────────────────────────────────────
    #[error("[FLOW-030] Provider error: {0}")]
    Provider(String),

    #[error("[FLOW-031] Shell error: {0}")]
    Shell(String),

    #[error("[FLOW-032] Approval for node '{node_id}' was not granted: {reason}")]
    ApprovalDenied { node_id: String, reason: String },

    #[error("[FLOW-033] Context retrieval failed: {0}")]
    Retrieval(String),
}

impl FixSuggestion for FlowError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            FlowError::YamlParse(_) => Some("Check YAML syntax: indentation and quoting"),
            FlowError::JsonParse(_) => Some("Check the JSON document is well formed"),
            FlowError::Io(_) => Some("Check file path and permissions"),
            FlowError::UnsupportedFormat { .. } => {
                Some("Rename the workflow file with a .yaml or .json extension")
            }
            FlowError::CycleDetected { .. } => {
                Some("Remove one edge of the cycle, or set graph.cycle_policy = \"skip\"")
            }
            FlowError::DuplicateNode { .. } => Some("Give every node a unique id"),
            FlowError::UnreachableNodes { .. } => {
                Some("Check every edge source refers to an existing node")
            }
            FlowError::OutputAlreadyRecorded { .. } => None,
            FlowError::Config { .. } => Some("Check ~/.config/nodeflow/config.toml"),
            FlowError::InvalidTransition { .. } => None,
            FlowError::Provider(_) => {
                Some("Check OPENAI_API_KEY is set and llm.base_url is reachable")
            }
            FlowError::Shell(_) => Some("Check shell.program points to a working shell"),
            FlowError::ApprovalDenied { .. } => {
                Some("Approve the command, or edit it before approving")
            }
            FlowError::Retrieval(_) => Some("Check the context retrieval service is available"),
        }
    }
}
