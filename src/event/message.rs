//! Reporting-channel messages
//!
//! Wire shape (JSON, `type` tag):
//! ```text
//! {"type":"execution_started"}
//! {"type":"node_execution_status","nodeId":"n1","status":"completed","result":"..."}
//! {"type":"token_count","nodeId":"n2","count":3}
//! {"type":"execution_completed"}
//! ```

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Per-node status carried by `node_execution_status`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Running,
    PendingApproval,
    Completed,
    Error,
    Interrupted,
}

impl NodeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeStatus::Running => "running",
            NodeStatus::PendingApproval => "pending_approval",
            NodeStatus::Completed => "completed",
            NodeStatus::Error => "error",
            NodeStatus::Interrupted => "interrupted",
        }
    }

    /// Terminal for the node (no further status follows)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            NodeStatus::Completed | NodeStatus::Error | NodeStatus::Interrupted
        )
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uses Arc<str> for node ids so statuses for the same node share one allocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowMessage {
    ExecutionStarted,
    NodeExecutionStatus {
        #[serde(rename = "nodeId")]
        node_id: Arc<str>,
        status: NodeStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<String>,
    },
    TokenCount {
        #[serde(rename = "nodeId")]
        node_id: Arc<str>,
        count: usize,
    },
    ExecutionCompleted,
}

impl WorkflowMessage {
    pub fn status(node_id: impl Into<Arc<str>>, status: NodeStatus) -> Self {
        Self::NodeExecutionStatus {
            node_id: node_id.into(),
            status,
            result: None,
        }
    }

    pub fn status_with(
        node_id: impl Into<Arc<str>>,
        status: NodeStatus,
        result: impl Into<String>,
    ) -> Self {
        Self::NodeExecutionStatus {
            node_id: node_id.into(),
            status,
            result: Some(result.into()),
        }
    }

    pub fn token_count(node_id: impl Into<Arc<str>>, count: usize) -> Self {
        Self::TokenCount {
            node_id: node_id.into(),
            count,
        }
    }

    /// Node id if the message is node-related
    pub fn node_id(&self) -> Option<&str> {
        match self {
            Self::NodeExecutionStatus { node_id, .. } | Self::TokenCount { node_id, .. } => {
                Some(node_id)
            }
            Self::ExecutionStarted | Self::ExecutionCompleted => None,
        }
    }

    /// Check if this is a run-level message
    pub fn is_run_event(&self) -> bool {
        matches!(self, Self::ExecutionStarted | Self::ExecutionCompleted)
    }
}
