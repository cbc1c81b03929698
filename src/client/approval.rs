//! User approval for CLI commands, plus user-facing notifications

use async_trait::async_trait;

use crate::error::Result;

/// Reply to an approval request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApprovalResponse {
    /// Replacement command; supersedes the proposed one when present
    pub command: Option<String>,
}

impl ApprovalResponse {
    pub fn approve() -> Self {
        Self::default()
    }

    pub fn replace(command: impl Into<String>) -> Self {
        Self {
            command: Some(command.into()),
        }
    }
}

#[async_trait]
pub trait ApprovalHandler: Send + Sync {
    /// Ask the user to approve `proposed` for `node_id`
    ///
    /// Refusal is reported as an `Err` (typically `FlowError::ApprovalDenied`).
    async fn request_approval(&self, node_id: &str, proposed: &str) -> Result<ApprovalResponse>;
}

/// Editor-level notifications (shown to the user, not part of the event stream)
pub trait Notifier: Send + Sync {
    fn error(&self, message: &str);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn error(&self, _message: &str) {}
}

/// Forwards notifications to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn error(&self, message: &str) {
        tracing::error!(target: "nodeflow::notify", "{message}");
    }
}
