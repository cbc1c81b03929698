//! CLI nodes: run a command in the run's persistent shell
//!
//! Order matters: parent outputs are escaped, then substituted, then the
//! rendered command is sanitized. Approval and the denylist always see the
//! final command string, never the template.

use std::path::Path;

use tracing::{debug, warn};

use crate::binding::{denied_prefix, render, sanitize_command, Escaping};
use crate::client::ApprovalResponse;
use crate::event::{NodeStatus, WorkflowMessage};
use crate::graph::{CliData, Node};

use super::{NodeEnv, NodeFailure};

pub(super) async fn execute(
    node: &Node,
    data: &CliData,
    env: &NodeEnv<'_, '_>,
) -> Result<String, NodeFailure> {
    if !env.config.workspace.trusted {
        return Err(NodeFailure::configuration(
            "workspace is not trusted; shell commands are disabled",
        ));
    }

    let shell = env
        .shell
        .session()
        .map_err(|reason| NodeFailure::configuration(format!("no shell available: {reason}")))?;

    if data.common.content.trim().is_empty() {
        return Err(NodeFailure::configuration("command is empty"));
    }

    let inputs = env.parent_outputs(&node.id);
    let rendered = render(&data.common.content, &inputs, Escaping::Shell);
    let home = env.config.shell.home();
    let mut command = sanitize_command(&rendered, home.as_deref().and_then(Path::to_str));

    if command.trim().is_empty() {
        return Err(NodeFailure::configuration("command is empty after substitution"));
    }

    if data.needs_user_approval {
        command = approve(node, command, env).await?;
    }

    let command = command.trim();
    if let Some(prefix) = denied_prefix(command, &env.config.shell.denied_commands) {
        warn!(command, prefix, "denied command");
        return Err(NodeFailure::policy(format!(
            "'{command}' starts with denied command '{prefix}'"
        )));
    }

    debug!(command, "running command");
    match shell.execute(command, env.cancel).await {
        Ok(output) => Ok(output),
        Err(_) if env.cancel.is_cancelled() => Err(NodeFailure::cancelled(format!(
            "command in '{}' was interrupted",
            node.title()
        ))),
        Err(e) => Err(NodeFailure::transport(format!(
            "command in '{}' ({}) failed: {e}",
            node.title(),
            node.id
        ))),
    }
}

/// Emit `pending_approval` and wait for the user. A replacement command
/// from the user supersedes `proposed`.
async fn approve(node: &Node, proposed: String, env: &NodeEnv<'_, '_>) -> Result<String, NodeFailure> {
    let Some(handler) = env.collaborators.approval.as_ref() else {
        return Err(NodeFailure::policy(
            "command needs approval but no approval handler is configured",
        ));
    };

    env.sink.send(WorkflowMessage::status_with(
        node.id.as_str(),
        NodeStatus::PendingApproval,
        proposed.clone(),
    ));

    let response = tokio::select! {
        biased;
        _ = env.cancel.cancelled() => {
            return Err(NodeFailure::cancelled("run aborted while waiting for approval"));
        }
        response = handler.request_approval(&node.id, &proposed) => response,
    };

    match response {
        Ok(ApprovalResponse {
            command: Some(replacement),
        }) if !replacement.trim().is_empty() => {
            debug!(replacement = %replacement, "approved with edited command");
            Ok(replacement)
        }
        Ok(_) => Ok(proposed),
        Err(e) => Err(NodeFailure::policy(format!("approval refused: {e}"))),
    }
}
