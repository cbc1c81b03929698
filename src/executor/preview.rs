//! Preview nodes: pass the combined input through and report its size

use tracing::debug;

use crate::event::WorkflowMessage;
use crate::graph::Node;
use crate::tokens::count_tokens;

use super::{NodeEnv, NodeFailure};

pub(super) fn execute(node: &Node, env: &NodeEnv<'_, '_>) -> Result<String, NodeFailure> {
    let text = env.parent_outputs(&node.id).join("\n").trim().to_string();
    let count = count_tokens(&text);
    debug!(count, "preview token count");

    env.sink
        .send(WorkflowMessage::token_count(node.id.as_str(), count));
    Ok(text)
}
