//! Input nodes: literal text, trimmed. No placeholder substitution.

use crate::graph::TextData;

use super::NodeFailure;

pub(super) fn execute(data: &TextData) -> Result<String, NodeFailure> {
    Ok(data.common.content.trim().to_string())
}
