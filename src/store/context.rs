//! ExecutionContext - run-scoped node outputs
//!
//! Written once per node by the orchestrator after the node's executor
//! resolves, read by descendants through the combiner. Owned by exactly
//! one run, so no interior locking.

use rustc_hash::FxHashMap;

use crate::error::{FlowError, Result};

#[derive(Debug, Default, Clone)]
pub struct ExecutionContext {
    outputs: FxHashMap<String, String>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a node's output. A second write for the same node is refused.
    pub fn record(&mut self, node_id: impl Into<String>, output: impl Into<String>) -> Result<()> {
        let node_id = node_id.into();
        if self.outputs.contains_key(&node_id) {
            return Err(FlowError::OutputAlreadyRecorded { node_id });
        }
        self.outputs.insert(node_id, output.into());
        Ok(())
    }

    #[inline]
    pub fn get(&self, node_id: &str) -> Option<&str> {
        self.outputs.get(node_id).map(String::as_str)
    }

    #[inline]
    pub fn contains(&self, node_id: &str) -> bool {
        self.outputs.contains_key(node_id)
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Consume the context, keeping only the outputs
    pub fn into_outputs(self) -> FxHashMap<String, String> {
        self.outputs
    }
}
