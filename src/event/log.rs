//! EventLog - in-memory, append-only record of reporting messages
//!
//! Each message is wrapped in an envelope with a monotonic id and the time
//! since the log was created. Used by tests and by callers that want the
//! full transcript of a run after it finishes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;

use super::message::{NodeStatus, WorkflowMessage};

#[derive(Debug, Clone, Serialize)]
pub struct Event {
    /// Monotonic sequence id
    pub id: u64,
    /// Time since log creation (ms)
    pub timestamp_ms: u64,
    #[serde(flatten)]
    pub message: WorkflowMessage,
}

/// Thread-safe, append-only message log
#[derive(Clone)]
pub struct EventLog {
    events: Arc<RwLock<Vec<Event>>>,
    start_time: Instant,
    next_id: Arc<AtomicU64>,
}

impl EventLog {
    pub fn new() -> Self {
        Self {
            events: Arc::new(RwLock::new(Vec::new())),
            start_time: Instant::now(),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Append a message, returning its id
    pub fn push(&self, message: WorkflowMessage) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let event = Event {
            id,
            timestamp_ms: self.start_time.elapsed().as_millis() as u64,
            message,
        };

        self.events.write().push(event);
        id
    }

    /// All envelopes (cloned)
    pub fn events(&self) -> Vec<Event> {
        self.events.read().clone()
    }

    /// All messages without envelopes, in emission order
    pub fn messages(&self) -> Vec<WorkflowMessage> {
        self.events
            .read()
            .iter()
            .map(|e| e.message.clone())
            .collect()
    }

    /// Status sequence reported for one node
    pub fn statuses(&self, node_id: &str) -> Vec<NodeStatus> {
        self.events
            .read()
            .iter()
            .filter_map(|e| match &e.message {
                WorkflowMessage::NodeExecutionStatus {
                    node_id: id,
                    status,
                    ..
                } if id.as_ref() == node_id => Some(*status),
                _ => None,
            })
            .collect()
    }

    /// Messages for one node (statuses and token counts)
    pub fn filter_node(&self, node_id: &str) -> Vec<WorkflowMessage> {
        self.messages()
            .into_iter()
            .filter(|m| m.node_id() == Some(node_id))
            .collect()
    }

    /// Number of `execution_completed` messages seen
    pub fn completions(&self) -> usize {
        self.events
            .read()
            .iter()
            .filter(|e| matches!(e.message, WorkflowMessage::ExecutionCompleted))
            .count()
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self.events()).unwrap_or(Value::Null)
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog")
            .field("len", &self.len())
            .finish()
    }
}
