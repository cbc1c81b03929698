//! EventSink - where reporting messages go
//!
//! Real transports (stdout JSON lines, a channel to a UI) in production,
//! `EventLog` or `NoopSink` in tests.

use tokio::sync::mpsc;

use super::log::EventLog;
use super::message::WorkflowMessage;

pub trait EventSink: Send + Sync {
    fn send(&self, message: WorkflowMessage);
}

impl EventSink for EventLog {
    fn send(&self, message: WorkflowMessage) {
        self.push(message);
    }
}

/// Forwards messages to an unbounded channel. Messages sent after the
/// receiver is dropped are discarded.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<WorkflowMessage>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<WorkflowMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn send(&self, message: WorkflowMessage) {
        if self.tx.send(message).is_err() {
            tracing::debug!("event receiver dropped, message discarded");
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn send(&self, _message: WorkflowMessage) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn sink_is_object_safe() {
        fn accepts(_: &dyn EventSink) {}
        accepts(&EventLog::new());
        accepts(&NoopSink);
    }

    #[tokio::test]
    async fn channel_sink_forwards_in_order() {
        let (sink, mut rx) = ChannelSink::new();
        let sink: Arc<dyn EventSink> = Arc::new(sink);

        sink.send(WorkflowMessage::ExecutionStarted);
        sink.send(WorkflowMessage::ExecutionCompleted);

        assert_eq!(rx.recv().await, Some(WorkflowMessage::ExecutionStarted));
        assert_eq!(rx.recv().await, Some(WorkflowMessage::ExecutionCompleted));
    }

    #[test]
    fn channel_sink_survives_dropped_receiver() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        sink.send(WorkflowMessage::ExecutionStarted);
    }
}
