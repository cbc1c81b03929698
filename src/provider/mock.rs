//! Mock chat client for testing
//!
//! Returns scripted replies without making API calls. Replies are queued
//! (FIFO); once the queue is empty every request gets the default reply.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::client::{ChatClient, ChatEvent, ChatMessage, ChatOptions, ChatStream};
use crate::error::{FlowError, Result};

/// One scripted reply
#[derive(Debug, Clone, PartialEq)]
pub enum MockReply {
    /// Single `Change` then `Complete`
    Text(String),
    /// One `Change` per chunk then `Complete`
    Chunks(Vec<String>),
    /// `chunk` repeated `times`, with no `Complete` until the end
    Repeat { chunk: String, times: usize },
    /// `chat` itself fails (request never starts)
    Fail(String),
    /// Chunks, then `Error`
    StreamError { chunks: Vec<String>, error: String },
    /// No events until cancelled, then `Error("aborted")`
    Hang,
}

/// A request as seen by the mock
#[derive(Debug, Clone, PartialEq)]
pub struct MockRequest {
    pub messages: Vec<ChatMessage>,
    pub options: ChatOptions,
}

pub struct MockChatClient {
    replies: Mutex<VecDeque<MockReply>>,
    default_reply: MockReply,
    chunk_delay: Option<Duration>,
    requests: Arc<Mutex<Vec<MockRequest>>>,
}

impl MockChatClient {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            default_reply: MockReply::Text("Mock response".to_string()),
            chunk_delay: None,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_replies(replies: impl IntoIterator<Item = MockReply>) -> Self {
        let client = Self::new();
        client.replies.lock().extend(replies);
        client
    }

    pub fn with_default(mut self, reply: MockReply) -> Self {
        self.default_reply = reply;
        self
    }

    /// Sleep between streamed events
    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = Some(delay);
        self
    }

    pub fn queue_reply(&self, reply: MockReply) {
        self.replies.lock().push_back(reply);
    }

    pub fn requests(&self) -> Vec<MockRequest> {
        self.requests.lock().clone()
    }

    pub fn last_request(&self) -> Option<MockRequest> {
        self.requests.lock().last().cloned()
    }

    fn next_reply(&self) -> MockReply {
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.default_reply.clone())
    }
}

impl Default for MockChatClient {
    fn default() -> Self {
        Self::new()
    }
}

fn scripted(events: Vec<ChatEvent>, delay: Option<Duration>) -> ChatStream {
    stream::iter(events)
        .then(move |event| async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            event
        })
        .boxed()
}

#[async_trait]
impl ChatClient for MockChatClient {
    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        options: ChatOptions,
        cancel: CancellationToken,
    ) -> Result<ChatStream> {
        self.requests.lock().push(MockRequest { messages, options });

        let stream = match self.next_reply() {
            MockReply::Text(text) => {
                scripted(vec![ChatEvent::Change(text), ChatEvent::Complete], self.chunk_delay)
            }
            MockReply::Chunks(chunks) => {
                let mut events: Vec<ChatEvent> = chunks.into_iter().map(ChatEvent::Change).collect();
                events.push(ChatEvent::Complete);
                scripted(events, self.chunk_delay)
            }
            MockReply::Repeat { chunk, times } => {
                let changes = stream::repeat(ChatEvent::Change(chunk)).take(times);
                let delay = self.chunk_delay;
                changes
                    .chain(stream::once(async { ChatEvent::Complete }))
                    .then(move |event| async move {
                        if let Some(delay) = delay {
                            tokio::time::sleep(delay).await;
                        }
                        event
                    })
                    .boxed()
            }
            MockReply::Fail(reason) => return Err(FlowError::Provider(reason)),
            MockReply::StreamError { chunks, error } => {
                let mut events: Vec<ChatEvent> = chunks.into_iter().map(ChatEvent::Change).collect();
                events.push(ChatEvent::Error(error));
                scripted(events, self.chunk_delay)
            }
            MockReply::Hang => stream::once(async move {
                cancel.cancelled().await;
                ChatEvent::Error("aborted".to_string())
            })
            .boxed(),
        };

        Ok(stream)
    }
}
