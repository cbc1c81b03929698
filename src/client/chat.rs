//! Chat-completion client abstraction
//!
//! Implementations:
//! - [`OpenAiChatClient`](crate::provider::OpenAiChatClient): OpenAI-compatible SSE streaming
//! - [`MockChatClient`](crate::provider::MockChatClient): scripted replies for tests

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    Human,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            text: text.into(),
        }
    }

    pub fn human(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Human,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            text: text.into(),
        }
    }
}

/// Generation parameters for one request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatOptions {
    /// Explicit model; `None` lets the client pick (respecting `fast`)
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    /// Prefer a faster/cheaper model
    pub fast: bool,
}

/// One item of a streamed completion
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// New text (delta since the previous `Change`)
    Change(String),
    /// Stream finished normally
    Complete,
    /// Stream failed; no further events follow
    Error(String),
}

pub type ChatStream = BoxStream<'static, ChatEvent>;

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Start a streaming completion
    ///
    /// The returned stream must end (with `Error` or by closing) soon after
    /// `cancel` fires. Errors returned here mean the request never started.
    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        options: ChatOptions,
        cancel: CancellationToken,
    ) -> Result<ChatStream>;
}
