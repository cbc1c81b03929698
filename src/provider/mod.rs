//! Chat providers
//!
//! - [`openai`]: OpenAI-compatible streaming client (`OpenAiChatClient`)
//! - [`mock`]: scripted client for tests and dry runs (`MockChatClient`)

pub mod mock;
pub mod openai;
mod sse;

use std::sync::Arc;

pub use mock::{MockChatClient, MockReply, MockRequest};
pub use openai::OpenAiChatClient;

use crate::client::ChatClient;
use crate::config::LlmConfig;
use crate::error::{FlowError, Result};

/// Create a chat client by name
///
/// # Example
/// ```rust,ignore
/// let chat = create_chat_client("openai", &config.llm)?;
/// ```
pub fn create_chat_client(name: &str, config: &LlmConfig) -> Result<Arc<dyn ChatClient>> {
    match name.to_lowercase().as_str() {
        "openai" => Ok(Arc::new(OpenAiChatClient::from_env(config)?)),
        "mock" => Ok(Arc::new(MockChatClient::new())),
        _ => Err(FlowError::Config {
            reason: format!("Unknown provider: '{name}'. Available: openai, mock"),
        }),
    }
}
