//! OpenAI-compatible chat client (streaming)
//!
//! POSTs to `{base_url}/chat/completions` with `stream: true` and turns
//! the SSE deltas into [`ChatEvent`]s. Works with any server speaking the
//! same protocol (local model servers included).
//! Requires `OPENAI_API_KEY` environment variable.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::sse::{SseEvent, SseParser};
use crate::client::{ChatClient, ChatEvent, ChatMessage, ChatOptions, ChatRole, ChatStream};
use crate::config::LlmConfig;
use crate::error::{FlowError, Result};

pub struct OpenAiChatClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    fast_model: String,
}

impl OpenAiChatClient {
    /// Reads `OPENAI_API_KEY` from environment
    pub fn from_env(config: &LlmConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| FlowError::Config {
                reason: "OPENAI_API_KEY environment variable not set".to_string(),
            })?;
        Self::with_api_key(api_key, config)
    }

    pub fn with_api_key(api_key: impl Into<String>, config: &LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("nodeflow/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FlowError::Provider(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            fast_model: config.fast_model.clone(),
        })
    }

    fn model_for<'a>(&'a self, options: &'a ChatOptions) -> &'a str {
        match &options.model {
            Some(model) => model.as_str(),
            None if options.fast => self.fast_model.as_str(),
            None => self.model.as_str(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
// WIRE TYPES
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> From<&'a ChatMessage> for WireMessage<'a> {
    fn from(msg: &'a ChatMessage) -> Self {
        let role = match msg.role {
            ChatRole::System => "system",
            ChatRole::Human => "user",
            ChatRole::Assistant => "assistant",
        };
        Self {
            role,
            content: &msg.text,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChunkResponse {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Map one SSE event to chat events
fn parse_event(event: &SseEvent) -> Vec<ChatEvent> {
    if event.data.trim() == "[DONE]" {
        return vec![ChatEvent::Complete];
    }
    match serde_json::from_str::<ChunkResponse>(&event.data) {
        Ok(chunk) => chunk
            .choices
            .into_iter()
            .filter_map(|c| c.delta.content)
            .filter(|s| !s.is_empty())
            .map(ChatEvent::Change)
            .collect(),
        Err(e) => {
            warn!(data = %event.data, error = %e, "failed to parse SSE chunk");
            Vec::new()
        }
    }
}

// ═══════════════════════════════════════════════════════════════
// STREAM
// ═══════════════════════════════════════════════════════════════

struct StreamState {
    bytes: BoxStream<'static, reqwest::Result<Bytes>>,
    parser: SseParser,
    pending: VecDeque<ChatEvent>,
    cancel: CancellationToken,
    finished: bool,
}

enum Next {
    Cancelled,
    Bytes(Option<reqwest::Result<Bytes>>),
}

fn event_stream(state: StreamState) -> ChatStream {
    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(event) = state.pending.pop_front() {
                if matches!(event, ChatEvent::Complete | ChatEvent::Error(_)) {
                    state.finished = true;
                    state.pending.clear();
                }
                return Some((event, state));
            }
            if state.finished {
                return None;
            }

            let next = tokio::select! {
                biased;
                _ = state.cancel.cancelled() => Next::Cancelled,
                chunk = state.bytes.next() => Next::Bytes(chunk),
            };

            match next {
                Next::Cancelled => {
                    state.pending.push_back(ChatEvent::Error("aborted".to_string()));
                }
                Next::Bytes(Some(Ok(bytes))) => {
                    for event in state.parser.feed(&bytes) {
                        state.pending.extend(parse_event(&event));
                    }
                }
                Next::Bytes(Some(Err(e))) => {
                    state.pending.push_back(ChatEvent::Error(e.to_string()));
                }
                // connection closed without [DONE]
                Next::Bytes(None) => state.pending.push_back(ChatEvent::Complete),
            }
        }
    })
    .boxed()
}

#[async_trait]
impl ChatClient for OpenAiChatClient {
    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        options: ChatOptions,
        cancel: CancellationToken,
    ) -> Result<ChatStream> {
        let model = self.model_for(&options);
        let body = ChatRequest {
            model,
            messages: messages.iter().map(WireMessage::from).collect(),
            stream: true,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        };
        let url = format!("{}/chat/completions", self.base_url);
        debug!(%url, model, "chat request");

        let send = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send();

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FlowError::Provider("request aborted".into())),
            response = send => response.map_err(|e| FlowError::Provider(e.to_string()))?,
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            return Err(FlowError::Provider(format!("HTTP {status}: {body}")));
        }

        Ok(event_stream(StreamState {
            bytes: response.bytes_stream().boxed(),
            parser: SseParser::new(),
            pending: VecDeque::new(),
            cancel,
            finished: false,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sse(data: &str) -> SseEvent {
        SseEvent {
            event_type: None,
            data: data.to_string(),
        }
    }

    #[test]
    fn parses_content_delta() {
        let events = parse_event(&sse(
            r#"{"choices":[{"index":0,"delta":{"content":"Hel"}}]}"#,
        ));
        assert_eq!(events, vec![ChatEvent::Change("Hel".into())]);
    }

    #[test]
    fn role_only_delta_is_skipped() {
        let events = parse_event(&sse(r#"{"choices":[{"delta":{"role":"assistant"}}]}"#));
        assert!(events.is_empty());
    }

    #[test]
    fn done_completes() {
        assert_eq!(parse_event(&sse("[DONE]")), vec![ChatEvent::Complete]);
    }

    #[test]
    fn garbage_is_ignored() {
        assert!(parse_event(&sse("not json")).is_empty());
    }

    #[test]
    fn wire_roles() {
        let msg = ChatMessage::human("hi");
        let wire = WireMessage::from(&msg);
        assert_eq!(wire.role, "user");
        assert_eq!(wire.content, "hi");

        let roles: Vec<&str> = [
            ChatMessage::system("rules"),
            ChatMessage::assistant("earlier answer"),
        ]
        .iter()
        .map(|m| WireMessage::from(m).role)
        .collect();
        assert_eq!(roles, vec!["system", "assistant"]);
    }

    #[test]
    fn model_selection() {
        let config = LlmConfig::default();
        let client = OpenAiChatClient::with_api_key("sk-test", &config).unwrap();

        assert_eq!(client.model_for(&ChatOptions::default()), config.model);
        let fast = ChatOptions {
            fast: true,
            ..Default::default()
        };
        assert_eq!(client.model_for(&fast), config.fast_model);
        let explicit = ChatOptions {
            model: Some("custom".into()),
            fast: true,
            ..Default::default()
        };
        assert_eq!(client.model_for(&explicit), "custom");
    }

    #[tokio::test]
    async fn stream_maps_bytes_to_events() {
        let chunks: Vec<reqwest::Result<Bytes>> = vec![
            Ok(Bytes::from_static(b"data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n\n")),
            Ok(Bytes::from_static(b"data: {\"choices\":[{\"delta\":{\"content\":\"b\"}}]}\n\ndata: [DONE]\n\n")),
        ];
        let stream = event_stream(StreamState {
            bytes: stream::iter(chunks).boxed(),
            parser: SseParser::new(),
            pending: VecDeque::new(),
            cancel: CancellationToken::new(),
            finished: false,
        });

        let events: Vec<ChatEvent> = stream.collect().await;
        assert_eq!(
            events,
            vec![
                ChatEvent::Change("a".into()),
                ChatEvent::Change("b".into()),
                ChatEvent::Complete
            ]
        );
    }

    #[tokio::test]
    async fn cancelled_stream_ends_with_error() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let stream = event_stream(StreamState {
            bytes: stream::pending().boxed(),
            parser: SseParser::new(),
            pending: VecDeque::new(),
            cancel,
            finished: false,
        });

        let events: Vec<ChatEvent> = stream.collect().await;
        assert_eq!(events, vec![ChatEvent::Error("aborted".into())]);
    }
}
