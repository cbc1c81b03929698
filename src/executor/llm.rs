//! LLM nodes: stream a chat completion for the rendered prompt
//!
//! The request races a timer. Whichever settles first wins and the loser
//! is cancelled through a child token, so no stream outlives the node.

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::binding::{render, Escaping};
use crate::client::{ChatClient, ChatEvent, ChatMessage, ChatOptions};
use crate::graph::{LlmData, Node};

use super::{NodeEnv, NodeFailure};

pub(super) async fn execute(
    node: &Node,
    data: &LlmData,
    env: &NodeEnv<'_, '_>,
) -> Result<String, NodeFailure> {
    let inputs = env.parent_outputs(&node.id);
    let prompt = render(&data.common.content, &inputs, Escaping::Prompt);
    if prompt.trim().is_empty() {
        return Err(NodeFailure::configuration("prompt is empty"));
    }

    let Some(chat) = env.collaborators.chat.as_ref() else {
        return Err(NodeFailure::configuration("no chat client is configured"));
    };

    let llm = &env.config.llm;
    let messages = vec![
        ChatMessage::system(llm.system_preamble.as_str()),
        ChatMessage::human(prompt),
    ];
    let options = ChatOptions {
        model: data.model.clone(),
        max_tokens: data.max_tokens,
        temperature: data.temperature,
        fast: data.fast,
    };

    let request = env.cancel.child_token();
    let outcome = tokio::time::timeout(
        llm.timeout(),
        stream_response(
            chat.as_ref(),
            messages,
            options,
            request.clone(),
            llm.max_response_chars,
        ),
    )
    .await;
    request.cancel();

    match outcome {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(_)) if env.cancel.is_cancelled() => Err(aborted()),
        Ok(Err(failure)) => {
            warn!(error = %failure, "LLM request failed");
            Err(NodeFailure::new(
                failure.kind,
                format!("'{}' ({}): {}", node.title(), node.id, failure.message),
            ))
        }
        Err(_) if env.cancel.is_cancelled() => Err(aborted()),
        Err(_) => Err(NodeFailure::timeout(format!(
            "'{}' got no complete response within {}s",
            node.title(),
            llm.timeout_secs
        ))),
    }
}

fn aborted() -> NodeFailure {
    NodeFailure::cancelled("LLM request aborted")
}

/// Collect the streamed deltas, stopping at `limit` characters
async fn stream_response(
    chat: &dyn ChatClient,
    messages: Vec<ChatMessage>,
    options: ChatOptions,
    cancel: CancellationToken,
    limit: usize,
) -> Result<String, NodeFailure> {
    let mut stream = chat
        .chat(messages, options, cancel.clone())
        .await
        .map_err(|e| NodeFailure::transport(e.to_string()))?;

    let mut text = String::new();
    let mut chars = 0usize;
    loop {
        let event = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(aborted()),
            event = stream.next() => event,
        };

        match event {
            Some(ChatEvent::Change(delta)) => {
                chars += delta.chars().count();
                if chars > limit {
                    return Err(NodeFailure::too_large(format!(
                        "response exceeded {limit} characters"
                    )));
                }
                text.push_str(&delta);
            }
            Some(ChatEvent::Complete) | None => break,
            Some(ChatEvent::Error(e)) => return Err(NodeFailure::transport(e)),
        }
    }

    debug!(chars, "LLM response complete");
    Ok(text)
}
