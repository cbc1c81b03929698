//! Collaborators consumed by the engine
//!
//! The engine owns no transport of its own: chat completion, context
//! retrieval, the shell and user approval are all injected through the
//! traits below and bundled in [`Collaborators`].

mod approval;
mod chat;
mod retrieval;
mod shell;

use std::sync::Arc;

pub use approval::{ApprovalHandler, ApprovalResponse, NoopNotifier, Notifier, TracingNotifier};
pub use chat::{ChatClient, ChatEvent, ChatMessage, ChatOptions, ChatRole, ChatStream};
pub use retrieval::{ContextRetriever, ContextSnippet, CorpusItem, CorpusResolver, CorpusState};
pub use shell::{ShellLauncher, ShellSession};

/// Everything a run may call out to. Missing collaborators make the nodes
/// that need them fail (CLI, LLM) or yield empty output (SearchContext).
#[derive(Clone)]
pub struct Collaborators {
    pub chat: Option<Arc<dyn ChatClient>>,
    pub retriever: Option<Arc<dyn ContextRetriever>>,
    pub corpus: Option<Arc<dyn CorpusResolver>>,
    pub shell: Option<Arc<dyn ShellLauncher>>,
    pub approval: Option<Arc<dyn ApprovalHandler>>,
    pub notifier: Arc<dyn Notifier>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            chat: None,
            retriever: None,
            corpus: None,
            shell: None,
            approval: None,
            notifier: Arc::new(NoopNotifier),
        }
    }
}

impl Collaborators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chat(mut self, chat: Arc<dyn ChatClient>) -> Self {
        self.chat = Some(chat);
        self
    }

    pub fn with_retrieval(
        mut self,
        corpus: Arc<dyn CorpusResolver>,
        retriever: Arc<dyn ContextRetriever>,
    ) -> Self {
        self.corpus = Some(corpus);
        self.retriever = Some(retriever);
        self
    }

    pub fn with_shell(mut self, launcher: Arc<dyn ShellLauncher>) -> Self {
        self.shell = Some(launcher);
        self
    }

    pub fn with_approval(mut self, handler: Arc<dyn ApprovalHandler>) -> Self {
        self.approval = Some(handler);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("chat", &self.chat.is_some())
            .field("retriever", &self.retriever.is_some())
            .field("corpus", &self.corpus.is_some())
            .field("shell", &self.shell.is_some())
            .field("approval", &self.approval.is_some())
            .finish()
    }
}
