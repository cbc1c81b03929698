//! Shared fakes for integration tests
//!
//! Every collaborator records what the engine asked of it so tests can
//! assert on side effects (commands run, approvals requested, notices shown).

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use nodeflow::client::{
    ApprovalHandler, ApprovalResponse, ContextRetriever, ContextSnippet, CorpusItem,
    CorpusResolver, CorpusState, Notifier, ShellLauncher, ShellSession,
};
use nodeflow::provider::{MockChatClient, MockReply};
use nodeflow::{Collaborators, EngineConfig, EventLog, FlowError, Result, WorkflowRunner};

// ============================================================================
// SHELL
// ============================================================================

/// Echoes each command back as its output
///
/// Commands starting with `fail` error, `hang` blocks until cancelled.
#[derive(Clone, Default)]
pub struct FakeShell {
    commands: Arc<Mutex<Vec<String>>>,
    launches: Arc<Mutex<usize>>,
    disposals: Arc<Mutex<usize>>,
}

impl FakeShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().clone()
    }

    pub fn launches(&self) -> usize {
        *self.launches.lock()
    }

    pub fn disposals(&self) -> usize {
        *self.disposals.lock()
    }
}

#[async_trait]
impl ShellSession for FakeShell {
    async fn execute(&self, command: &str, cancel: &CancellationToken) -> Result<String> {
        self.commands.lock().push(command.to_string());

        if command.starts_with("fail") {
            return Err(FlowError::Shell(format!("command exited with status 1: {command}")));
        }
        if command.starts_with("hang") {
            cancel.cancelled().await;
            return Err(FlowError::Shell("killed".to_string()));
        }
        Ok(command.to_string())
    }

    async fn dispose(&self) {
        *self.disposals.lock() += 1;
    }
}

#[async_trait]
impl ShellLauncher for FakeShell {
    async fn launch(&self) -> Result<Box<dyn ShellSession>> {
        *self.launches.lock() += 1;
        Ok(Box::new(self.clone()))
    }
}

// ============================================================================
// APPROVAL + NOTIFICATIONS
// ============================================================================

/// Answers approval requests from a fixed script
#[derive(Clone)]
pub struct ScriptedApproval {
    answer: Option<String>,
    deny: bool,
    requests: Arc<Mutex<Vec<(String, String)>>>,
}

impl ScriptedApproval {
    pub fn approve() -> Self {
        Self {
            answer: None,
            deny: false,
            requests: Arc::default(),
        }
    }

    pub fn replace(command: &str) -> Self {
        Self {
            answer: Some(command.to_string()),
            ..Self::approve()
        }
    }

    pub fn deny() -> Self {
        Self {
            deny: true,
            ..Self::approve()
        }
    }

    /// `(node_id, proposed)` pairs in request order
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl ApprovalHandler for ScriptedApproval {
    async fn request_approval(&self, node_id: &str, proposed: &str) -> Result<ApprovalResponse> {
        self.requests
            .lock()
            .push((node_id.to_string(), proposed.to_string()));

        if self.deny {
            return Err(FlowError::ApprovalDenied {
                node_id: node_id.to_string(),
                reason: "denied by test".to_string(),
            });
        }
        Ok(match &self.answer {
            Some(command) => ApprovalResponse::replace(command.clone()),
            None => ApprovalResponse::approve(),
        })
    }
}

#[derive(Clone, Default)]
pub struct RecordingNotifier {
    messages: Arc<Mutex<Vec<String>>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn error(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }
}

// ============================================================================
// RETRIEVAL
// ============================================================================

pub struct FixedCorpus(pub CorpusState);

#[async_trait]
impl CorpusResolver for FixedCorpus {
    async fn current(&self) -> CorpusState {
        self.0.clone()
    }
}

/// Returns the same snippets for every query, recording the queries
#[derive(Clone, Default)]
pub struct FixedRetriever {
    snippets: Vec<ContextSnippet>,
    queries: Arc<Mutex<Vec<String>>>,
}

impl FixedRetriever {
    pub fn new(snippets: &[(&str, &str)]) -> Self {
        Self {
            snippets: snippets
                .iter()
                .map(|(path, content)| ContextSnippet {
                    path: path.to_string(),
                    content: content.to_string(),
                })
                .collect(),
            queries: Arc::default(),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl ContextRetriever for FixedRetriever {
    async fn retrieve_context(
        &self,
        _corpus: &[CorpusItem],
        query: &str,
        _cancel: &CancellationToken,
    ) -> Result<Vec<ContextSnippet>> {
        self.queries.lock().push(query.to_string());
        Ok(self.snippets.clone())
    }
}

pub fn ready_corpus() -> CorpusState {
    CorpusState::Ready(CorpusItem {
        name: "repo".to_string(),
        uri: "https://example.com/repo".to_string(),
    })
}

// ============================================================================
// RUN HARNESS
// ============================================================================

/// A runner wired to fakes, plus handles to inspect them afterwards
pub struct TestRun {
    pub log: EventLog,
    pub shell: FakeShell,
    pub notifier: RecordingNotifier,
    pub chat: Arc<MockChatClient>,
    pub config: EngineConfig,
    approval: Option<ScriptedApproval>,
    retrieval: Option<(Arc<FixedCorpus>, Arc<FixedRetriever>)>,
}

impl TestRun {
    pub fn new() -> Self {
        let mut config = EngineConfig::default();
        config.shell.home_dir = Some("/home/tester".into());
        Self {
            log: EventLog::new(),
            shell: FakeShell::new(),
            notifier: RecordingNotifier::default(),
            chat: Arc::new(MockChatClient::new()),
            config,
            approval: None,
            retrieval: None,
        }
    }

    pub fn with_replies(mut self, replies: impl IntoIterator<Item = MockReply>) -> Self {
        self.chat = Arc::new(MockChatClient::with_replies(replies));
        self
    }

    pub fn with_chat(mut self, chat: MockChatClient) -> Self {
        self.chat = Arc::new(chat);
        self
    }

    pub fn with_approval(mut self, approval: ScriptedApproval) -> Self {
        self.approval = Some(approval);
        self
    }

    pub fn with_retrieval(mut self, corpus: CorpusState, retriever: FixedRetriever) -> Self {
        self.retrieval = Some((Arc::new(FixedCorpus(corpus)), Arc::new(retriever)));
        self
    }

    pub fn configure(mut self, f: impl FnOnce(&mut EngineConfig)) -> Self {
        f(&mut self.config);
        self
    }

    pub fn runner(&self) -> WorkflowRunner {
        let mut collaborators = Collaborators::new()
            .with_chat(self.chat.clone())
            .with_shell(Arc::new(self.shell.clone()))
            .with_notifier(Arc::new(self.notifier.clone()));
        if let Some(approval) = &self.approval {
            collaborators = collaborators.with_approval(Arc::new(approval.clone()));
        }
        if let Some((corpus, retriever)) = &self.retrieval {
            collaborators = collaborators.with_retrieval(corpus.clone(), retriever.clone());
        }
        WorkflowRunner::new(self.config.clone(), collaborators, Arc::new(self.log.clone()))
    }
}
