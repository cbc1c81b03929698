//! In-memory collaborators for executor unit tests

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::client::{
    ApprovalHandler, ApprovalResponse, Collaborators, ShellLauncher, ShellSession,
};
use crate::config::EngineConfig;
use crate::error::{FlowError, Result};
use crate::event::EventLog;
use crate::graph::{Edge, EdgeIndex, Node};
use crate::shell::ShellScope;
use crate::store::ExecutionContext;

use super::{execute_node, NodeEnv, NodeFailure};

/// Echoes each command back. `fail ...` errors, `hang` waits for cancel.
#[derive(Clone, Default)]
pub struct EchoShell {
    pub commands: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl ShellSession for EchoShell {
    async fn execute(&self, command: &str, cancel: &CancellationToken) -> Result<String> {
        if command.starts_with("hang") {
            cancel.cancelled().await;
            return Err(FlowError::Shell("killed".into()));
        }
        self.commands.lock().push(command.to_string());
        if command.starts_with("fail") {
            return Err(FlowError::Shell("exit status 1".into()));
        }
        Ok(command.to_string())
    }

    async fn dispose(&self) {}
}

#[async_trait]
impl ShellLauncher for EchoShell {
    async fn launch(&self) -> Result<Box<dyn ShellSession>> {
        Ok(Box::new(self.clone()))
    }
}

pub struct FixedApproval(pub Option<String>);

#[async_trait]
impl ApprovalHandler for FixedApproval {
    async fn request_approval(&self, _node_id: &str, _proposed: &str) -> Result<ApprovalResponse> {
        Ok(ApprovalResponse {
            command: self.0.clone(),
        })
    }
}

pub struct Harness {
    pub edges: Vec<Edge>,
    pub context: ExecutionContext,
    pub config: EngineConfig,
    pub collaborators: Collaborators,
    pub shell: ShellScope,
    pub echo: EchoShell,
    pub log: EventLog,
    pub cancel: CancellationToken,
}

impl Harness {
    pub fn new() -> Self {
        let mut config = EngineConfig::default();
        config.shell.home_dir = Some(PathBuf::from("/home/tester"));
        Self {
            edges: Vec::new(),
            context: ExecutionContext::new(),
            config,
            collaborators: Collaborators::new(),
            shell: ShellScope::empty(),
            echo: EchoShell::default(),
            log: EventLog::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub async fn with_shell() -> Self {
        let mut h = Self::new();
        let launcher: Arc<dyn ShellLauncher> = Arc::new(h.echo.clone());
        h.shell = ShellScope::acquire(Some(&launcher), true).await;
        h
    }

    pub fn approving_with(mut self, replacement: Option<&str>) -> Self {
        self.collaborators.approval = Some(Arc::new(FixedApproval(
            replacement.map(str::to_string),
        )));
        self
    }

    pub fn record(&mut self, node_id: &str, output: &str) {
        self.context.record(node_id, output).unwrap();
    }

    pub fn commands(&self) -> Vec<String> {
        self.echo.commands.lock().clone()
    }

    pub async fn run(&self, node: &Node) -> std::result::Result<String, NodeFailure> {
        let index = EdgeIndex::build(&self.edges);
        let env = NodeEnv {
            index: &index,
            context: &self.context,
            config: &self.config,
            collaborators: &self.collaborators,
            shell: &self.shell,
            sink: &self.log,
            cancel: &self.cancel,
        };
        execute_node(node, &env).await
    }
}
