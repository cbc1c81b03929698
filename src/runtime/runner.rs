//! Workflow Runner - sequential DAG execution
//!
//! One node at a time, in topological order. Each node's output is
//! recorded before the next node starts, so every node sees all of its
//! parents' outputs. Event order per run:
//!
//! ```text
//! execution_started
//!   running → [pending_approval] → completed | error | interrupted   (per node)
//! execution_completed                                               (exactly once)
//! ```
//!
//! Graph problems (duplicate ids, rejected cycles) fail before
//! `execution_started`, so no events are emitted for them.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::client::Collaborators;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::event::{EventSink, NodeStatus, WorkflowMessage};
use crate::executor::{execute_node, NodeEnv, NodeFailure};
use crate::graph::{EdgeIndex, Node, NodeKind, Workflow};
use crate::shell::ShellScope;
use crate::store::ExecutionContext;

use super::plan::ExecutionPlan;
use super::policy::FailureAction;
use super::state::RunState;

/// A node failure as recorded in the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedNode {
    pub node_id: String,
    #[serde(flatten)]
    pub failure: NodeFailure,
}

/// Outcome of one run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub state: RunState,
    /// Outputs of the nodes that completed
    pub outputs: FxHashMap<String, String>,
    /// Node failures in the order they happened
    pub failures: Vec<FailedNode>,
}

impl RunReport {
    /// Completed with no node failures
    pub fn is_success(&self) -> bool {
        self.state == RunState::Completed && self.failures.is_empty()
    }

    pub fn output(&self, node_id: &str) -> Option<&str> {
        self.outputs.get(node_id).map(String::as_str)
    }

    pub fn failure(&self, node_id: &str) -> Option<&NodeFailure> {
        self.failures
            .iter()
            .find(|f| f.node_id == node_id)
            .map(|f| &f.failure)
    }
}

/// Mutable state threaded through the node loop
struct RunScope<'r> {
    context: ExecutionContext,
    shell: ShellScope,
    failures: Vec<FailedNode>,
    cancel: &'r CancellationToken,
}

pub struct WorkflowRunner {
    config: EngineConfig,
    collaborators: Collaborators,
    sink: Arc<dyn EventSink>,
}

impl WorkflowRunner {
    pub fn new(config: EngineConfig, collaborators: Collaborators, sink: Arc<dyn EventSink>) -> Self {
        Self {
            config,
            collaborators,
            sink,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Execute `workflow` until every runnable node is visited, a node
    /// failure halts the run, or `cancel` fires.
    #[instrument(skip_all, fields(nodes = workflow.nodes.len(), edges = workflow.edges.len()))]
    pub async fn run(&self, workflow: &Workflow, cancel: CancellationToken) -> Result<RunReport> {
        workflow.validate()?;
        let index = EdgeIndex::build(&workflow.edges);
        let plan = ExecutionPlan::build(workflow, &index);
        plan.enforce(self.config.graph.cycle_policy)?;

        let state = RunState::NotStarted.transition(RunState::Running)?;
        info!("execution started");
        self.sink.send(WorkflowMessage::ExecutionStarted);

        let mut scope = RunScope {
            context: ExecutionContext::new(),
            shell: ShellScope::acquire(self.collaborators.shell.as_ref(), plan.needs_shell()).await,
            failures: Vec::new(),
            cancel: &cancel,
        };

        let outcome = self.execute_nodes(&plan, &index, &mut scope).await;

        // cleanup and the completion event happen on every path
        scope.shell.release().await;
        self.sink.send(WorkflowMessage::ExecutionCompleted);

        let state = state.transition(outcome)?;
        info!(state = %state, failures = scope.failures.len(), "execution completed");

        Ok(RunReport {
            state,
            outputs: scope.context.into_outputs(),
            failures: scope.failures,
        })
    }

    /// Node loop; returns the terminal state
    async fn execute_nodes(
        &self,
        plan: &ExecutionPlan<'_>,
        index: &EdgeIndex<'_>,
        scope: &mut RunScope<'_>,
    ) -> RunState {
        for node in &plan.order {
            if plan.skipped.contains(node.id.as_str()) {
                debug!(node_id = %node.id, "skipping inactive node");
                continue;
            }
            if scope.cancel.is_cancelled() {
                warn!(node_id = %node.id, "run aborted before node");
                return RunState::Aborted;
            }

            self.sink
                .send(WorkflowMessage::status(node.id.as_str(), NodeStatus::Running));

            let result = {
                let env = NodeEnv {
                    index,
                    context: &scope.context,
                    config: &self.config,
                    collaborators: &self.collaborators,
                    shell: &scope.shell,
                    sink: self.sink.as_ref(),
                    cancel: scope.cancel,
                };
                execute_node(node, &env).await
            };

            match result {
                Ok(output) => {
                    self.sink.send(WorkflowMessage::status_with(
                        node.id.as_str(),
                        NodeStatus::Completed,
                        output.as_str(),
                    ));
                    if let Err(e) = scope.context.record(node.id.as_str(), output) {
                        error!(error = %e, "could not record node output");
                        return RunState::Failed;
                    }
                }
                Err(failure) => {
                    if let Some(state) = self.handle_failure(node, failure, scope).await {
                        return state;
                    }
                }
            }
        }

        RunState::Completed
    }

    /// Report a node failure; `Some(state)` if the run must stop
    async fn handle_failure(
        &self,
        node: &Node,
        failure: NodeFailure,
        scope: &mut RunScope<'_>,
    ) -> Option<RunState> {
        let status = if failure.is_cancelled() {
            NodeStatus::Interrupted
        } else {
            NodeStatus::Error
        };
        self.sink.send(WorkflowMessage::status_with(
            node.id.as_str(),
            status,
            failure.message.as_str(),
        ));

        if matches!(node.kind, NodeKind::Cli(_)) {
            if !failure.is_cancelled() {
                self.collaborators
                    .notifier
                    .error(&format!("{}: {}", node.title(), failure.message));
            }
            // the session may be mid-command or in an unknown state
            scope.shell.discard(node.title()).await;
        }

        let action = self.config.failure.action_for(node, &failure);
        let cancelled = failure.is_cancelled();
        scope.failures.push(FailedNode {
            node_id: node.id.clone(),
            failure,
        });

        match action {
            FailureAction::Halt if cancelled || scope.cancel.is_cancelled() => {
                warn!(node_id = %node.id, "run aborted");
                Some(RunState::Aborted)
            }
            FailureAction::Halt => {
                error!(node_id = %node.id, "node failed, halting run");
                Some(RunState::Failed)
            }
            FailureAction::Continue => {
                warn!(node_id = %node.id, "node failed, continuing");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventLog;
    use crate::graph::Edge;

    fn runner(log: &EventLog) -> WorkflowRunner {
        WorkflowRunner::new(
            EngineConfig::default(),
            Collaborators::new(),
            Arc::new(log.clone()),
        )
    }

    #[tokio::test]
    async fn input_to_preview() {
        let log = EventLog::new();
        let workflow = Workflow::new(
            vec![Node::preview("p"), Node::input("i", " abc ")],
            vec![Edge::new("e1", "i", "p")],
        );

        let report = runner(&log)
            .run(&workflow, CancellationToken::new())
            .await
            .unwrap();

        assert!(report.is_success());
        assert_eq!(report.output("p"), Some("abc"));
        assert_eq!(
            log.statuses("p"),
            vec![NodeStatus::Running, NodeStatus::Completed]
        );
        assert_eq!(log.completions(), 1);
    }

    #[tokio::test]
    async fn duplicate_ids_fail_before_start() {
        let log = EventLog::new();
        let workflow = Workflow::new(vec![Node::input("a", "x"), Node::input("a", "y")], vec![]);

        assert!(runner(&log)
            .run(&workflow, CancellationToken::new())
            .await
            .is_err());
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn pre_cancelled_run_aborts_with_one_completion() {
        let log = EventLog::new();
        let workflow = Workflow::new(vec![Node::input("a", "x")], vec![]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = runner(&log).run(&workflow, cancel).await.unwrap();
        assert_eq!(report.state, RunState::Aborted);
        assert_eq!(
            log.messages(),
            vec![
                WorkflowMessage::ExecutionStarted,
                WorkflowMessage::ExecutionCompleted
            ]
        );
    }

    #[tokio::test]
    async fn cli_without_shell_halts() {
        let log = EventLog::new();
        let workflow = Workflow::new(
            vec![Node::cli("c", "ls"), Node::input("after", "x")],
            vec![],
        );

        let report = runner(&log)
            .run(&workflow, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.state, RunState::Failed);
        assert!(log.statuses("after").is_empty());
        assert_eq!(log.completions(), 1);
    }
}
