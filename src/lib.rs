//! Nodeflow - DAG workflow engine for shell, LLM, preview, input and
//! search-context nodes
//!
//! ## Module Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        DOMAIN MODEL                          │
//! │  graph/     Node, Edge, Workflow + EdgeIndex, topo, inactive │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      APPLICATION LAYER                       │
//! │  runtime/   WorkflowRunner, ExecutionPlan, failure policy    │
//! │  executor/  One executor per node kind                       │
//! │  binding/   ${N} placeholders, escaping, command sanitizing  │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    INFRASTRUCTURE LAYER                      │
//! │  store/     Per-run output map (ExecutionContext)            │
//! │  event/     Status stream (WorkflowMessage, EventLog, sinks) │
//! │  client/    Collaborator traits (chat, shell, approval, ...) │
//! │  provider/  Chat clients (OpenAI-compatible SSE, mock)       │
//! │  shell/     Persistent shell session + per-run scope         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`graph`] | Graph model, adjacency index, Kahn ordering, inactive closure |
//! | [`runtime`] | Sequential execution, run state, halt/continue policy |
//! | [`executor`] | CLI, LLM, Preview, Input and SearchContext executors |
//! | [`binding`] | Parent-output combining and placeholder rendering |
//! | [`store`] | Write-once node outputs for one run |
//! | [`event`] | Messages emitted while a run progresses |
//! | [`client`] | Seams to the editor: chat, shell, approval, retrieval |
//! | [`provider`] | Chat client implementations |
//! | [`shell`] | `bash`-backed persistent session |
//! | [`tokens`] | Token counting for preview output |
//! | [`error`] | Error types with fix suggestions |

// ═══════════════════════════════════════════════════════════════
// DOMAIN MODEL - graph types and algorithms
// ═══════════════════════════════════════════════════════════════
pub mod graph;

// ═══════════════════════════════════════════════════════════════
// APPLICATION LAYER - Execution logic
// ═══════════════════════════════════════════════════════════════
pub mod binding;
pub mod executor;
pub mod runtime;

// ═══════════════════════════════════════════════════════════════
// INFRASTRUCTURE LAYER - Storage, events, collaborators
// ═══════════════════════════════════════════════════════════════
pub mod client;
pub mod event;
pub mod provider;
pub mod shell;
pub mod store;
pub mod tokens;

// ═══════════════════════════════════════════════════════════════
// CROSS-CUTTING - Error handling, configuration
// ═══════════════════════════════════════════════════════════════
pub mod config;
pub mod error;

// ═══════════════════════════════════════════════════════════════
// PUBLIC API RE-EXPORTS
// ═══════════════════════════════════════════════════════════════

// Error types
pub use error::{FixSuggestion, FlowError, Result};

// Config types
pub use config::{CyclePolicy, EngineConfig};

// Graph types
pub use graph::{Edge, EdgeIndex, Node, NodeKind, NodeType, Workflow};

// Runtime types
pub use runtime::{ExecutionPlan, FailedNode, RunReport, RunState, WorkflowRunner};

// Executor outcome
pub use executor::{FailureKind, NodeFailure};

// Event types
pub use event::{ChannelSink, EventLog, EventSink, NodeStatus, NoopSink, WorkflowMessage};

// Collaborators
pub use client::Collaborators;

// Store
pub use store::ExecutionContext;
