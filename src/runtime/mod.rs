//! Runtime Module - workflow execution
//!
//! - `runner`: sequential execution + event reporting
//! - `plan`: ordering, skip-set and cycle policy, computed up front
//! - `policy`: halt-or-continue decision per node failure
//! - `state`: run state machine

mod plan;
mod policy;
mod runner;
mod state;

pub use plan::ExecutionPlan;
pub use policy::{FailureAction, FailurePolicy};
pub use runner::{FailedNode, RunReport, WorkflowRunner};
pub use state::RunState;
