//! Store Module - run-scoped state
//!
//! Key types:
//! - `ExecutionContext`: node id → completed textual output

mod context;

pub use context::ExecutionContext;
