//! Event Module - reporting channel
//!
//! - `message`: `WorkflowMessage` wire type + `NodeStatus`
//! - `sink`: `EventSink` trait and transports
//! - `log`: in-memory `EventLog` (also an `EventSink`)

mod log;
mod message;
mod sink;

pub use log::{Event, EventLog};
pub use message::{NodeStatus, WorkflowMessage};
pub use sink::{ChannelSink, EventSink, NoopSink};
