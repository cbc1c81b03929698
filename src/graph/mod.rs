//! Workflow graph: data model, edge index, ordering, inactive propagation

pub mod edge_index;
pub mod inactive;
pub mod node;
pub mod topo;

pub use edge_index::{EdgeIndex, EdgeVec};
pub use inactive::inactive_closure;
pub use node::{
    CliData, Edge, LlmData, Node, NodeCommon, NodeKind, NodeType, TextData, Workflow,
};
pub use topo::{dropped_nodes, find_cycle, topological_sort};
