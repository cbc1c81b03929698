//! Binding Module - data flow between nodes
//!
//! Data flow:
//! ```text
//! parent outputs (ExecutionContext)
//!          ↓
//!   combine (edge-list order, trimmed)
//!          ↓
//!   escape per target (shell / prompt)
//!          ↓
//!   ${N} substitution (template)
//!          ↓
//!   sanitize_command (CLI only)
//! ```

mod combine;
mod sanitize;
mod template;

pub use combine::combine_parent_outputs_by_connection_order;
pub use sanitize::{
    convert_unescaped_double_quotes, denied_prefix, escape_prompt_value, escape_shell_value,
    expand_home, sanitize_command, DEFAULT_DENIED_COMMANDS,
};
pub use template::{render, replace_indexed_inputs, Escaping};
