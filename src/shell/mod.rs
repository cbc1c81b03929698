//! Shell Module - persistent shell sessions
//!
//! - `PersistentShell`: one child process, many commands
//! - `ShellScope`: per-run ownership with explicit release

mod persistent;
mod scope;

pub use persistent::{PersistentShell, PersistentShellLauncher};
pub use scope::ShellScope;
