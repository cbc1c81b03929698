//! Persistent shell abstraction
//!
//! One session is opened per run and reused by every CLI node, so shell
//! state (cwd, exported variables) carries from one node to the next.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::Result;

#[async_trait]
pub trait ShellSession: Send + Sync {
    /// Run `command`, returning its combined output
    ///
    /// Must return promptly once `cancel` fires.
    async fn execute(&self, command: &str, cancel: &CancellationToken) -> Result<String>;

    /// Terminate the session. Safe to call more than once.
    async fn dispose(&self);
}

#[async_trait]
pub trait ShellLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn ShellSession>>;
}
