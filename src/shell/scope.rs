//! ShellScope - the run's shell session with guaranteed cleanup
//!
//! Acquired once at run start (only when the graph has CLI nodes) and
//! released by the runner on every exit path. Dropping an unreleased scope
//! logs a warning; the process itself is still reaped via `kill_on_drop`.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::client::{ShellLauncher, ShellSession};

pub struct ShellScope {
    session: Option<Box<dyn ShellSession>>,
    /// Why `session` is `None`, reported to CLI nodes
    unavailable: String,
}

impl ShellScope {
    /// Scope with no session (graph has no CLI node)
    pub fn empty() -> Self {
        Self {
            session: None,
            unavailable: "no shell session for this run".to_string(),
        }
    }

    pub async fn acquire(launcher: Option<&Arc<dyn ShellLauncher>>, needed: bool) -> Self {
        if !needed {
            return Self::empty();
        }
        let Some(launcher) = launcher else {
            return Self {
                session: None,
                unavailable: "no shell is configured".to_string(),
            };
        };

        match launcher.launch().await {
            Ok(session) => {
                debug!("shell session acquired");
                Self {
                    session: Some(session),
                    unavailable: String::new(),
                }
            }
            Err(e) => {
                warn!(error = %e, "shell launch failed");
                Self {
                    session: None,
                    unavailable: e.to_string(),
                }
            }
        }
    }

    /// The live session, or the reason there is none
    pub fn session(&self) -> Result<&dyn ShellSession, &str> {
        self.session.as_deref().ok_or(self.unavailable.as_str())
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Dispose the session after a failed command; later CLI nodes see it
    /// as unavailable.
    pub async fn discard(&mut self, reason: &str) {
        if let Some(session) = self.session.take() {
            session.dispose().await;
            self.unavailable = format!("shell session disposed after failure in {reason}");
        }
    }

    /// Dispose the session. Idempotent.
    pub async fn release(&mut self) {
        if let Some(session) = self.session.take() {
            session.dispose().await;
            debug!("shell session released");
        }
    }
}

impl Drop for ShellScope {
    fn drop(&mut self) {
        if self.session.is_some() {
            warn!("shell scope dropped without release");
        }
    }
}

impl std::fmt::Debug for ShellScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShellScope")
            .field("active", &self.session.is_some())
            .field("unavailable", &self.unavailable)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FlowError, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_util::sync::CancellationToken;

    #[derive(Default)]
    struct Counting {
        launches: AtomicUsize,
        disposals: Arc<AtomicUsize>,
    }

    struct Session(Arc<AtomicUsize>);

    #[async_trait]
    impl ShellSession for Session {
        async fn execute(&self, command: &str, _cancel: &CancellationToken) -> Result<String> {
            Ok(command.to_string())
        }
        async fn dispose(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl ShellLauncher for Counting {
        async fn launch(&self) -> Result<Box<dyn ShellSession>> {
            self.launches.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(Session(self.disposals.clone())))
        }
    }

    struct Broken;

    #[async_trait]
    impl ShellLauncher for Broken {
        async fn launch(&self) -> Result<Box<dyn ShellSession>> {
            Err(FlowError::Shell("no such program".into()))
        }
    }

    #[tokio::test]
    async fn not_needed_means_no_launch() {
        let counting = Arc::new(Counting::default());
        let launcher: Arc<dyn ShellLauncher> = counting.clone();

        let scope = ShellScope::acquire(Some(&launcher), false).await;
        assert!(!scope.is_active());
        assert_eq!(counting.launches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn release_disposes_once() {
        let counting = Arc::new(Counting::default());
        let launcher: Arc<dyn ShellLauncher> = counting.clone();

        let mut scope = ShellScope::acquire(Some(&launcher), true).await;
        assert!(scope.session().is_ok());

        scope.release().await;
        scope.release().await;
        assert_eq!(counting.disposals.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_launcher_reports_reason() {
        let scope = ShellScope::acquire(None, true).await;
        assert_eq!(scope.session().err(), Some("no shell is configured"));
    }

    #[tokio::test]
    async fn launch_failure_reports_error() {
        let launcher: Arc<dyn ShellLauncher> = Arc::new(Broken);
        let scope = ShellScope::acquire(Some(&launcher), true).await;
        assert!(scope.session().err().unwrap().contains("no such program"));
    }

    #[tokio::test]
    async fn discard_marks_unavailable() {
        let counting = Arc::new(Counting::default());
        let launcher: Arc<dyn ShellLauncher> = counting.clone();

        let mut scope = ShellScope::acquire(Some(&launcher), true).await;
        scope.discard("build").await;
        assert!(scope.session().err().unwrap().contains("build"));
        assert_eq!(counting.disposals.load(Ordering::SeqCst), 1);
    }
}
