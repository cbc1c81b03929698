//! Engine Configuration
//!
//! Stored in `~/.config/nodeflow/config.toml`.
//!
//! ## Priority Order (highest to lowest)
//!
//! 1. Environment variables (`NODEFLOW_MODEL`, `NODEFLOW_LLM_TIMEOUT_SECS`,
//!    `NODEFLOW_TRUST_WORKSPACE`)
//! 2. Config file
//! 3. Defaults
//!
//! API keys never live here; providers read them from the environment.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::binding::DEFAULT_DENIED_COMMANDS;
use crate::error::{FlowError, Result};
use crate::runtime::FailurePolicy;

pub const DEFAULT_SYSTEM_PREAMBLE: &str = "You are a helpful assistant running as one step of an \
automated workflow. Answer the request directly. Your reply is passed verbatim to the next step, \
so do not add greetings or commentary.";

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_FAST_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub shell: ShellConfig,
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub failure: FailurePolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    /// Hard ceiling per LLM node
    pub timeout_secs: u64,
    /// Streaming stops and the node fails past this many characters
    pub max_response_chars: usize,
    pub system_preamble: String,
    pub model: String,
    pub fast_model: String,
    /// OpenAI-compatible endpoint root
    pub base_url: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_response_chars: 1_000_000,
            system_preamble: DEFAULT_SYSTEM_PREAMBLE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            fast_model: DEFAULT_FAST_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShellConfig {
    pub program: String,
    pub denied_commands: Vec<String>,
    /// Replaces `~/` in commands; defaults to the user's home directory
    pub home_dir: Option<PathBuf>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            program: "bash".to_string(),
            denied_commands: DEFAULT_DENIED_COMMANDS.iter().map(|s| s.to_string()).collect(),
            home_dir: None,
        }
    }
}

impl ShellConfig {
    /// Home directory used for `~/` expansion
    pub fn home(&self) -> Option<PathBuf> {
        self.home_dir.clone().or_else(dirs::home_dir)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// CLI nodes refuse to run in an untrusted workspace
    pub trusted: bool,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self { trusted: true }
    }
}

/// What to do when the graph has a cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CyclePolicy {
    /// Fail before `execution_started`
    #[default]
    Reject,
    /// Warn and run the nodes that could be ordered
    Skip,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GraphConfig {
    pub cycle_policy: CyclePolicy,
}

impl EngineConfig {
    /// `~/.config/nodeflow/` on Unix, `%APPDATA%/nodeflow/` on Windows
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("nodeflow")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load from the default path. Missing file gives defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load from `path`. Missing file gives defaults; malformed is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| FlowError::Config {
            reason: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| FlowError::Config {
            reason: format!("Failed to parse config file: {}", e),
        })
    }

    /// Merge with process environment variables
    pub fn with_env(self) -> Result<Self> {
        self.apply_env(|key| std::env::var(key).ok())
    }

    /// Merge with environment values from `lookup`. Empty values are ignored.
    pub fn apply_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(model) = get("NODEFLOW_MODEL") {
            self.llm.model = model;
        }

        if let Some(secs) = get("NODEFLOW_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = secs.trim().parse().map_err(|_| FlowError::Config {
                reason: format!("NODEFLOW_LLM_TIMEOUT_SECS must be a number of seconds, got '{secs}'"),
            })?;
        }

        if let Some(trusted) = get("NODEFLOW_TRUST_WORKSPACE") {
            self.workspace.trusted = match trusted.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                other => {
                    return Err(FlowError::Config {
                        reason: format!("NODEFLOW_TRUST_WORKSPACE must be true or false, got '{other}'"),
                    })
                }
            };
        }

        Ok(self)
    }
}
