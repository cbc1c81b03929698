//! Nodeflow CLI - run or check a workflow graph

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use nodeflow::client::{ApprovalHandler, ApprovalResponse, TracingNotifier};
use nodeflow::error::{FixSuggestion, FlowError, Result};
use nodeflow::event::{EventSink, WorkflowMessage};
use nodeflow::graph::{EdgeIndex, Workflow};
use nodeflow::provider::create_chat_client;
use nodeflow::runtime::{ExecutionPlan, WorkflowRunner};
use nodeflow::shell::PersistentShellLauncher;
use nodeflow::{Collaborators, EngineConfig};

#[derive(Parser)]
#[command(name = "nodeflow")]
#[command(about = "Nodeflow - DAG workflow engine for shell and LLM nodes")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.config/nodeflow/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a workflow graph, streaming events as JSON lines on stdout
    Run {
        /// Path to a .yaml or .json graph
        file: PathBuf,

        /// Chat provider (openai, mock)
        #[arg(short, long, default_value = "openai")]
        provider: String,

        /// Override the configured model
        #[arg(short, long)]
        model: Option<String>,

        /// Approve every CLI command without prompting
        #[arg(long)]
        auto_approve: bool,

        /// Treat the workspace as untrusted (CLI nodes fail)
        #[arg(long)]
        untrusted: bool,
    },

    /// Check a workflow graph and print its execution plan
    Validate {
        /// Path to a .yaml or .json graph
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (ignore if not present)
    let _ = dotenvy::dotenv();

    // Logs go to stderr; stdout carries the event stream
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            file,
            provider,
            model,
            auto_approve,
            untrusted,
        } => {
            let options = RunOptions {
                provider,
                model,
                auto_approve,
                untrusted,
            };
            run_workflow(&file, cli.config.as_deref(), options).await
        }
        Commands::Validate { file } => validate_workflow(&file, cli.config.as_deref()).await,
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            if let Some(suggestion) = e.fix_suggestion() {
                eprintln!("  {} {}", "Fix:".yellow(), suggestion);
            }
            std::process::exit(1);
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let config = match path {
        Some(path) => EngineConfig::load_from(path)?,
        None => EngineConfig::load()?,
    };
    config.with_env()
}

struct RunOptions {
    provider: String,
    model: Option<String>,
    auto_approve: bool,
    untrusted: bool,
}

/// Returns whether the run succeeded
async fn run_workflow(file: &Path, config_path: Option<&Path>, options: RunOptions) -> Result<bool> {
    let workflow = Workflow::load(file).await?;

    let mut config = load_config(config_path)?;
    if let Some(model) = options.model {
        config.llm.model = model;
    }
    if options.untrusted {
        config.workspace.trusted = false;
    }

    let chat = create_chat_client(&options.provider, &config.llm)?;
    let cwd = std::env::current_dir()?;
    let shell = PersistentShellLauncher::new(config.shell.program.clone()).with_cwd(cwd);
    let approval: Arc<dyn ApprovalHandler> = if options.auto_approve {
        Arc::new(AutoApprove)
    } else {
        Arc::new(StdinApproval)
    };

    let collaborators = Collaborators::new()
        .with_chat(chat)
        .with_shell(Arc::new(shell))
        .with_approval(approval)
        .with_notifier(Arc::new(TracingNotifier));

    eprintln!(
        "{} Running {} | provider: {} | model: {}",
        "→".cyan(),
        file.display(),
        options.provider.cyan().bold(),
        config.llm.model.cyan()
    );

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, aborting run");
            ctrl_c.cancel();
        }
    });

    let runner = WorkflowRunner::new(config, collaborators, Arc::new(JsonLinesSink));
    let report = runner.run(&workflow, cancel).await?;

    if report.is_success() {
        eprintln!("{} Run {}", "✓".green(), report.state);
    } else {
        eprintln!("{} Run {}", "✗".red(), report.state);
        for failed in &report.failures {
            eprintln!("  {} {}: {}", "•".red(), failed.node_id, failed.failure);
        }
    }

    Ok(report.is_success())
}

async fn validate_workflow(file: &Path, config_path: Option<&Path>) -> Result<bool> {
    let workflow = Workflow::load(file).await?;
    workflow.validate()?;
    let config = load_config(config_path)?;

    let index = EdgeIndex::build(&workflow.edges);
    let plan = ExecutionPlan::build(&workflow, &index);

    println!("{} Workflow '{}'", "✓".green(), file.display());
    println!("  Nodes: {}", workflow.nodes.len());
    println!("  Edges: {}", workflow.edges.len());
    let order: Vec<&str> = plan.order.iter().map(|n| n.id.as_str()).collect();
    println!("  Order: {}", order.join(" → "));

    let mut skipped: Vec<&str> = plan.skipped.iter().copied().collect();
    skipped.sort_unstable();
    if !skipped.is_empty() {
        println!("  Skipped (inactive): {}", skipped.join(", "));
    }
    if !plan.dropped.is_empty() {
        println!("  {} {}", "Not ordered:".yellow(), plan.dropped_ids().join(", "));
    }
    if let Some(cycle) = &plan.cycle {
        println!("  {} {}", "Cycle:".yellow(), cycle.join(" → "));
    }

    plan.enforce(config.graph.cycle_policy)?;
    Ok(true)
}

// ═══════════════════════════════════════════════════════════════
// CLI COLLABORATORS
// ═══════════════════════════════════════════════════════════════

/// One JSON object per line on stdout
struct JsonLinesSink;

impl EventSink for JsonLinesSink {
    fn send(&self, message: WorkflowMessage) {
        match serde_json::to_string(&message) {
            Ok(line) => {
                let mut out = std::io::stdout().lock();
                if writeln!(out, "{line}").and_then(|_| out.flush()).is_err() {
                    tracing::debug!("stdout closed, event dropped");
                }
            }
            Err(e) => tracing::error!(error = %e, "failed to serialize event"),
        }
    }
}

struct AutoApprove;

#[async_trait]
impl ApprovalHandler for AutoApprove {
    async fn request_approval(&self, _node_id: &str, _proposed: &str) -> Result<ApprovalResponse> {
        Ok(ApprovalResponse::approve())
    }
}

/// Prompts on stderr and reads one line from stdin:
/// empty or `y` approves, `n` refuses, anything else replaces the command.
struct StdinApproval;

#[async_trait]
impl ApprovalHandler for StdinApproval {
    async fn request_approval(&self, node_id: &str, proposed: &str) -> Result<ApprovalResponse> {
        eprintln!("{} {} wants to run:", "?".yellow().bold(), node_id.bold());
        eprintln!("    {}", proposed.cyan());
        eprint!("  Approve? [Y/n/or type a replacement] ");

        let mut line = String::new();
        BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;

        match line.trim() {
            "" | "y" | "Y" | "yes" => Ok(ApprovalResponse::approve()),
            "n" | "N" | "no" => Err(FlowError::ApprovalDenied {
                node_id: node_id.to_string(),
                reason: "refused at prompt".to_string(),
            }),
            replacement => Ok(ApprovalResponse::replace(replacement)),
        }
    }
}

