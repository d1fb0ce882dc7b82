//! CLI command definitions for optichat.
//!
//! The front end is deliberately thin: one user message string in, one
//! response string out. Everything else lives in the orchestration core.

use clap::Parser;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::agents::{ChatOrchestrator, OrchestratorConfig};
use crate::llm::LlmClient;
use crate::sandbox::{ExecutorConfig, SandboxedExecutor};
use crate::solver::SolverKind;
use crate::template::TemplateScript;

/// Conversational copilot for supply-chain optimization models.
#[derive(Parser)]
#[command(name = "optichat")]
#[command(about = "Ask natural-language questions about an optimization model")]
#[command(version)]
#[command(
    long_about = "optichat answers natural-language questions about a solver script: \
an LLM writes a code snippet, a safeguard vets it, the snippet is injected into \
the template script at a named marker, executed in a sandboxed Python subprocess, \
and the solver result is narrated back against the baseline run.\n\n\
Example usage:\n  optichat ask --template demos/distribution.py \"What if demand at retailer 2 doubles?\""
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Ask a single question and print the answer.
    Ask(AskArgs),

    /// Start an interactive question/answer loop on stdin.
    Repl(SessionArgs),
}

/// Arguments for `optichat ask`.
#[derive(Parser, Debug)]
pub struct AskArgs {
    /// The question to ask.
    pub question: String,

    #[command(flatten)]
    pub session: SessionArgs,
}

/// Session options shared by `ask` and `repl`.
#[derive(Parser, Debug)]
pub struct SessionArgs {
    /// Path to the template solver script (must contain both insertion markers).
    #[arg(short, long)]
    pub template: PathBuf,

    /// Solver family the template targets.
    #[arg(long, default_value = "gurobi")]
    pub solver: String,

    /// Model identifier (defaults to OPTICHAT_MODEL).
    #[arg(short, long, default_value = "")]
    pub model: String,

    /// Debug attempts granted per question.
    #[arg(long, default_value = "3")]
    pub debug_times: u32,

    /// Skip the safeguard judge and execute writer code directly.
    #[arg(long, default_value = "false")]
    pub no_safeguard: bool,

    /// Wall-clock deadline for one script execution, in seconds.
    #[arg(long, default_value = "60")]
    pub timeout_secs: u64,

    /// Python interpreter used to run merged scripts.
    #[arg(long, default_value = "python3")]
    pub python_bin: String,

    /// Optional file with documentation text for the writer prompt.
    #[arg(long)]
    pub doc_file: Option<PathBuf>,

    /// Optional file with example Q&A text for the writer prompt.
    #[arg(long)]
    pub examples_file: Option<PathBuf>,
}

/// Parses command-line arguments.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Runs the CLI with pre-parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Ask(args) => {
            let mut orchestrator = build_orchestrator(&args.session).await?;
            let answer = orchestrator.answer(&args.question).await?;
            println!("{}", answer);
            Ok(())
        }
        Commands::Repl(args) => run_repl(args).await,
    }
}

async fn run_repl(args: SessionArgs) -> anyhow::Result<()> {
    let mut orchestrator = build_orchestrator(&args).await?;

    println!("optichat repl. Ask about the model; 'exit' to quit.");

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if question == "exit" || question == "quit" {
            break;
        }

        let answer = orchestrator.answer(question).await?;
        println!("{}\n", answer);
    }

    Ok(())
}

async fn build_orchestrator(args: &SessionArgs) -> anyhow::Result<ChatOrchestrator> {
    let solver: SolverKind = args.solver.parse()?;
    let template = TemplateScript::from_file(&args.template)?;

    let llm = Arc::new(LlmClient::from_env()?);

    let executor_config = ExecutorConfig::new()
        .with_python_bin(&args.python_bin)
        .with_timeout(Duration::from_secs(args.timeout_secs));
    let executor = Arc::new(SandboxedExecutor::new(executor_config, solver));

    let doc_str = read_optional(&args.doc_file)?;
    let example_qa = read_optional(&args.examples_file)?;

    let config = OrchestratorConfig::new(solver)
        .with_model(&args.model)
        .with_doc_str(doc_str)
        .with_example_qa(example_qa)
        .with_debug_times(args.debug_times)
        .with_safeguard(!args.no_safeguard);

    info!(
        template = %args.template.display(),
        solver = %solver,
        debug_times = args.debug_times,
        safeguard = !args.no_safeguard,
        "Starting session"
    );

    Ok(ChatOrchestrator::new(llm, executor, template, config).await)
}

fn read_optional(path: &Option<PathBuf>) -> anyhow::Result<String> {
    match path {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => Ok(String::new()),
    }
}
