//! agent-pipes CLI — run one pattern per invocation against the hosted API.
//!
//! Completions go to stdout; logs go to stderr (`RUST_LOG` to tune).

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::error;
use tracing_subscriber::EnvFilter;

use agent_pipes::chat::chat_loop;
use agent_pipes::config::{defaults, AgentTable, Overrides};
use agent_pipes::patterns::{
    EvaluatorOptimizer, Orchestrator, Parallel, PromptChain, RetrievalAgent, Router, ToolAgent,
};
use agent_pipes::pipe::{provision, PipeBackend, PipeClient};
use agent_pipes::tools::ToolRegistry;

#[derive(Parser)]
#[command(name = "agent-pipes", version, about = "Agent architecture patterns over hosted LLM pipes")]
struct Cli {
    /// YAML file overriding built-in agents and memory settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Skip pipe provisioning (pipes already exist)
    #[arg(long, global = true)]
    no_setup: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create or update every pipe a pattern uses
    Provision {
        #[arg(value_enum)]
        pattern: PatternKind,
    },
    /// Summary → features → marketing copy
    Chain {
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Classify, then hand off to one specialist
    Route {
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Independent analyses in parallel, then one decision
    Parallel {
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Plan subtasks, run workers, synthesize
    Orchestrate {
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Draft and revise until the evaluator accepts
    Refine {
        #[arg(required = true)]
        text: Vec<String>,
        #[arg(long, default_value_t = 5)]
        max_iterations: usize,
    },
    /// Let the model call local tools
    Tools {
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Answer a question from a hosted memory
    Memory {
        #[arg(required = true)]
        question: Vec<String>,
        /// Memory name (defaults to the config file's, then the built-in)
        #[arg(long)]
        memory: Option<String>,
        /// Document URL to add to the memory (repeatable)
        #[arg(long = "document")]
        documents: Vec<String>,
    },
    /// Show the chunks a memory returns for a query
    Recall {
        #[arg(required = true)]
        query: Vec<String>,
        #[arg(long)]
        memory: Option<String>,
        #[arg(long, default_value_t = 5)]
        top_k: usize,
    },
    /// Talk to a pipe line by line
    Chat {
        #[arg(long, default_value = "chat-agent")]
        pipe: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PatternKind {
    Chain,
    Routing,
    Parallel,
    Orchestrator,
    Evaluator,
    Tools,
    Memory,
    Chat,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("agent_pipes=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Built-in table with config-file overrides applied.
fn table(mut base: AgentTable, overrides: &Overrides) -> AgentTable {
    base.apply_overrides(overrides);
    base
}

fn memory_name(flag: Option<String>, overrides: &Overrides) -> String {
    flag.or_else(|| overrides.memory.as_ref().map(|m| m.name.clone()))
        .unwrap_or_else(|| defaults::DEFAULT_MEMORY.to_string())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let overrides = match cli.config {
        Some(ref path) => Overrides::load(path).context("loading config")?,
        None => Overrides::default(),
    };
    let client = Arc::new(PipeClient::from_env()?);
    let backend: Arc<dyn PipeBackend> = client.clone();
    let setup = !cli.no_setup;

    match cli.command {
        Command::Provision { pattern } => {
            let base = match pattern {
                PatternKind::Chain => defaults::chain(),
                PatternKind::Routing => defaults::routing(),
                PatternKind::Parallel => defaults::parallel(),
                PatternKind::Orchestrator => defaults::orchestrator(),
                PatternKind::Evaluator => defaults::evaluator(),
                PatternKind::Tools => defaults::tools(),
                PatternKind::Memory => defaults::memory(&memory_name(None, &overrides)),
                PatternKind::Chat => defaults::chat(),
            };
            for handle in provision(backend.as_ref(), &table(base, &overrides)).await? {
                println!("{}", handle.name);
            }
        }
        Command::Chain { text } => {
            let chain = PromptChain::new(backend, table(defaults::chain(), &overrides));
            if setup {
                chain.setup().await?;
            }
            let outcome = chain.run(&text.join(" ")).await?;
            for (pipe, output) in &outcome.steps {
                println!("## {pipe}\n{}\n", output.trim());
            }
        }
        Command::Route { text } => {
            let router = Router::new(backend, table(defaults::routing(), &overrides));
            if setup {
                router.setup().await?;
            }
            let routed = router.run(&text.join(" ")).await?;
            println!("[{}]\n{}", routed.role, routed.completion.trim());
        }
        Command::Parallel { text } => {
            let parallel = Parallel::new(backend, table(defaults::parallel(), &overrides));
            if setup {
                parallel.setup().await?;
            }
            let outcome = parallel.run(&text.join(" ")).await?;
            for (role, output) in &outcome.branches {
                println!("## {role}\n{}\n", output.trim());
            }
            println!("## decision\n{}", outcome.output.trim());
        }
        Command::Orchestrate { text } => {
            let orchestrator = Orchestrator::new(backend, table(defaults::orchestrator(), &overrides));
            if setup {
                orchestrator.setup().await?;
            }
            let out = orchestrator.run(&text.join(" ")).await?;
            println!("{}", out.output.trim());
        }
        Command::Refine {
            text,
            max_iterations,
        } => {
            let optimizer = EvaluatorOptimizer::new(backend, table(defaults::evaluator(), &overrides))
                .max_iterations(max_iterations);
            if setup {
                optimizer.setup().await?;
            }
            let out = optimizer.run(&text.join(" ")).await?;
            if !out.accepted {
                eprintln!("(not accepted after {} iterations)", out.iterations);
            }
            println!("{}", out.draft.trim());
        }
        Command::Tools { text } => {
            let agent = ToolAgent::new(backend, table(defaults::tools(), &overrides), ToolRegistry::builtin());
            if setup {
                agent.setup().await?;
            }
            let out = agent.run(&text.join(" ")).await?;
            println!("{}", out.completion.trim());
        }
        Command::Memory {
            question,
            memory,
            mut documents,
        } => {
            let name = memory_name(memory, &overrides);
            if let Some(ref settings) = overrides.memory {
                documents.extend(settings.documents.iter().cloned());
            }
            let agent = RetrievalAgent::new(client, &name, table(defaults::memory(&name), &overrides))
                .documents(documents);
            if setup {
                agent.setup().await?;
            }
            println!("{}", agent.run(&question.join(" ")).await?.trim());
        }
        Command::Recall {
            query,
            memory,
            top_k,
        } => {
            let name = memory_name(memory, &overrides);
            let agent = RetrievalAgent::with_defaults(client, &name);
            for chunk in agent.recall(&query.join(" "), top_k).await? {
                println!("[{:.3}] {}\n", chunk.similarity, chunk.text.trim());
            }
        }
        Command::Chat { pipe } => {
            let chat = table(defaults::chat(), &overrides);
            if setup && chat.agents().any(|a| a.name == pipe) {
                provision(backend.as_ref(), &chat).await?;
            }
            let interactive = std::io::stdin().is_terminal();
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            chat_loop(backend.as_ref(), &pipe, stdin, tokio::io::stdout(), interactive).await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
