//! # ragchain — conversational RAG from the command line
//!
//! Usage:
//!   ragchain ask "Does age affect HPV vaccine efficacy?"
//!   ragchain ask --messages chat.json        # {"messages": [...]} request
//!   ragchain ask --trace --messages chat.json
//!   ragchain check                           # health-check model + index

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ragchain_core::config::RagConfig;
use ragchain_core::types::{ChatRequest, ChatTurn};
use ragchain_pipeline::RagChain;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "ragchain",
    version,
    about = "🔗 ragchain — conversational RAG over a topic-filtered vector index"
)]
struct Cli {
    /// Config file (default: ~/.ragchain/config.toml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Answer a question or a whole conversation
    Ask {
        /// Single-turn question
        question: Option<String>,

        /// JSON file holding {"messages": [{"role", "content"}, ...]}
        #[arg(short, long, conflicts_with = "question")]
        messages: Option<String>,

        /// Print rewrite decision, topic and retrieved chunks as JSON
        #[arg(long)]
        trace: bool,
    },
    /// Health-check the language model and the vector index
    Check,
}

fn expand_path(p: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(p).to_string())
}

fn init_logging(cli: &Cli) {
    let filter = if cli.verbose {
        "ragchain=debug,ragchain_pipeline=debug,ragchain_providers=debug,ragchain_vectorsearch=debug"
    } else {
        "ragchain=info,ragchain_pipeline=info,ragchain_vectorsearch=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(cli: &Cli) -> Result<RagConfig> {
    let config = match &cli.config {
        Some(path) => {
            let path = expand_path(path);
            RagConfig::load_from(&path)
                .with_context(|| format!("loading {}", path.display()))?
        }
        None => RagConfig::load()?,
    };
    Ok(config)
}

fn read_conversation(question: Option<String>, messages: Option<String>) -> Result<Vec<ChatTurn>> {
    match (question, messages) {
        (_, Some(path)) => {
            let path = expand_path(&path);
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            Ok(ChatRequest::from_json(&raw)?.messages)
        }
        (Some(question), None) => Ok(vec![ChatTurn::user(question)]),
        (None, None) => anyhow::bail!("pass a question or --messages <file>"),
    }
}

fn build_chain(config: &RagConfig) -> Result<RagChain> {
    let model = ragchain_providers::create_provider(&config.llm)?;
    let index = ragchain_vectorsearch::create_index(&config.vector_search)?;
    Ok(RagChain::new(config, model, index)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let config = load_config(&cli)?;
    let chain = build_chain(&config)?;

    match cli.command {
        Command::Ask {
            question,
            messages,
            trace,
        } => {
            let conversation = read_conversation(question, messages)?;
            if trace {
                let trace = chain.trace(&conversation).await?;
                println!("{}", serde_json::to_string_pretty(&trace)?);
            } else {
                println!("{}", chain.answer(&conversation).await?);
            }
        }
        Command::Check => {
            let (model_ok, index_ok) = chain.health_check().await;
            let mut healthy = true;
            for (what, status) in [("🧠 Model", model_ok), ("📚 Index", index_ok)] {
                match status {
                    Ok(true) => println!("   ✅ {what}: ok"),
                    Ok(false) => {
                        healthy = false;
                        println!("   ❌ {what}: unreachable or missing credentials");
                    }
                    Err(e) => {
                        healthy = false;
                        println!("   ❌ {what}: {e}");
                    }
                }
            }
            if !healthy {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
