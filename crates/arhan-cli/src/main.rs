use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use arhan::agent::{Agent, AgentConfig, DEFAULT_MAX_ITERATIONS};
use arhan::developer::DeveloperSystem;
use arhan::history::ConversationStore;
use arhan::providers::configs::OpenRouterProviderConfig;
use arhan::providers::openrouter::OpenRouterProvider;

mod prompt;
mod session;
mod ui;

use prompt::rustyline::{RustylinePrompt, INTERRUPTED_EXIT_CODE};
use session::{Session, SessionEnd};

const DEFAULT_MODEL: &str = "google/gemini-2.0-flash-exp:free";

#[derive(Parser, Debug)]
#[command(author, version, about = "Arhan - AI coding agent for the terminal", long_about = None)]
struct Cli {
    /// The coding task to perform; omit it to start an interactive session
    task: Option<String>,

    /// Auto-approve all tool executions
    #[arg(short = 'y', long)]
    yes: bool,

    /// OpenRouter model to use
    #[arg(short, long, env = "OPENROUTER_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Maximum model turns per task
    #[arg(long, default_value_t = DEFAULT_MAX_ITERATIONS as u32, value_parser = clap::value_parser!(u32).range(1..))]
    max_iterations: u32,

    /// Clear conversation history
    #[arg(long)]
    clear: bool,

    /// Conversation history file
    #[arg(long, default_value = ".arhan_history.json")]
    history: PathBuf,
}

/// `.env` in the working directory wins over `~/.arhan/.env`; real environment
/// variables win over both.
fn load_env_files() {
    let _ = dotenv::dotenv();
    if let Some(home) = dirs::home_dir() {
        let _ = dotenv::from_path(home.join(".arhan").join(".env"));
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    load_env_files();
    let cli = Cli::parse();
    init_logging();

    let provider_config = match OpenRouterProviderConfig::from_env() {
        Ok(config) => config,
        Err(_) => {
            eprintln!("{}", ui::missing_api_key());
            process::exit(1);
        }
    };

    let history_file = std::env::current_dir()
        .context("Failed to determine the working directory")?
        .join(&cli.history);

    let config = AgentConfig {
        model: cli.model.clone(),
        auto_approve: cli.yes,
        max_iterations: cli.max_iterations as usize,
    };
    let provider = OpenRouterProvider::new(provider_config)?;
    let developer =
        DeveloperSystem::from_current_dir().context("Failed to determine the working directory")?;

    let mut agent = Agent::new(
        config,
        Box::new(provider),
        Box::new(developer),
        ConversationStore::load(&history_file),
    );
    agent.initialize()?;

    if cli.clear {
        agent.clear_history()?;
        if cli.task.is_none() {
            println!("{}", ui::history_cleared());
            return Ok(());
        }
    }

    println!("{}", ui::welcome(&cli.model, cli.yes));

    let mut session = Session::new(agent, RustylinePrompt::new()?);
    let end = match cli.task {
        Some(task) => session.headless_start(&task).await?,
        None => session.start().await?,
    };

    if end == SessionEnd::Interrupted {
        process::exit(INTERRUPTED_EXIT_CODE);
    }
    Ok(())
}
