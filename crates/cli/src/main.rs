//! toolweave CLI — the main entry point.
//!
//! Commands:
//! - `onboard` — Initialize config
//! - `run`     — Run a prompt through the agent loop
//! - `tools`   — List the registered tools

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "toolweave",
    about = "toolweave — a tool-calling agent loop",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration
    Onboard,

    /// Run a single prompt through the agent loop
    Run {
        /// The prompt to answer
        prompt: String,

        /// Override the configured model
        #[arg(short, long)]
        model: Option<String>,

        /// Print per-round token usage after the answer
        #[arg(short, long)]
        usage: bool,
    },

    /// List the registered tools
    Tools,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Run {
            prompt,
            model,
            usage,
        } => commands::run::run(prompt, model, usage).await?,
        Commands::Tools => commands::tools::run().await?,
    }

    Ok(())
}
