//! TableChat CLI: the main entry point.
//!
//! Commands:
//! - `serve` - Start the web UI and HTTP API
//! - `chat`  - Interactive chat or single-message mode in the terminal
//! - `check` - Validate config and knowledge table, optionally ping the API
//! - `init`  - Write a default config file

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "tablechat",
    about = "TableChat — answer questions from a CSV knowledge table through Gemini",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of ~/.tablechat/config.toml
    #[arg(short, long, global = true, env = "TABLECHAT_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web UI and HTTP API
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,

        /// Override the knowledge CSV path
        #[arg(short, long)]
        knowledge: Option<PathBuf>,
    },

    /// Chat in the terminal
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Override the knowledge CSV path
        #[arg(short, long)]
        knowledge: Option<PathBuf>,
    },

    /// Validate configuration and the knowledge table
    Check {
        /// Also call the generation service
        #[arg(long)]
        ping: bool,

        /// Override the knowledge CSV path
        #[arg(short, long)]
        knowledge: Option<PathBuf>,
    },

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env is normal.
    let _ = dotenvy::dotenv();

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

    let config_path = cli.config;

    match cli.command {
        Commands::Serve { port, knowledge } => {
            commands::serve::run(config_path, port, knowledge).await?
        }
        Commands::Chat { message, knowledge } => {
            commands::chat::run(config_path, message, knowledge).await?
        }
        Commands::Check { ping, knowledge } => {
            commands::check::run(config_path, ping, knowledge).await?
        }
        Commands::Init { force } => commands::init::run(config_path, force).await?,
    }

    Ok(())
}
