//! Docbot CLI, the main entry point.
//!
//! Commands:
//! - `serve`: Start the HTTP gateway
//! - `chat`: Interactive or single-message chat in a thread
//! - `context`: Show the context that would be injected for a message
//! - `corpus`: Load the corpus and print statistics
//! - `config`: Show, locate or initialise the config file
//! - `doctor`: Diagnose configuration, corpus and provider health

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "docbot",
    about = "Docbot: answers questions from your documentation",
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
    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Chat with the bot
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Thread to continue (a new one is started when omitted)
        #[arg(long)]
        thread: Option<String>,
    },

    /// Print the retrieved context for a message
    Context {
        /// The latest message
        message: String,

        /// Transcript text (defaults to the message)
        #[arg(long)]
        transcript: Option<String>,
    },

    /// Load the corpus and print statistics
    Corpus {
        /// Override the corpus path
        #[arg(long)]
        path: Option<std::path::PathBuf>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Diagnose system health
    Doctor,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration (secrets redacted)
    Show,
    /// Print the config file path
    Path,
    /// Write a default config file if none exists
    Init,
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
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Chat { message, thread } => commands::chat::run(message, thread).await?,
        Commands::Context {
            message,
            transcript,
        } => commands::context::run(message, transcript).await?,
        Commands::Corpus { path } => commands::corpus::run(path).await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Path => commands::config_cmd::path().await?,
            ConfigAction::Init => commands::config_cmd::init().await?,
        },
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
