use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use shadowfolio::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration and example tables
    Setup,
    /// Value the portfolio with live prices
    Portfolio {
        /// Re-value every SECS seconds until interrupted
        #[arg(short, long, value_name = "SECS")]
        refresh: Option<u64>,
    },
    /// Search and screen the AI stock watchlist
    Watchlist {
        /// Case-insensitive match on stock name or ticker
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show news headlines, optionally summarized
    News {
        /// Topic to search for; defaults to the configured query
        #[arg(short, long)]
        query: Option<String>,
        /// Summarize the headlines with the language model
        #[arg(long)]
        summarize: bool,
    },
}

impl From<Commands> for shadowfolio::AppCommand {
    fn from(cmd: Commands) -> shadowfolio::AppCommand {
        match cmd {
            Commands::Portfolio { refresh } => shadowfolio::AppCommand::Portfolio {
                refresh_secs: refresh,
            },
            Commands::Watchlist { search } => shadowfolio::AppCommand::Watchlist { search },
            Commands::News { query, summarize } => {
                shadowfolio::AppCommand::News { query, summarize }
            }
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // API keys may live in a local .env file
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => shadowfolio::cli::setup::setup_at_path(path),
            None => shadowfolio::cli::setup::setup(),
        },
        Some(cmd) => shadowfolio::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
