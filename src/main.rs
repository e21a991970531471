use anyhow::Result;
use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand};
use ledgerfx::cli::fetch::{FetchOptions, SourceKind};
use ledgerfx::core::log::init_logging;
use std::path::PathBuf;

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
    /// Create default configuration
    Setup,
    /// Download price history and rewrite the ledger files
    Fetch {
        /// Sources to fetch (default: all)
        #[arg(short, long, value_enum)]
        source: Vec<SourceKind>,

        /// Include discontinued currencies and historic stocks
        #[arg(long)]
        historic: bool,

        /// Process only this currency, ticker or ISIN (e.g. AAPL)
        #[arg(short, long)]
        ticker: Option<String>,

        /// Last day to request, in YYYY-MM-DD format (default: today)
        #[arg(long)]
        end_date: Option<NaiveDate>,

        /// Directory to write ledgers to (overrides the config)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
}

impl From<Commands> for ledgerfx::AppCommand {
    fn from(cmd: Commands) -> ledgerfx::AppCommand {
        match cmd {
            Commands::Fetch {
                source,
                historic,
                ticker,
                end_date,
                output_dir,
            } => ledgerfx::AppCommand::Fetch(FetchOptions {
                sources: source,
                historic,
                ticker,
                end_date,
                output_dir,
            }),
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => ledgerfx::cli::setup::setup_at_path(path),
            None => ledgerfx::cli::setup::setup(),
        },
        Some(cmd) => ledgerfx::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
