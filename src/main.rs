use anyhow::Result;
use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand};
use snapfolio::core::log::init_logging;

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

impl From<Commands> for snapfolio::AppCommand {
    fn from(cmd: Commands) -> snapfolio::AppCommand {
        match cmd {
            Commands::Summary { date } => snapfolio::AppCommand::Summary { date },
            Commands::Returns => snapfolio::AppCommand::Returns,
            Commands::Alloc { date } => snapfolio::AppCommand::Alloc { date },
            Commands::Rebalance { date } => snapfolio::AppCommand::Rebalance { date },
            Commands::Currencies => snapfolio::AppCommand::Currencies,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display the holdings of a snapshot
    Summary {
        /// Snapshot date (YYYY-MM-DD), latest when omitted
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
    /// Display time-weighted returns, CAGR and growth
    Returns,
    /// Display allocation by category
    Alloc {
        /// Snapshot date (YYYY-MM-DD), latest when omitted
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
    /// Display the moves that restore target allocations
    Rebalance {
        /// Snapshot date (YYYY-MM-DD), latest when omitted
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
    /// List currencies supported by the rate provider
    Currencies,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => snapfolio::cli::setup::setup(),
        Some(cmd) => snapfolio::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
