pub mod cli;
pub mod core;
pub mod providers;

use crate::core::config::AppConfig;
use anyhow::Result;
use chrono::NaiveDate;
use tracing::{debug, info};

pub enum AppCommand {
    Summary { date: Option<NaiveDate> },
    Returns,
    Alloc { date: Option<NaiveDate> },
    Rebalance { date: Option<NaiveDate> },
    Currencies,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    let output = render_command(command, config_path).await?;
    println!("{output}");
    Ok(())
}

/// Runs `command` against the configured portfolio and returns what it
/// would print.
pub async fn render_command(command: AppCommand, config_path: Option<&str>) -> Result<String> {
    info!("snapfolio starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");
    let history = config.history()?;

    let rates = config.rates_provider();
    let rate_provider = providers::CachingRateProvider::new(providers::FrankfurterProvider::new(
        &rates.base_url,
        rates.retries,
        rates.retry_delay_ms,
    )?);
    let currency = config.currency.as_str();

    match command {
        AppCommand::Summary { date } => {
            cli::summary::render(&history, &rate_provider, currency, config.goal, date).await
        }
        AppCommand::Returns => cli::returns::render(&history, &rate_provider, currency).await,
        AppCommand::Alloc { date } => {
            cli::alloc::render(&history, &rate_provider, currency, date).await
        }
        AppCommand::Rebalance { date } => {
            cli::rebalance::render(&history, &rate_provider, currency, date).await
        }
        AppCommand::Currencies => cli::currencies::render(&rate_provider, currency).await,
    }
}
