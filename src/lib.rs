pub mod cli;
pub mod core;
pub mod providers;

use crate::cli::show::RenderOptions;
use crate::core::config::AppConfig;
use anyhow::Result;
use tracing::{debug, info};

pub enum AppCommand {
    /// One dashboard for `ticker`.
    Show {
        ticker: String,
        options: RenderOptions,
    },
    /// Prompt for tickers on stdin until the user quits.
    Interactive(RenderOptions),
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Stock dashboard starting...");

    let config = AppConfig::load(config_path)?;
    debug!("Loaded config: {config:#?}");

    let provider = providers::yahoo_finance::YahooFinanceProvider::new(&config.providers.yahoo)?;
    let today = || chrono::Local::now().date_naive();

    match command {
        AppCommand::Show { ticker, options } => {
            cli::show::run(&provider, &ticker, today(), &options).await
        }
        AppCommand::Interactive(options) => {
            let stdin = std::io::stdin();
            let requests = cli::interactive::run(&provider, stdin.lock(), today, &options).await?;
            debug!(requests, "Interactive session finished");
            Ok(())
        }
    }
}
