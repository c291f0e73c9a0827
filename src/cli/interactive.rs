use super::show::{self, RenderOptions};
use super::ui;
use crate::core::MarketDataProvider;
use crate::core::dashboard::{DEFAULT_TICKER, normalize_ticker};
use anyhow::Result;
use chrono::NaiveDate;
use std::io::{BufRead, Write};
use tracing::warn;

/// What one line of input asks for.
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Ticker(String),
    Quit,
}

fn parse_input(line: &str) -> Input {
    let trimmed = line.trim();
    if trimmed.eq_ignore_ascii_case("quit") || trimmed.eq_ignore_ascii_case("exit") {
        Input::Quit
    } else if trimmed.is_empty() {
        Input::Ticker(DEFAULT_TICKER.to_string())
    } else {
        Input::Ticker(normalize_ticker(trimmed))
    }
}

/// Prompts for tickers until `quit`, `exit` or end of input, rendering one
/// dashboard per submitted line. A failed request is reported and the loop
/// continues. Returns the number of requests made.
pub async fn run<R: BufRead>(
    provider: &(dyn MarketDataProvider + Send + Sync),
    mut input: R,
    today: impl Fn() -> NaiveDate,
    options: &RenderOptions,
) -> Result<usize> {
    let mut requests = 0;
    loop {
        print!("Stock Ticker Symbol [{DEFAULT_TICKER}]: ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            println!();
            break;
        }
        let ticker = match parse_input(&line) {
            Input::Quit => break,
            Input::Ticker(ticker) => ticker,
        };

        requests += 1;
        if let Err(e) = show::run(provider, &ticker, today(), options).await {
            warn!(error = %e, %ticker, "Request failed");
            println!("{}", ui::error_notice(&e.to_string()));
        }
        println!("{}", ui::separator());
    }
    Ok(requests)
}
