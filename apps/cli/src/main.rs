mod cli;
mod config;

use anyhow::Context;
use clap::Parser;
use serde_json::Value;
use spotline_market_data::{
    CancelSignal, CandlesRequest, MarketDataEngine, MarketRequest, PriceRequest,
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::{Cli, Command};
use config::Config;

fn init_tracing() {
    let log_format = std::env::var("SPOTLINE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so stdout stays pure JSON
    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();
    let config = Config::from_env().with_overrides(&cli);
    let engine = MarketDataEngine::new(config.engine_config());

    let signal = CancelSignal::new();
    let trigger = signal.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling in-flight requests");
            trigger.cancel();
        }
    });

    let output = run(&engine, cli.command, signal).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn run(
    engine: &MarketDataEngine,
    command: Command,
    signal: CancelSignal,
) -> anyhow::Result<Value> {
    let value = match command {
        Command::Price { base, quote } => {
            let request = PriceRequest::new(&base, &quote).with_signal(signal);
            let resolution = engine
                .spot_price(&request)
                .await
                .with_context(|| format!("Failed to resolve {}/{}", base, quote))?;
            serde_json::to_value(resolution)?
        }
        Command::Consensus { base, quote } => {
            let request = PriceRequest::new(&base, &quote).with_signal(signal);
            let result = engine
                .consensus_price(&request)
                .await
                .with_context(|| format!("Failed to build consensus for {}/{}", base, quote))?;
            serde_json::to_value(result)?
        }
        Command::Candles {
            base,
            quote,
            interval,
            limit,
        } => {
            let request = CandlesRequest::new(
                PriceRequest::new(&base, &quote).with_signal(signal),
                interval,
                limit,
            );
            let series = engine
                .candles(&request)
                .await
                .with_context(|| format!("Failed to fetch candles for {}/{}", base, quote))?;
            serde_json::to_value(series)?
        }
        Command::Ticker { symbol } => {
            let ticker = engine
                .ticker_24h(&MarketRequest::new(&symbol).with_signal(signal))
                .await
                .with_context(|| format!("Failed to fetch 24h ticker for {}", symbol))?;
            serde_json::to_value(ticker)?
        }
        Command::Depth { symbol, limit } => {
            let mut request = MarketRequest::new(&symbol).with_signal(signal);
            request.limit = limit;
            let book = engine
                .order_book(&request)
                .await
                .with_context(|| format!("Failed to fetch order book for {}", symbol))?;
            serde_json::to_value(book)?
        }
        Command::Trades { symbol, limit } => {
            let mut request = MarketRequest::new(&symbol).with_signal(signal);
            request.limit = limit;
            let trades = engine
                .recent_trades(&request)
                .await
                .with_context(|| format!("Failed to fetch trades for {}", symbol))?;
            serde_json::to_value(trades)?
        }
        Command::Info { symbol } => {
            let info = engine
                .exchange_info(&MarketRequest::new(&symbol).with_signal(signal))
                .await
                .with_context(|| format!("Failed to fetch exchange info for {}", symbol))?;
            serde_json::to_value(info)?
        }
    };
    Ok(value)
}
