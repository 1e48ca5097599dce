use clap::{Parser, Subcommand};
use spotline_market_data::ProviderId;

/// Crypto market data from Binance, Coinbase, Kraken and OKX
#[derive(Parser, Debug)]
#[command(name = "spotline", version)]
#[command(about = "Resolve crypto prices and candles across public exchange APIs")]
pub struct Cli {
    /// Provider order, comma-separated (e.g. kraken,okx)
    #[arg(long, global = true, value_delimiter = ',')]
    pub providers: Vec<ProviderId>,

    /// Per-attempt HTTP deadline in milliseconds
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Extra attempts after a transient failure
    #[arg(long, global = true)]
    pub retries: Option<u32>,

    /// Fixed wait between attempts in milliseconds
    #[arg(long, global = true)]
    pub retry_delay_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Spot price from the first provider that answers
    Price {
        /// Base asset (e.g. btc)
        base: String,
        /// Quote asset (e.g. usdt)
        quote: String,
    },

    /// Spot price from every provider with median, min, max and spread
    Consensus { base: String, quote: String },

    /// OHLCV candles, oldest first
    Candles {
        base: String,
        quote: String,

        /// Interval: 1m, 5m, 15m, 30m, 1h, 4h, 1d or 1w
        #[arg(short, long, default_value = "1h")]
        interval: String,

        /// Number of candles (1 to 1000)
        #[arg(short, long, default_value_t = 100)]
        limit: usize,
    },

    /// Binance 24 hour statistics for a market symbol (e.g. btcusdt)
    Ticker { symbol: String },

    /// Binance order book snapshot
    Depth {
        symbol: String,

        /// Levels per side
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Binance recent trades
    Trades {
        symbol: String,

        /// Number of trades
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Binance exchange metadata for a market symbol
    Info { symbol: String },
}
