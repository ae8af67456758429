//! Coinlab CLI: historical, snapshot, and live market data commands.
//!
//! Commands:
//! - `historical`: daily OHLCV series for one ticker over a date range
//! - `snapshot`: the full ranking table as displayed on one date
//! - `quote`: latest quote for one ticker (needs an API key)
//! - `global`: market-wide metrics (needs an API key)
//! - `top`: top-N assets by rank (needs an API key)
//! - `resolve`: show the provider slug a ticker maps to

mod output;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use coinlab_core::config::API_KEY_ENV;
use coinlab_core::data::live::{DEFAULT_CURRENCY, DEFAULT_LIMIT};
use coinlab_core::domain::parse_date;
use coinlab_core::{
    Credential, HistoricalRequest, HistoricalSeriesFetcher, HttpTransport, LiveQuoteClient,
    ProviderConfig, SnapshotFetcher, SnapshotRequest, TickerResolver, Transport,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use output::{Format, Report};

#[derive(Parser)]
#[command(
    name = "coinlab",
    about = "Coinlab CLI: cryptocurrency market data from CoinMarketCap"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Provider config TOML. Defaults to the public provider endpoints.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format on stdout.
    #[arg(long, global = true, value_enum, default_value_t = Format::Table)]
    format: Format,

    /// Write to a file instead; the format follows the extension (.json, .csv, .parquet).
    #[arg(long, short, global = true)]
    output: Option<PathBuf>,

    /// Debug logging (overrides RUST_LOG).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Daily OHLCV series for one ticker.
    Historical {
        /// Ticker symbol (e.g., BTC, eth).
        ticker: String,

        /// Start date (YYYY-MM-DD or YYYY/MM/DD).
        #[arg(long)]
        start: String,

        /// End date (YYYY-MM-DD or YYYY/MM/DD). Defaults to today.
        #[arg(long)]
        end: Option<String>,
    },
    /// Market ranking table as displayed on one date.
    Snapshot {
        /// Snapshot date (YYYY-MM-DD or YYYY/MM/DD).
        date: String,
    },
    /// Latest quote for one ticker.
    Quote {
        /// Ticker symbol.
        ticker: String,

        #[command(flatten)]
        api: ApiArgs,
    },
    /// Market-wide metrics.
    Global {
        #[command(flatten)]
        api: ApiArgs,
    },
    /// Top assets by rank.
    Top {
        /// Number of assets (1-5000).
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,

        #[command(flatten)]
        api: ApiArgs,
    },
    /// Show the provider slug for a ticker.
    Resolve {
        /// Ticker symbol.
        ticker: String,
    },
}

#[derive(Args)]
struct ApiArgs {
    /// API key. Defaults to the COINMARKETCAP_API_KEY environment variable.
    #[arg(long)]
    api_key: Option<String>,

    /// Fiat currency for prices.
    #[arg(long, default_value = DEFAULT_CURRENCY)]
    currency: String,
}

impl ApiArgs {
    fn credential(&self) -> Result<Credential> {
        match &self.api_key {
            Some(key) => Ok(Credential::new(key.as_str(), &self.currency)),
            None => Credential::from_env(&self.currency)
                .with_context(|| format!("no API key: pass --api-key or set {API_KEY_ENV}")),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Arc::new(load_config(cli.config.as_ref())?);
    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(&config)?);
    debug!(transport = transport.name(), web = %config.web_base_url, api = %config.api_base_url, "provider ready");

    let report = match cli.command {
        Commands::Historical { ticker, start, end } => {
            run_historical(transport, config, ticker, &start, end.as_deref())?
        }
        Commands::Snapshot { date } => {
            let request = SnapshotRequest::new(parse_date(&date)?);
            eprintln!("{request}");
            Report::Snapshot(SnapshotFetcher::new(transport, config).fetch(&request)?)
        }
        Commands::Quote { ticker, api } => {
            let client = LiveQuoteClient::new(transport, config, api.credential()?);
            Report::Quotes(vec![client.get_quote(&ticker)?])
        }
        Commands::Global { api } => {
            let client = LiveQuoteClient::new(transport, config, api.credential()?);
            Report::Global(client.get_global_metrics()?)
        }
        Commands::Top { limit, api } => {
            let client = LiveQuoteClient::new(transport, config, api.credential()?);
            Report::Quotes(client.get_top_n(limit)?)
        }
        Commands::Resolve { ticker } => {
            let slug = TickerResolver::new(transport, config).resolve(&ticker)?;
            Report::Slug { ticker, slug }
        }
    };

    match cli.output {
        Some(path) => {
            report.save(&path)?;
            eprintln!("Saved to: {}", path.display());
        }
        None => report.print(cli.format)?,
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<ProviderConfig> {
    match path {
        Some(path) => ProviderConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(ProviderConfig::default()),
    }
}

fn run_historical(
    transport: Arc<dyn Transport>,
    config: Arc<ProviderConfig>,
    ticker: String,
    start: &str,
    end: Option<&str>,
) -> Result<Report> {
    // Each date may use either separator.
    let start = parse_date(start)?;
    let end = end.map(parse_date).transpose()?;
    let request = HistoricalRequest::new(ticker, start, end)?;
    eprintln!("{request}");

    let series = HistoricalSeriesFetcher::new(transport, config).fetch(&request)?;
    Ok(Report::Series(series))
}
