//! Coinlab Core: cryptocurrency market data from one provider's pages and API.
//!
//! This crate reconciles the provider's sources into stable shapes:
//! - Ticker directory scan (symbol → slug)
//! - Daily historical series scraped from the historical-data page
//! - Point-in-time market snapshots
//! - Live quotes, global metrics, and rankings from the JSON API
//! - One error taxonomy for every failure mode

pub mod config;
pub mod data;
pub mod domain;

pub use config::{ConfigError, ProviderConfig, TableSelection};
pub use data::{
    Credential, DataError, ErrorKind, HistoricalRequest, HistoricalSeriesFetcher, HttpTransport,
    LiveQuoteClient, SnapshotFetcher, SnapshotRequest, TickerResolver, Transport,
};
