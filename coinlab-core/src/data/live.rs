//! Live quotes, global metrics, and rankings from the provider's JSON API.
//!
//! The per-currency quote objects are merged into flat field maps. The
//! metric set is whatever the provider sends; nothing here enumerates it.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use super::classify::{self, ApiContext};
use super::normalize::{flatten_into, json_scalar};
use super::provider::{ApiResponse, DataError, Transport};
use crate::config::{ProviderConfig, API_KEY_ENV};
use crate::domain::{FieldValue, GlobalMetrics, Quote, TickerSymbol};

pub const QUOTES_PATH: &str = "/v1/cryptocurrency/quotes/latest";
pub const GLOBAL_METRICS_PATH: &str = "/v1/global-metrics/quotes/latest";
pub const LISTINGS_PATH: &str = "/v1/cryptocurrency/listings/latest";

pub const DEFAULT_CURRENCY: &str = "USD";
pub const DEFAULT_LIMIT: usize = 100;
/// Largest page the listings endpoint serves.
pub const MAX_LIMIT: usize = 5000;

/// Identity fields copied from each asset record: (source key, output key).
const QUOTE_IDENTITY: [(&str, &str); 6] = [
    ("name", "name"),
    ("symbol", "symbol"),
    ("cmc_rank", "rank"),
    ("circulating_supply", "circulating_supply"),
    ("total_supply", "total_supply"),
    ("max_supply", "max_supply"),
];

/// Market-wide fields copied from the global metrics record.
const GLOBAL_IDENTITY: [(&str, &str); 5] = [
    ("active_cryptocurrencies", "active_cryptos"),
    ("active_exchanges", "active_exchanges"),
    ("active_market_pairs", "active_market_pairs"),
    ("btc_dominance", "btc_dominance"),
    ("eth_dominance", "eth_dominance"),
];

/// API key plus target fiat currency. Never validated locally.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    api_key: String,
    currency: String,
}

impl Credential {
    /// The currency code is stored upper-cased.
    pub fn new(api_key: impl Into<String>, currency: &str) -> Self {
        Self {
            api_key: api_key.into(),
            currency: currency.trim().to_uppercase(),
        }
    }

    /// Key from `COINMARKETCAP_API_KEY`, if set.
    pub fn from_env(currency: &str) -> Option<Self> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .map(|k| Self::new(k, currency))
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    fn redacted(&self) -> String {
        let tail: String = self
            .api_key
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("****{tail}")
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("api_key", &self.redacted())
            .field("currency", &self.currency)
            .finish()
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "key {} & currency {}", self.redacted(), self.currency)
    }
}

/// Client for the live JSON API. Construction makes no network call; a bad
/// key surfaces as `InvalidCredential` from the first operation.
pub struct LiveQuoteClient {
    transport: Arc<dyn Transport>,
    config: Arc<ProviderConfig>,
    credential: Credential,
}

impl LiveQuoteClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        config: Arc<ProviderConfig>,
        credential: Credential,
    ) -> Self {
        Self {
            transport,
            config,
            credential,
        }
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn currency(&self) -> &str {
        self.credential.currency()
    }

    /// Latest quote for one ticker, flattened.
    pub fn get_quote(&self, ticker: &str) -> Result<Quote, DataError> {
        let symbol = TickerSymbol::parse(ticker)?;
        let response = self.call(
            QUOTES_PATH,
            vec![
                ("convert", self.currency().to_string()),
                ("symbol", symbol.to_string()),
            ],
            ApiContext::Quote {
                ticker: symbol.as_str(),
            },
        )?;
        let url = response.url.as_str();

        let data = response
            .body
            .get("data")
            .and_then(Value::as_object)
            .ok_or_else(|| DataError::malformed(url, "missing 'data' object"))?;

        // v1 keyed each symbol to one object; later versions to an array.
        let entry = data
            .get(symbol.as_str())
            .or_else(|| data.values().next())
            .ok_or_else(|| DataError::UnknownTicker {
                ticker: symbol.to_string(),
            })?;
        let asset = match entry {
            Value::Array(items) => items.first(),
            other => Some(other),
        }
        .and_then(Value::as_object)
        .ok_or_else(|| DataError::UnknownTicker {
            ticker: symbol.to_string(),
        })?;

        let mut fields = BTreeMap::new();
        copy_identity(asset, &QUOTE_IDENTITY, &mut fields);
        if !fields.contains_key("name") || !fields.contains_key("symbol") {
            return Err(DataError::malformed(url, "asset record lacks name or symbol"));
        }
        merge_currency_quote(url, asset, self.currency(), &mut fields)?;
        Ok(Quote::new(fields))
    }

    /// Market-wide metrics in the client currency.
    pub fn get_global_metrics(&self) -> Result<GlobalMetrics, DataError> {
        let response = self.call(
            GLOBAL_METRICS_PATH,
            vec![("convert", self.currency().to_string())],
            ApiContext::GlobalMetrics,
        )?;
        let url = response.url.as_str();

        let data = response
            .body
            .get("data")
            .and_then(Value::as_object)
            .ok_or_else(|| DataError::malformed(url, "missing 'data' object"))?;

        let mut fields = BTreeMap::new();
        copy_identity(data, &GLOBAL_IDENTITY, &mut fields);
        if fields.is_empty() {
            return Err(DataError::malformed(url, "no market-wide figures in response"));
        }
        merge_currency_quote(url, data, self.currency(), &mut fields)?;
        Ok(GlobalMetrics::new(fields))
    }

    /// Top `limit` assets, each flattened to a single flat row.
    ///
    /// Rows are sorted by rank ascending (rows without a rank last, provider
    /// order otherwise kept) and never exceed `limit`.
    pub fn get_top_n(&self, limit: usize) -> Result<Vec<Quote>, DataError> {
        if limit == 0 || limit > MAX_LIMIT {
            return Err(DataError::InvalidInput(format!(
                "limit must be between 1 and {MAX_LIMIT}, got {limit}"
            )));
        }
        let response = self.call(
            LISTINGS_PATH,
            vec![
                ("convert", self.currency().to_string()),
                ("limit", limit.to_string()),
            ],
            ApiContext::Listings,
        )?;
        let url = response.url.as_str();

        let data = response
            .body
            .get("data")
            .and_then(Value::as_array)
            .ok_or_else(|| DataError::malformed(url, "missing 'data' array"))?;

        let mut rows = Vec::with_capacity(data.len().min(limit));
        for (i, item) in data.iter().enumerate() {
            let asset = item
                .as_object()
                .ok_or_else(|| DataError::malformed(url, format!("listing {i} is not an object")))?;
            rows.push(flatten_listing(url, asset, self.currency())?);
        }

        rows.sort_by_key(|q| q.rank().unwrap_or(u32::MAX));
        rows.truncate(limit);
        debug!(rows = rows.len(), limit, "listings fetched");
        Ok(rows)
    }

    fn call(
        &self,
        path: &str,
        query: Vec<(&str, String)>,
        context: ApiContext<'_>,
    ) -> Result<ApiResponse, DataError> {
        let url = self.config.api_url(path);
        let headers = [(
            self.config.api_key_header.as_str(),
            self.credential.api_key(),
        )];
        let response = self
            .transport
            .fetch_json(&url, &headers, &query)
            .map_err(|e| classify::transport_failure(&url, e))?;
        classify::check_api(&response, context)?;
        Ok(response)
    }
}

fn copy_identity(
    source: &Map<String, Value>,
    keys: &[(&str, &str)],
    out: &mut BTreeMap<String, FieldValue>,
) {
    for (from, to) in keys {
        if let Some(v) = source.get(*from).and_then(json_scalar) {
            out.insert((*to).to_string(), v);
        }
    }
}

/// Merge every key of `quote.{currency}` into `out`.
///
/// A metric whose name is already taken by an asset field is stored as
/// `{currency}.{key}`; the asset value is kept.
fn merge_currency_quote(
    url: &str,
    source: &Map<String, Value>,
    currency: &str,
    out: &mut BTreeMap<String, FieldValue>,
) -> Result<(), DataError> {
    let quote = source
        .get("quote")
        .and_then(|q| q.get(currency))
        .filter(|q| q.is_object())
        .ok_or_else(|| DataError::malformed(url, format!("no '{currency}' quote in response")))?;

    let mut metrics = BTreeMap::new();
    flatten_into("", quote, &mut metrics);
    for (key, value) in metrics {
        if out.contains_key(&key) {
            out.insert(format!("{currency}.{key}"), value);
        } else {
            out.insert(key, value);
        }
    }
    Ok(())
}

/// One listing row: every field except `quote` (nested objects dotted),
/// `cmc_rank` also exposed as `rank`, then the currency quote merged in.
fn flatten_listing(
    url: &str,
    asset: &Map<String, Value>,
    currency: &str,
) -> Result<Quote, DataError> {
    let mut fields = BTreeMap::new();
    for (key, value) in asset.iter().filter(|(k, _)| k.as_str() != "quote") {
        flatten_into(key, value, &mut fields);
    }
    if let Some(rank) = asset.get("cmc_rank").and_then(json_scalar) {
        fields.insert("rank".to_string(), rank);
    }
    merge_currency_quote(url, asset, currency, &mut fields)?;
    Ok(Quote::new(fields))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_upper_cases_currency() {
        let cred = Credential::new("abc-123", "eur");
        assert_eq!(cred.currency(), "EUR");
        assert_eq!(cred.api_key(), "abc-123");
    }

    #[test]
    fn credential_debug_hides_key() {
        let cred = Credential::new("0f73d522-ffa1-4b41", "usd");
        let dbg = format!("{cred:?}");
        assert!(!dbg.contains("0f73d522"));
        assert!(dbg.contains("4b41"));
        assert!(cred.to_string().contains("USD"));
    }
}
