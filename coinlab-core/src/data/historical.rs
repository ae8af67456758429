//! Daily historical series: request construction, page fetch, normalization.

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::classify;
use super::normalize::{
    parse_date, parse_number, rename_headers, select_table, sort_and_dedupe,
};
use super::provider::{DataError, RawTable, Transport};
use super::resolver::TickerResolver;
use crate::config::ProviderConfig;
use crate::domain::{readable, AssetIdentifier, DateRange, DateStyle, HistoricalSeries, OhlcvRecord};

/// Canonical column names after header normalization.
pub const DATE: &str = "Date";
pub const OPEN: &str = "Open";
pub const HIGH: &str = "High";
pub const LOW: &str = "Low";
pub const CLOSE: &str = "Close";
pub const VOLUME: &str = "Volume";
pub const MARKET_CAP: &str = "Market_cap";

/// Columns a historical table must carry.
pub const REQUIRED_COLUMNS: [&str; 5] = [DATE, OPEN, HIGH, LOW, CLOSE];

/// A ticker plus an inclusive date range. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalRequest {
    ticker: String,
    range: DateRange,
}

impl HistoricalRequest {
    /// `end` defaults to today. The ticker is stored exactly as given.
    pub fn new(
        ticker: impl Into<String>,
        start: NaiveDate,
        end: Option<NaiveDate>,
    ) -> Result<Self, DataError> {
        Ok(Self {
            ticker: ticker.into(),
            range: DateRange::new(start, end)?,
        })
    }

    /// Build from `YYYY-M-D` or `YYYY/M/D` strings in the given style.
    pub fn from_strings(
        ticker: impl Into<String>,
        start: &str,
        end: Option<&str>,
        style: DateStyle,
    ) -> Result<Self, DataError> {
        let start = style.parse(start)?;
        let end = end.map(|e| style.parse(e)).transpose()?;
        Self::new(ticker, start, end)
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    pub fn start(&self) -> String {
        self.range.start_compact()
    }

    pub fn end(&self) -> String {
        self.range.end_compact()
    }
}

impl fmt::Display for HistoricalRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "historical request: crypto_symbol: {}, start_period: {}, end_period: {}",
            self.ticker,
            readable(self.range.start()),
            readable(self.range.end())
        )
    }
}

/// Fetches and normalizes daily series from the provider's historical page.
pub struct HistoricalSeriesFetcher {
    transport: Arc<dyn Transport>,
    config: Arc<ProviderConfig>,
    resolver: TickerResolver,
}

impl HistoricalSeriesFetcher {
    pub fn new(transport: Arc<dyn Transport>, config: Arc<ProviderConfig>) -> Self {
        let resolver = TickerResolver::new(Arc::clone(&transport), Arc::clone(&config));
        Self {
            transport,
            config,
            resolver,
        }
    }

    pub fn history_url(&self, slug: &AssetIdentifier, range: &DateRange) -> String {
        self.config.web_url(&format!(
            "/currencies/{slug}/historical-data/?start={}&end={}",
            range.start_compact(),
            range.end_compact()
        ))
    }

    /// Resolve the ticker, fetch the page, and return the ascending series.
    pub fn fetch(&self, request: &HistoricalRequest) -> Result<HistoricalSeries, DataError> {
        let slug = self.resolver.resolve(request.ticker())?;
        let url = self.history_url(&slug, &request.range());

        let page = self
            .transport
            .fetch_page(&url)
            .map_err(|e| classify::transport_failure(&url, e))?;
        classify::check_page(&page)?;

        let table = select_table(&page.tables, self.config.history_table)
            .ok_or_else(|| DataError::malformed(&url, "no data table on page"))?;
        let table = rename_headers(table.clone(), &self.config.history_columns);
        let records = normalize_history(&url, &table)?;
        debug!(ticker = request.ticker(), slug = %slug, rows = records.len(), "historical series fetched");

        Ok(HistoricalSeries {
            ticker: request.ticker().to_string(),
            slug,
            range: request.range(),
            records,
        })
    }
}

/// Turn a header-normalized table into ascending, date-unique records.
pub fn normalize_history(url: &str, table: &RawTable) -> Result<Vec<OhlcvRecord>, DataError> {
    let column = |name: &str| table.column_index(name);
    let mut idx = [0usize; 5];
    for (slot, name) in idx.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = column(name)
            .ok_or_else(|| DataError::malformed(url, format!("missing column '{name}'")))?;
    }
    let [date_i, open_i, high_i, low_i, close_i] = idx;
    let volume_i = column(VOLUME);
    let cap_i = column(MARKET_CAP);

    let mut records = Vec::with_capacity(table.rows.len());
    for (n, row) in table.rows.iter().enumerate() {
        // Placeholder rows ("No data was found ...") span fewer cells.
        if row.cells.len() < table.headers.len() {
            warn!(url, row = n, cells = row.cells.len(), "skipping short row");
            continue;
        }

        let cell = |i: usize| row.cells[i].as_str();
        let date = parse_date(cell(date_i)).ok_or_else(|| {
            DataError::malformed(url, format!("row {n}: unparseable date '{}'", cell(date_i)))
        })?;
        let price = |i: usize, name: &str| {
            parse_number(cell(i)).ok_or_else(|| {
                DataError::malformed(url, format!("row {n}: unparseable {name} '{}'", cell(i)))
            })
        };

        records.push(OhlcvRecord {
            date,
            open: price(open_i, OPEN)?,
            high: price(high_i, HIGH)?,
            low: price(low_i, LOW)?,
            close: price(close_i, CLOSE)?,
            volume: volume_i.and_then(|i| parse_number(cell(i))),
            market_cap: cap_i.and_then(|i| parse_number(cell(i))),
        });
    }

    if records.is_empty() {
        return Err(DataError::malformed(url, "data table has no rows"));
    }

    sort_and_dedupe(&mut records);
    Ok(records)
}
