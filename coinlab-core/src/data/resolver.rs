//! Ticker → provider slug resolution against the full asset directory.
//!
//! The directory is re-fetched on every call; callers that resolve the same
//! ticker repeatedly should cache the result themselves.

use std::sync::Arc;

use tracing::{debug, warn};

use super::classify;
use super::provider::{DataError, RawRow, Transport};
use crate::config::{DirectoryLayout, ProviderConfig};
use crate::domain::{AssetIdentifier, TickerSymbol};

/// Path segment in front of the slug in per-asset links.
const CURRENCY_PATH: &str = "/currencies/";

pub struct TickerResolver {
    transport: Arc<dyn Transport>,
    config: Arc<ProviderConfig>,
}

impl TickerResolver {
    pub fn new(transport: Arc<dyn Transport>, config: Arc<ProviderConfig>) -> Self {
        Self { transport, config }
    }

    pub fn directory_url(&self) -> String {
        self.config.web_url(&self.config.directory.path)
    }

    /// Resolve a ticker (any case) to the slug of the first directory row
    /// listing exactly that symbol.
    pub fn resolve(&self, ticker: &str) -> Result<AssetIdentifier, DataError> {
        let symbol = TickerSymbol::parse(ticker)?;
        self.resolve_symbol(&symbol)
    }

    pub fn resolve_symbol(&self, symbol: &TickerSymbol) -> Result<AssetIdentifier, DataError> {
        let url = self.directory_url();
        let page = self
            .transport
            .fetch_page(&url)
            .map_err(|e| classify::transport_failure(&url, e))?;
        classify::check_page(&page)?;

        let unknown = || DataError::UnknownTicker {
            ticker: symbol.to_string(),
        };
        let layout = &self.config.directory;

        // The directory is whichever table carries the symbol column.
        let (table, symbol_idx) = page
            .tables
            .iter()
            .find_map(|t| t.column_index(&layout.symbol_column).map(|i| (t, i)))
            .ok_or_else(|| {
                warn!(url = %url, column = %layout.symbol_column, "directory table not found");
                unknown()
            })?;

        for row in &table.rows {
            let listed = row.cells.get(symbol_idx).map(|c| c.trim());
            if listed != Some(symbol.as_str()) {
                continue;
            }
            match slug_from_row(row, layout) {
                Some(slug) => {
                    debug!(ticker = %symbol, slug = %slug, "ticker resolved");
                    return Ok(slug);
                }
                None => warn!(ticker = %symbol, "directory row lists ticker without a slug"),
            }
        }

        Err(unknown())
    }
}

/// Slug from the row `id` attribute, else from a `/currencies/{slug}/` link.
fn slug_from_row(row: &RawRow, layout: &DirectoryLayout) -> Option<AssetIdentifier> {
    let from_id = row
        .id
        .as_deref()
        .and_then(|id| id.strip_prefix(layout.row_id_prefix.as_str()))
        .filter(|slug| !slug.is_empty());

    from_id
        .map(str::to_string)
        .or_else(|| row.links.iter().flatten().find_map(|href| slug_from_link(href)))
        .map(AssetIdentifier::new)
}

fn slug_from_link(href: &str) -> Option<String> {
    let start = href.find(CURRENCY_PATH)? + CURRENCY_PATH.len();
    let slug = href[start..].split(['/', '?', '#']).next()?;
    (!slug.is_empty()).then(|| slug.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_prefers_row_id() {
        let mut row = RawRow::from_cells(["1", "Bitcoin", "BTC"]);
        row.id = Some("id-bitcoin".into());
        row.links[1] = Some("/currencies/not-this/".into());
        let slug = slug_from_row(&row, &DirectoryLayout::default()).unwrap();
        assert_eq!(slug.as_str(), "bitcoin");
    }

    #[test]
    fn slug_falls_back_to_link() {
        let mut row = RawRow::from_cells(["2", "Ethereum", "ETH"]);
        row.links[1] = Some("https://coinmarketcap.com/currencies/ethereum/?period=7d".into());
        let slug = slug_from_row(&row, &DirectoryLayout::default()).unwrap();
        assert_eq!(slug.as_str(), "ethereum");
    }

    #[test]
    fn row_without_slug() {
        let row = RawRow::from_cells(["3", "Mystery", "MYS"]);
        assert!(slug_from_row(&row, &DirectoryLayout::default()).is_none());
        assert!(slug_from_link("/currencies/").is_none());
    }
}
