//! Transport capability trait and structured error types.
//!
//! The Transport trait abstracts over how pages and API payloads are fetched
//! (live HTTP, in-memory fixtures) so the fetchers can be driven offline in
//! tests. Transports only move bytes and extract tables: deciding whether a
//! status code or payload is an error belongs to [`super::classify`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One row of an HTML table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    /// The row's `id` attribute (the provider directory encodes slugs here).
    pub id: Option<String>,
    /// Whitespace-normalized cell text.
    pub cells: Vec<String>,
    /// First link target found in each cell, aligned with `cells`.
    pub links: Vec<Option<String>>,
}

impl RawRow {
    /// Row with text cells only; handy for fixtures.
    pub fn from_cells<I, S>(cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let cells: Vec<String> = cells.into_iter().map(Into::into).collect();
        let links = vec![None; cells.len()];
        Self {
            id: None,
            cells,
            links,
        }
    }
}

/// An HTML table as extracted from a page, before any normalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }
}

/// A fetched HTML page.
#[derive(Debug, Clone)]
pub struct Page {
    pub url: String,
    pub status: u16,
    pub tables: Vec<RawTable>,
}

impl Page {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A fetched JSON API payload.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub url: String,
    pub status: u16,
    pub body: serde_json::Value,
}

/// Low-level failure raised by a transport before any response was usable.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("too many redirects: {0}")]
    Redirect(String),

    #[error("could not decode response body: {0}")]
    Decode(String),

    #[error("transport setup failed: {0}")]
    Setup(String),

    #[error("request failed: {0}")]
    Other(String),
}

/// Closed error taxonomy surfaced by every public operation.
///
/// Every variant carries the ticker, date, or URL needed to act on it.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unknown ticker '{ticker}': not listed by the provider")]
    UnknownTicker { ticker: String },

    #[error("no snapshot for {period}: valid periods run from {earliest} to {latest}")]
    InvalidSnapshotPeriod {
        period: NaiveDate,
        earliest: NaiveDate,
        latest: NaiveDate,
    },

    #[error("API key rejected by provider: {0}")]
    InvalidCredential(String),

    #[error("malformed response from {url}: {reason}")]
    MalformedResponse { url: String, reason: String },

    #[error("source unavailable at {url}: {reason}")]
    SourceUnavailable { url: String, reason: String },
}

/// Fieldless mirror of [`DataError`] for matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidInput,
    UnknownTicker,
    InvalidSnapshotPeriod,
    InvalidCredential,
    MalformedResponse,
    SourceUnavailable,
}

impl DataError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::UnknownTicker { .. } => ErrorKind::UnknownTicker,
            Self::InvalidSnapshotPeriod { .. } => ErrorKind::InvalidSnapshotPeriod,
            Self::InvalidCredential(_) => ErrorKind::InvalidCredential,
            Self::MalformedResponse { .. } => ErrorKind::MalformedResponse,
            Self::SourceUnavailable { .. } => ErrorKind::SourceUnavailable,
        }
    }

    pub(crate) fn malformed(url: &str, reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unavailable(url: &str, reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            url: url.to_string(),
            reason: reason.into(),
        }
    }
}

/// Capability to fetch provider pages and API payloads.
///
/// Implementations may keep a connection pool between calls. They must be
/// safe for sequential use by one owner; concurrent use is only safe when the
/// implementation says so (`HttpTransport` is).
pub trait Transport: Send + Sync {
    /// Human-readable name of this transport.
    fn name(&self) -> &str;

    /// GET an HTML page and extract every table on it.
    ///
    /// Non-2xx responses are returned as a `Page` with that status.
    fn fetch_page(&self, url: &str) -> Result<Page, TransportError>;

    /// GET a JSON endpoint with extra headers and query parameters.
    ///
    /// Non-2xx responses are returned; an undecodable error body becomes
    /// `Value::Null`.
    fn fetch_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        query: &[(&str, String)],
    ) -> Result<ApiResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_mirrors_variant() {
        let err = DataError::UnknownTicker {
            ticker: "FAKE".into(),
        };
        assert_eq!(err.kind(), ErrorKind::UnknownTicker);
        assert_eq!(
            DataError::unavailable("http://x", "refused").kind(),
            ErrorKind::SourceUnavailable
        );
    }

    #[test]
    fn errors_name_their_context() {
        let err = DataError::InvalidSnapshotPeriod {
            period: NaiveDate::from_ymd_opt(1999, 1, 1).unwrap(),
            earliest: NaiveDate::from_ymd_opt(2013, 4, 28).unwrap(),
            latest: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        };
        let msg = err.to_string();
        assert!(msg.contains("1999-01-01"));
        assert!(msg.contains("2013-04-28"));
    }

    #[test]
    fn row_from_cells_aligns_links() {
        let row = RawRow::from_cells(["1", "Bitcoin"]);
        assert_eq!(row.links.len(), 2);
        assert!(row.id.is_none());
    }
}
