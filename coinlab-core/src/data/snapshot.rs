//! Historical market snapshots: the full ranking table on one calendar date.

use std::fmt;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::classify;
use super::normalize::{coerce_cell, drop_trailing_column, map_headers, select_table};
use super::provider::{DataError, RawTable, Transport};
use crate::config::ProviderConfig;
use crate::domain::{compact, readable, DateStyle, SnapshotRow, SnapshotTable};

/// The date of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRequest {
    period: NaiveDate,
}

impl SnapshotRequest {
    pub fn new(period: NaiveDate) -> Self {
        Self { period }
    }

    pub fn from_string(period: &str, style: DateStyle) -> Result<Self, DataError> {
        Ok(Self::new(style.parse(period)?))
    }

    pub fn period(&self) -> NaiveDate {
        self.period
    }

    pub fn compact(&self) -> String {
        compact(self.period)
    }
}

impl fmt::Display for SnapshotRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "historical snapshot for the period: {}", readable(self.period))
    }
}

pub struct SnapshotFetcher {
    transport: Arc<dyn Transport>,
    config: Arc<ProviderConfig>,
}

impl SnapshotFetcher {
    pub fn new(transport: Arc<dyn Transport>, config: Arc<ProviderConfig>) -> Self {
        Self { transport, config }
    }

    pub fn snapshot_url(&self, request: &SnapshotRequest) -> String {
        self.config
            .web_url(&format!("/historical/{}/", request.compact()))
    }

    /// Fetch the ranking table as displayed on the requested date.
    ///
    /// Dates outside the tracked history fail with `InvalidSnapshotPeriod`
    /// before any request is made; the page itself is checked again because
    /// the provider's own range can differ from the configured one.
    pub fn fetch(&self, request: &SnapshotRequest) -> Result<SnapshotTable, DataError> {
        let period = request.period();
        let earliest = self.config.snapshot_history_start;
        let latest = Local::now().date_naive();
        if period < earliest || period > latest {
            return Err(DataError::InvalidSnapshotPeriod {
                period,
                earliest,
                latest,
            });
        }

        let url = self.snapshot_url(request);
        let page = self
            .transport
            .fetch_page(&url)
            .map_err(|e| classify::transport_failure(&url, e))?;
        classify::check_snapshot_page(&page, period, earliest, latest)?;

        let table = select_table(&page.tables, self.config.snapshot_table)
            .ok_or_else(|| DataError::malformed(&url, "no ranking table on page"))?;
        let table = normalize_snapshot(table.clone(), &self.config);
        if table.headers.is_empty() || table.rows.is_empty() {
            return Err(DataError::malformed(&url, "ranking table is empty"));
        }
        debug!(period = %period, rows = table.rows.len(), columns = table.headers.len(), "snapshot fetched");

        Ok(SnapshotTable {
            period,
            columns: table.headers,
            rows: table
                .rows
                .iter()
                .map(|row| SnapshotRow {
                    cells: row.cells.iter().map(|c| coerce_cell(c)).collect(),
                })
                .collect(),
        })
    }
}

/// Rename the rank column and drop the trailing UI-only column.
pub fn normalize_snapshot(table: RawTable, config: &ProviderConfig) -> RawTable {
    let table = map_headers(table, &config.snapshot_columns);
    drop_trailing_column(table)
}
