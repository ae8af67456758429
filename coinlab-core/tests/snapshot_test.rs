//! Snapshot fetches against recorded ranking pages from two eras.

use std::sync::Arc;

use chrono::NaiveDate;
use coinlab_core::data::{FixtureTransport, TransportError};
use coinlab_core::domain::{DateStyle, FieldValue};
use coinlab_core::{DataError, ErrorKind, ProviderConfig, SnapshotFetcher, SnapshotRequest};

const SNAPSHOT_2018: &str = include_str!("fixtures/snapshot_20180729.html");
const SNAPSHOT_2013: &str = include_str!("fixtures/snapshot_20130428.html");
const NOT_FOUND: &str = include_str!("fixtures/not_found.html");

const URL_2018: &str = "https://coinmarketcap.com/historical/20180729/";
const URL_2013: &str = "https://coinmarketcap.com/historical/20130428/";

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn fetcher(transport: FixtureTransport) -> SnapshotFetcher {
    SnapshotFetcher::new(Arc::new(transport), Arc::new(ProviderConfig::default()))
}

#[test]
fn snapshot_url_uses_compact_date() {
    let f = fetcher(FixtureTransport::new());
    let request = SnapshotRequest::from_string("2018/7/29", DateStyle::Slash).unwrap();
    assert_eq!(f.snapshot_url(&request), URL_2018);
}

#[test]
fn rank_column_renamed_and_trailing_column_dropped() {
    let table = fetcher(FixtureTransport::new().with_page(URL_2018, SNAPSHOT_2018))
        .fetch(&SnapshotRequest::new(d(2018, 7, 29)))
        .unwrap();

    assert_eq!(table.period, d(2018, 7, 29));
    assert_eq!(table.columns.first().map(String::as_str), Some("Rank"));
    assert!(!table.has_column("#"));
    assert_eq!(table.columns.len(), 10);
    assert_eq!(table.columns.last().map(String::as_str), Some("% 7d"));
    assert!(table.rows.iter().all(|r| r.cells.len() == table.columns.len()));
}

#[test]
fn cells_are_typed() {
    let table = fetcher(FixtureTransport::new().with_page(URL_2018, SNAPSHOT_2018))
        .fetch(&SnapshotRequest::new(d(2018, 7, 29)))
        .unwrap();

    assert_eq!(table.len(), 3);
    assert_eq!(table.rank(0), Some(1));
    assert_eq!(table.name(1).as_deref(), Some("Ethereum"));
    assert_eq!(table.symbol(2).as_deref(), Some("XRP"));
    assert_eq!(table.value(0, "Price"), Some(&FieldValue::Number(8206.58)));
    assert_eq!(table.value(1, "% 24h"), Some(&FieldValue::Number(-0.86)));
}

#[test]
fn column_set_varies_across_eras() {
    // The first tracked day predates the Symbol and Volume columns.
    let table = fetcher(FixtureTransport::new().with_page(URL_2013, SNAPSHOT_2013))
        .fetch(&SnapshotRequest::new(d(2013, 4, 28)))
        .unwrap();
    assert_eq!(table.columns.len(), 6);
    assert!(table.has_column("Rank"));
    assert!(!table.has_column("Symbol"));
    assert_eq!(table.symbol(0), None);
    assert_eq!(table.value(0, "% 7d"), Some(&FieldValue::Null));
}

#[test]
fn date_before_history_fails_without_request() {
    let transport = Arc::new(FixtureTransport::new());
    let f = SnapshotFetcher::new(transport.clone(), Arc::new(ProviderConfig::default()));
    let err = f.fetch(&SnapshotRequest::new(d(2013, 4, 27))).unwrap_err();
    match err {
        DataError::InvalidSnapshotPeriod { earliest, .. } => assert_eq!(earliest, d(2013, 4, 28)),
        other => panic!("expected InvalidSnapshotPeriod, got {other:?}"),
    }
    assert_eq!(transport.request_count(), 0);
}

#[test]
fn not_found_page_is_invalid_period() {
    let err = fetcher(FixtureTransport::new().with_page_status(URL_2018, 404, NOT_FOUND))
        .fetch(&SnapshotRequest::new(d(2018, 7, 29)))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidSnapshotPeriod);
}

#[test]
fn page_without_tables_is_invalid_period() {
    let err = fetcher(FixtureTransport::new().with_page(URL_2018, NOT_FOUND))
        .fetch(&SnapshotRequest::new(d(2018, 7, 29)))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidSnapshotPeriod);
}

#[test]
fn server_error_is_source_unavailable() {
    let err = fetcher(FixtureTransport::new().with_page_status(URL_2018, 502, "<html></html>"))
        .fetch(&SnapshotRequest::new(d(2018, 7, 29)))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SourceUnavailable);

    let err = fetcher(
        FixtureTransport::new().with_failure(URL_2018, TransportError::Connect("refused".into())),
    )
    .fetch(&SnapshotRequest::new(d(2018, 7, 29)))
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SourceUnavailable);
}
