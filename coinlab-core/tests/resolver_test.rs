//! Ticker resolution against a recorded copy of the asset directory.

use std::sync::Arc;

use coinlab_core::data::{FixtureTransport, TickerResolver, TransportError};
use coinlab_core::{DataError, ErrorKind, ProviderConfig};

const DIRECTORY: &str = include_str!("fixtures/directory.html");
const DIRECTORY_URL: &str = "https://coinmarketcap.com/all/views/all/";

fn resolver_with(transport: FixtureTransport) -> (TickerResolver, Arc<FixtureTransport>) {
    let transport = Arc::new(transport);
    let resolver = TickerResolver::new(transport.clone(), Arc::new(ProviderConfig::default()));
    (resolver, transport)
}

fn directory() -> (TickerResolver, Arc<FixtureTransport>) {
    resolver_with(FixtureTransport::new().with_page(DIRECTORY_URL, DIRECTORY))
}

#[test]
fn directory_url_uses_configured_layout() {
    let (resolver, _) = directory();
    assert_eq!(resolver.directory_url(), DIRECTORY_URL);
}

#[test]
fn resolves_from_row_id() {
    let (resolver, _) = directory();
    assert_eq!(resolver.resolve("ETH").unwrap().as_str(), "ethereum");
    assert_eq!(resolver.resolve("XRP").unwrap().as_str(), "ripple");
}

#[test]
fn resolution_is_case_insensitive() {
    let (resolver, _) = directory();
    let lower = resolver.resolve("btc").unwrap();
    let upper = resolver.resolve("BTC").unwrap();
    let padded = resolver.resolve("  Btc ").unwrap();
    assert_eq!(lower, upper);
    assert_eq!(upper, padded);
    assert_eq!(lower.as_str(), "bitcoin");
}

#[test]
fn first_listing_wins_for_shared_symbols() {
    // "bitcoin-token" also lists BTC further down the directory.
    let (resolver, _) = directory();
    assert_eq!(resolver.resolve("BTC").unwrap().as_str(), "bitcoin");
}

#[test]
fn resolution_is_idempotent_and_refetches() {
    let (resolver, transport) = directory();
    let first = resolver.resolve("dash").unwrap();
    let second = resolver.resolve("dash").unwrap();
    assert_eq!(first, second);
    assert_eq!(transport.request_count(), 2);
    assert!(transport.requests().iter().all(|r| r.url == DIRECTORY_URL));
}

#[test]
fn row_without_id_falls_back_to_link() {
    let (resolver, _) = directory();
    assert_eq!(resolver.resolve("ltc").unwrap().as_str(), "litecoin");
}

#[test]
fn unknown_symbol_is_unknown_ticker() {
    let (resolver, _) = directory();
    let err = resolver.resolve("NOTACOIN").unwrap_err();
    assert!(matches!(err, DataError::UnknownTicker { ref ticker } if ticker == "NOTACOIN"));
}

#[test]
fn empty_ticker_is_invalid_input_without_network() {
    let (resolver, transport) = directory();
    let err = resolver.resolve("   ").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(transport.request_count(), 0);
}

#[test]
fn page_without_directory_table_is_unknown_ticker() {
    let (resolver, _) = resolver_with(
        FixtureTransport::new().with_page(DIRECTORY_URL, "<html><body><p>maintenance</p></body></html>"),
    );
    assert_eq!(resolver.resolve("BTC").unwrap_err().kind(), ErrorKind::UnknownTicker);
}

#[test]
fn unreachable_directory_is_source_unavailable() {
    let (resolver, _) = resolver_with(
        FixtureTransport::new()
            .with_failure(DIRECTORY_URL, TransportError::Timeout("30s elapsed".into())),
    );
    assert_eq!(
        resolver.resolve("BTC").unwrap_err().kind(),
        ErrorKind::SourceUnavailable
    );
}

#[test]
fn server_error_page_is_source_unavailable() {
    let (resolver, _) = resolver_with(
        FixtureTransport::new().with_page_status(DIRECTORY_URL, 503, "<html>busy</html>"),
    );
    assert_eq!(
        resolver.resolve("BTC").unwrap_err().kind(),
        ErrorKind::SourceUnavailable
    );
}
