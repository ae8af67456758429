//! Provider access: transport, classification, normalization, and fetchers.

pub mod classify;
pub mod fixture;
pub mod historical;
pub mod html;
pub mod http;
pub mod live;
pub mod normalize;
pub mod provider;
pub mod resolver;
pub mod schema;
pub mod snapshot;

pub use fixture::FixtureTransport;
pub use historical::{HistoricalRequest, HistoricalSeriesFetcher};
pub use http::HttpTransport;
pub use live::{Credential, LiveQuoteClient};
pub use provider::{ApiResponse, DataError, ErrorKind, Page, RawRow, RawTable, Transport, TransportError};
pub use resolver::TickerResolver;
pub use schema::{quote_columns, quotes_to_dataframe, series_to_dataframe, snapshot_to_dataframe, SchemaError, SeriesSchema};
pub use snapshot::{SnapshotFetcher, SnapshotRequest};
