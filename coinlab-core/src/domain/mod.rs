//! Domain types for coinlab

pub mod field;
pub mod quote;
pub mod range;
pub mod record;
pub mod snapshot;
pub mod ticker;

pub use field::FieldValue;
pub use quote::{GlobalMetrics, Quote};
pub use range::{compact, parse_date, readable, DateRange, DateStyle};
pub use record::{HistoricalSeries, OhlcvRecord};
pub use snapshot::{SnapshotRow, SnapshotTable};
pub use ticker::{AssetIdentifier, TickerSymbol};
