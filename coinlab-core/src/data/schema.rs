use polars::prelude::*;
use std::collections::HashSet;

use crate::domain::{FieldValue, HistoricalSeries, Quote, SnapshotTable};

/// Identity columns placed first when quotes are laid out as a table.
const QUOTE_LEADING_COLUMNS: [&str; 3] = ["rank", "name", "symbol"];

/// Expected schema for a historical series frame
pub struct SeriesSchema;

impl SeriesSchema {
    /// Get the canonical historical schema
    pub fn schema() -> Schema {
        Schema::from_iter(vec![
            Field::new("date".into(), DataType::Date),
            Field::new("open".into(), DataType::Float64),
            Field::new("high".into(), DataType::Float64),
            Field::new("low".into(), DataType::Float64),
            Field::new("close".into(), DataType::Float64),
            Field::new("volume".into(), DataType::Float64),
            Field::new("market_cap".into(), DataType::Float64),
        ])
    }

    /// Check that every canonical column is present with its canonical type.
    /// Extra columns are allowed.
    pub fn validate(df: &DataFrame) -> Result<(), SchemaError> {
        let actual = df.schema();
        Self::schema().iter_fields().try_for_each(|field| {
            let name = field.name().to_string();
            match actual.get(name.as_str()) {
                None => Err(SchemaError::MissingColumn(name)),
                Some(dtype) if dtype != field.dtype() => Err(SchemaError::TypeMismatch {
                    column: name,
                    expected: field.dtype().clone(),
                    actual: dtype.clone(),
                }),
                Some(_) => Ok(()),
            }
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Type mismatch in column {column}: expected {expected:?}, got {actual:?}")]
    TypeMismatch {
        column: String,
        expected: DataType,
        actual: DataType,
    },

    #[error("DataFrame construction failed: {0}")]
    Frame(String),
}

impl From<PolarsError> for SchemaError {
    fn from(e: PolarsError) -> Self {
        Self::Frame(e.to_string())
    }
}

// ── Conversions ─────────────────────────────────────────────────────

/// Historical series as a date-ordered frame matching [`SeriesSchema`].
pub fn series_to_dataframe(series: &HistoricalSeries) -> Result<DataFrame, SchemaError> {
    let epoch = chrono::NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
    let records = &series.records;

    let dates: Vec<i32> = records
        .iter()
        .map(|r| (r.date - epoch).num_days() as i32)
        .collect();
    let opens: Vec<f64> = records.iter().map(|r| r.open).collect();
    let highs: Vec<f64> = records.iter().map(|r| r.high).collect();
    let lows: Vec<f64> = records.iter().map(|r| r.low).collect();
    let closes: Vec<f64> = records.iter().map(|r| r.close).collect();
    let volumes: Vec<Option<f64>> = records.iter().map(|r| r.volume).collect();
    let caps: Vec<Option<f64>> = records.iter().map(|r| r.market_cap).collect();

    let df = DataFrame::new(vec![
        Column::new("date".into(), dates).cast(&DataType::Date)?,
        Column::new("open".into(), opens),
        Column::new("high".into(), highs),
        Column::new("low".into(), lows),
        Column::new("close".into(), closes),
        Column::new("volume".into(), volumes),
        Column::new("market_cap".into(), caps),
    ])?;
    SeriesSchema::validate(&df)?;
    Ok(df)
}

/// Snapshot as a frame; one column per displayed column, in page order.
pub fn snapshot_to_dataframe(table: &SnapshotTable) -> Result<DataFrame, SchemaError> {
    let names = frame_names(&table.columns);
    let columns = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let values: Vec<Option<&FieldValue>> =
                table.rows.iter().map(|row| row.cells.get(i)).collect();
            field_column(name, &values)
        })
        .collect();
    Ok(DataFrame::new(columns)?)
}

/// Column order for a set of quotes: the union of their fields, with
/// `rank`, `name`, `symbol` leading and the rest alphabetical.
pub fn quote_columns(quotes: &[Quote]) -> Vec<&str> {
    let mut names: Vec<&str> = QUOTE_LEADING_COLUMNS
        .iter()
        .copied()
        .filter(|c| quotes.iter().any(|q| q.contains(c)))
        .collect();
    let mut rest: Vec<&str> = quotes
        .iter()
        .flat_map(|q| q.keys())
        .filter(|k| !QUOTE_LEADING_COLUMNS.contains(k))
        .collect();
    rest.sort_unstable();
    rest.dedup();
    names.extend(rest);
    names
}

/// Quotes as a frame over [`quote_columns`]. Fields a quote lacks are null.
pub fn quotes_to_dataframe(quotes: &[Quote]) -> Result<DataFrame, SchemaError> {
    let columns = quote_columns(quotes)
        .iter()
        .map(|name| {
            let values: Vec<Option<&FieldValue>> = quotes.iter().map(|q| q.get(name)).collect();
            field_column(name, &values)
        })
        .collect();
    Ok(DataFrame::new(columns)?)
}

/// Provider tables occasionally repeat or blank a header. Blanks become
/// `column_{i}`; repeats get `_2`, `_3`, ... in page order.
fn frame_names(headers: &[String]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(headers.len());
    headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            let base = if header.is_empty() {
                format!("column_{i}")
            } else {
                header.clone()
            };
            let mut name = base.clone();
            let mut n = 2;
            while !seen.insert(name.clone()) {
                name = format!("{base}_{n}");
                n += 1;
            }
            name
        })
        .collect()
}

/// Numeric when every present value is a number, boolean when every present
/// value is a boolean, text otherwise.
fn field_column(name: &str, values: &[Option<&FieldValue>]) -> Column {
    let present = || {
        values
            .iter()
            .flatten()
            .filter(|v| !v.is_null())
    };

    if present().all(|v| matches!(v, FieldValue::Number(_))) {
        let nums: Vec<Option<f64>> = values
            .iter()
            .map(|v| v.and_then(FieldValue::as_f64))
            .collect();
        return Column::new(name.into(), nums);
    }
    if present().all(|v| matches!(v, FieldValue::Bool(_))) {
        let flags: Vec<Option<bool>> = values
            .iter()
            .map(|v| match v {
                Some(FieldValue::Bool(b)) => Some(*b),
                _ => None,
            })
            .collect();
        return Column::new(name.into(), flags);
    }
    let texts: Vec<Option<String>> = values
        .iter()
        .map(|v| v.filter(|f| !f.is_null()).map(ToString::to_string))
        .collect();
    Column::new(name.into(), texts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AssetIdentifier, DateRange, OhlcvRecord, SnapshotRow};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn series() -> HistoricalSeries {
        let d = |day| NaiveDate::from_ymd_opt(2018, 3, day).unwrap();
        HistoricalSeries {
            ticker: "btc".into(),
            slug: AssetIdentifier::new("bitcoin"),
            range: DateRange::new(d(1), Some(d(2))).unwrap(),
            records: vec![
                OhlcvRecord {
                    date: d(1),
                    open: 10_385.0,
                    high: 11_052.0,
                    low: 10_352.0,
                    close: 10_951.0,
                    volume: Some(7_317_279_744.0),
                    market_cap: Some(175_494_000_000.0),
                },
                OhlcvRecord {
                    date: d(2),
                    open: 10_977.0,
                    high: 11_189.0,
                    low: 10_850.0,
                    close: 11_086.0,
                    volume: None,
                    market_cap: None,
                },
            ],
        }
    }

    #[test]
    fn test_schema_has_all_required_columns() {
        let schema = SeriesSchema::schema();
        for col in ["date", "open", "high", "low", "close", "volume", "market_cap"] {
            assert!(schema.contains(col));
        }
    }

    #[test]
    fn test_series_frame_matches_schema() {
        let df = series_to_dataframe(&series()).unwrap();
        assert_eq!(df.height(), 2);
        let result = SeriesSchema::validate(&df);
        if let Err(ref e) = result {
            eprintln!("Validation error: {:?}", e);
        }
        assert!(result.is_ok());
        assert_eq!(df.column("volume").unwrap().null_count(), 1);
    }

    #[test]
    fn test_validate_rejects_missing_column() {
        let df = DataFrame::new(vec![Column::new("open".into(), &[400.0])]).unwrap();
        let result = SeriesSchema::validate(&df);
        assert!(matches!(result.unwrap_err(), SchemaError::MissingColumn(_)));
    }

    #[test]
    fn test_validate_rejects_wrong_type() {
        let mut df = series_to_dataframe(&series()).unwrap();
        df.with_column(Column::new("open".into(), &["a", "b"])).unwrap();
        let result = SeriesSchema::validate(&df);
        assert!(matches!(result.unwrap_err(), SchemaError::TypeMismatch { .. }));
    }

    #[test]
    fn test_snapshot_columns_are_typed() {
        let table = SnapshotTable {
            period: NaiveDate::from_ymd_opt(2018, 7, 29).unwrap(),
            columns: vec!["Rank".into(), "Name".into(), "Price".into()],
            rows: vec![
                SnapshotRow {
                    cells: vec![1.0.into(), "Bitcoin".into(), 8200.5.into()],
                },
                SnapshotRow {
                    cells: vec![2.0.into(), "Ethereum".into(), FieldValue::Null],
                },
            ],
        };
        let df = snapshot_to_dataframe(&table).unwrap();
        assert_eq!(df.width(), 3);
        assert_eq!(df.column("Price").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("Name").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_snapshot_repeated_and_blank_headers() {
        let table = SnapshotTable {
            period: NaiveDate::from_ymd_opt(2018, 7, 29).unwrap(),
            columns: vec!["Rank".into(), "Name".into(), "Name".into(), "".into(), "Name".into()],
            rows: vec![SnapshotRow {
                cells: vec![1.0.into(), "Bitcoin".into(), "BTC".into(), "x".into(), "y".into()],
            }],
        };
        let df = snapshot_to_dataframe(&table).unwrap();
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names, vec!["Rank", "Name", "Name_2", "column_3", "Name_3"]);
    }

    #[test]
    fn test_quotes_union_of_fields() {
        let mut a = BTreeMap::new();
        a.insert("name".to_string(), FieldValue::from("Bitcoin"));
        a.insert("rank".to_string(), FieldValue::Number(1.0));
        a.insert("price".to_string(), FieldValue::Number(8000.0));
        let mut b = BTreeMap::new();
        b.insert("name".to_string(), FieldValue::from("Ethereum"));
        b.insert("rank".to_string(), FieldValue::Number(2.0));
        b.insert("tags".to_string(), FieldValue::from("smart-contracts"));

        let df = quotes_to_dataframe(&[Quote::new(a), Quote::new(b)]).unwrap();
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names, vec!["rank", "name", "price", "tags"]);
        assert_eq!(df.column("tags").unwrap().null_count(), 1);
    }
}
