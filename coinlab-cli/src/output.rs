//! Rendering command results to stdout or files.

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use coinlab_core::data::{
    quote_columns, quotes_to_dataframe, series_to_dataframe, snapshot_to_dataframe,
};
use coinlab_core::domain::{AssetIdentifier, GlobalMetrics, HistoricalSeries, Quote, SnapshotTable};
use polars::prelude::*;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Table,
    Json,
    Csv,
    Parquet,
}

impl Format {
    fn from_extension(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("csv") => Ok(Self::Csv),
            Some("parquet") => Ok(Self::Parquet),
            Some("txt") => Ok(Self::Table),
            _ => bail!(
                "cannot infer output format from '{}': use .json, .csv, .parquet or .txt",
                path.display()
            ),
        }
    }
}

/// Result of one command.
pub enum Report {
    Series(HistoricalSeries),
    Snapshot(SnapshotTable),
    Quotes(Vec<Quote>),
    Global(GlobalMetrics),
    Slug { ticker: String, slug: AssetIdentifier },
}

impl Report {
    pub fn print(&self, format: Format) -> Result<()> {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        match format {
            Format::Parquet => bail!("parquet output needs --output <file>.parquet"),
            other => self.write(other, &mut out),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let format = Format::from_extension(path)?;
        let mut file = std::fs::File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;
        match format {
            Format::Parquet => {
                let mut df = self.to_frame()?;
                ParquetWriter::new(file).finish(&mut df)?;
                Ok(())
            }
            other => self.write(other, &mut file),
        }
    }

    fn write<W: Write>(&self, format: Format, out: &mut W) -> Result<()> {
        match format {
            Format::Table => {
                if let Self::Slug { ticker, slug } = self {
                    writeln!(out, "{ticker} -> {slug}")?;
                } else {
                    writeln!(out, "{}", self.to_frame()?)?;
                }
            }
            Format::Json => {
                writeln!(out, "{}", self.to_json()?)?;
            }
            Format::Csv => {
                let (headers, rows) = self.to_rows();
                let mut writer = csv::Writer::from_writer(out);
                writer.write_record(&headers)?;
                for row in rows {
                    writer.write_record(&row)?;
                }
                writer.flush()?;
            }
            Format::Parquet => bail!("parquet is a binary format; write it to a file"),
        }
        Ok(())
    }

    fn to_frame(&self) -> Result<DataFrame> {
        let df = match self {
            Self::Series(series) => series_to_dataframe(series)?,
            Self::Snapshot(table) => snapshot_to_dataframe(table)?,
            Self::Quotes(quotes) => quotes_to_dataframe(quotes)?,
            Self::Global(metrics) => {
                let (fields, values): (Vec<String>, Vec<String>) = metrics
                    .fields()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_string()))
                    .unzip();
                DataFrame::new(vec![
                    Column::new("field".into(), fields),
                    Column::new("value".into(), values),
                ])?
            }
            Self::Slug { ticker, slug } => DataFrame::new(vec![
                Column::new("ticker".into(), [ticker.as_str()]),
                Column::new("slug".into(), [slug.as_str()]),
            ])?,
        };
        Ok(df)
    }

    fn to_json(&self) -> Result<String> {
        let json = match self {
            Self::Series(series) => serde_json::to_string_pretty(series)?,
            Self::Snapshot(table) => serde_json::to_string_pretty(table)?,
            Self::Quotes(quotes) => serde_json::to_string_pretty(quotes)?,
            Self::Global(metrics) => serde_json::to_string_pretty(metrics)?,
            Self::Slug { ticker, slug } => serde_json::to_string_pretty(&serde_json::json!({
                "ticker": ticker,
                "slug": slug,
            }))?,
        };
        Ok(json)
    }

    fn to_rows(&self) -> (Vec<String>, Vec<Vec<String>>) {
        let opt = |v: Option<f64>| v.map(|n| n.to_string()).unwrap_or_default();
        match self {
            Self::Series(series) => {
                let headers = ["date", "open", "high", "low", "close", "volume", "market_cap"]
                    .map(String::from)
                    .to_vec();
                let rows = series
                    .records
                    .iter()
                    .map(|r| {
                        vec![
                            r.date.format("%Y-%m-%d").to_string(),
                            r.open.to_string(),
                            r.high.to_string(),
                            r.low.to_string(),
                            r.close.to_string(),
                            opt(r.volume),
                            opt(r.market_cap),
                        ]
                    })
                    .collect();
                (headers, rows)
            }
            Self::Snapshot(table) => {
                let rows = table
                    .rows
                    .iter()
                    .map(|row| row.cells.iter().map(ToString::to_string).collect())
                    .collect();
                (table.columns.clone(), rows)
            }
            Self::Quotes(quotes) => {
                let columns = quote_columns(quotes);
                let rows = quotes
                    .iter()
                    .map(|q| {
                        columns
                            .iter()
                            .map(|c| q.get(c).map(ToString::to_string).unwrap_or_default())
                            .collect()
                    })
                    .collect();
                (columns.iter().map(|c| c.to_string()).collect(), rows)
            }
            Self::Global(metrics) => {
                let rows = metrics
                    .fields()
                    .iter()
                    .map(|(k, v)| vec![k.clone(), v.to_string()])
                    .collect();
                (vec!["field".into(), "value".into()], rows)
            }
            Self::Slug { ticker, slug } => (
                vec!["ticker".into(), "slug".into()],
                vec![vec![ticker.clone(), slug.to_string()]],
            ),
        }
    }
}
