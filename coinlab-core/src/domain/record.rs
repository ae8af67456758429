//! One day of a historical price series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::range::DateRange;
use super::ticker::AssetIdentifier;

/// Daily OHLCV row with market capitalisation.
///
/// `volume` and `market_cap` are optional: the provider displayed `-` for
/// them on the earliest days of many assets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcvRecord {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<f64>,
    pub market_cap: Option<f64>,
}

/// Historical series for one asset, ascending by date with unique dates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoricalSeries {
    pub ticker: String,
    pub slug: AssetIdentifier,
    pub range: DateRange,
    pub records: Vec<OhlcvRecord>,
}

impl HistoricalSeries {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.records.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.records.last().map(|r| r.date)
    }

    pub fn get(&self, date: NaiveDate) -> Option<&OhlcvRecord> {
        self.records
            .binary_search_by_key(&date, |r| r.date)
            .ok()
            .map(|i| &self.records[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(day: u32, close: f64) -> OhlcvRecord {
        OhlcvRecord {
            date: NaiveDate::from_ymd_opt(2018, 3, day).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: None,
            market_cap: None,
        }
    }

    #[test]
    fn lookup_by_date_uses_ordering() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2018, 3, 1).unwrap(),
            Some(NaiveDate::from_ymd_opt(2018, 3, 3).unwrap()),
        )
        .unwrap();
        let series = HistoricalSeries {
            ticker: "btc".into(),
            slug: AssetIdentifier::new("bitcoin"),
            range,
            records: vec![record(1, 10.0), record(2, 11.0), record(3, 12.0)],
        };
        let hit = series.get(NaiveDate::from_ymd_opt(2018, 3, 2).unwrap()).unwrap();
        assert_eq!(hit.close, 11.0);
        assert!(series.get(NaiveDate::from_ymd_opt(2018, 3, 9).unwrap()).is_none());
        assert_eq!(series.last_date(), Some(NaiveDate::from_ymd_opt(2018, 3, 3).unwrap()));
    }
}
