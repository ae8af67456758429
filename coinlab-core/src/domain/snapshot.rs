//! Point-in-time market ranking table.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::field::FieldValue;

/// One ranking row; `cells` line up with [`SnapshotTable::columns`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRow {
    pub cells: Vec<FieldValue>,
}

/// The full-market table as displayed on `period`.
///
/// Column count differs between periods because the provider's page layout
/// changed over time. Look columns up by name instead of position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotTable {
    pub period: NaiveDate,
    pub columns: Vec<String>,
    pub rows: Vec<SnapshotRow>,
}

impl SnapshotTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Value of `column` in `row`, if both exist.
    pub fn value(&self, row: usize, column: &str) -> Option<&FieldValue> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.cells.get(idx)
    }

    pub fn rank(&self, row: usize) -> Option<u32> {
        self.value(row, "Rank")
            .and_then(FieldValue::as_f64)
            .map(|r| r as u32)
    }

    pub fn name(&self, row: usize) -> Option<String> {
        self.value(row, "Name").map(ToString::to_string)
    }

    pub fn symbol(&self, row: usize) -> Option<String> {
        self.value(row, "Symbol").map(ToString::to_string)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
