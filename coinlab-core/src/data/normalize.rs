//! Response normalization shared by every fetcher: header renaming, type
//! coercion, table selection, column pruning, ordering, and JSON flattening.

use crate::config::TableSelection;
use crate::domain::{FieldValue, OhlcvRecord};
use chrono::NaiveDate;
use serde_json::Value;
use std::collections::BTreeMap;

use super::provider::{RawRow, RawTable};

/// Cell texts the provider uses for "no value".
const PLACEHOLDERS: [&str; 6] = ["", "-", "--", "?", "N/A", "n/a"];

/// Date layouts seen in provider tables, tried in order.
const DATE_FORMATS: [&str; 5] = ["%b %d, %Y", "%B %d, %Y", "%Y-%m-%d", "%m/%d/%Y", "%Y%m%d"];

/// Canonical header name.
///
/// An exact entry in `renames` wins; otherwise trailing footnote markers
/// (`Open*`, `Close**`) are stripped and the lookup is retried.
pub fn canonical_header(raw: &str, renames: &BTreeMap<String, String>) -> String {
    let trimmed = raw.trim();
    if let Some(mapped) = renames.get(trimmed) {
        return mapped.clone();
    }
    let stripped = trimmed.trim_end_matches('*').trim_end();
    renames
        .get(stripped)
        .cloned()
        .unwrap_or_else(|| stripped.to_string())
}

/// Apply [`canonical_header`] to every header of `table`.
pub fn rename_headers(mut table: RawTable, renames: &BTreeMap<String, String>) -> RawTable {
    table.headers = table
        .headers
        .iter()
        .map(|h| canonical_header(h, renames))
        .collect();
    table
}

/// Rename headers found verbatim in `renames`; others are left as displayed.
pub fn map_headers(mut table: RawTable, renames: &BTreeMap<String, String>) -> RawTable {
    for header in &mut table.headers {
        if let Some(mapped) = renames.get(header.trim()) {
            *header = mapped.clone();
        }
    }
    table
}

/// Remove the last column from headers and every row.
pub fn drop_trailing_column(mut table: RawTable) -> RawTable {
    table.headers.pop();
    for row in &mut table.rows {
        truncate_row(row, table.headers.len());
    }
    table
}

fn truncate_row(row: &mut RawRow, width: usize) {
    row.cells.truncate(width);
    row.links.truncate(width);
}

/// Pick the data table from a page according to `selection`.
pub fn select_table(tables: &[RawTable], selection: TableSelection) -> Option<&RawTable> {
    selection.position(tables.len()).and_then(|i| tables.get(i))
}

/// Parse a displayed number such as `$10,385.00`, `8,301,700,000` or `-1.2%`.
///
/// Placeholders (`-`, `?`, `N/A`, empty) yield `None`.
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if PLACEHOLDERS.contains(&trimmed) {
        return None;
    }
    let cleaned: String = trimmed
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '%') && !c.is_whitespace())
        .collect();
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parse a displayed date such as `Mar 01, 2018`.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

/// Coerce a table cell: placeholder → null, numeric → number, else text.
pub fn coerce_cell(text: &str) -> FieldValue {
    let trimmed = text.trim();
    if PLACEHOLDERS.contains(&trimmed) {
        return FieldValue::Null;
    }
    match parse_number(trimmed) {
        Some(n) => FieldValue::Number(n),
        None => FieldValue::Text(trimmed.to_string()),
    }
}

/// Sort ascending by date and keep the first record for each date.
pub fn sort_and_dedupe(records: &mut Vec<OhlcvRecord>) {
    records.sort_by_key(|r| r.date);
    records.dedup_by_key(|r| r.date);
}

/// Convert a JSON scalar to a field value. Arrays of scalars become
/// comma-separated text; objects are not scalars and yield `None`.
pub fn json_scalar(value: &Value) -> Option<FieldValue> {
    match value {
        Value::Null => Some(FieldValue::Null),
        Value::Bool(b) => Some(FieldValue::Bool(*b)),
        Value::Number(n) => n.as_f64().map(FieldValue::Number),
        Value::String(s) => Some(FieldValue::Text(s.clone())),
        Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    Value::Bool(b) => Some(b.to_string()),
                    Value::Object(obj) => obj
                        .get("name")
                        .or_else(|| obj.get("slug"))
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    _ => None,
                })
                .collect();
            Some(FieldValue::Text(parts.join(",")))
        }
        Value::Object(_) => None,
    }
}

/// Flatten `value` into `out`. Nested object keys are joined with `.` under
/// `prefix`; an empty prefix merges keys at the top level.
pub fn flatten_into(prefix: &str, value: &Value, out: &mut BTreeMap<String, FieldValue>) {
    match value {
        Value::Object(map) => {
            for (key, inner) in map {
                let name = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_into(&name, inner, out);
            }
        }
        scalar => {
            if let Some(v) = json_scalar(scalar) {
                out.insert(prefix.to_string(), v);
            }
        }
    }
}
