//! Flattened live quote and global metric records.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::field::FieldValue;

/// Flat field map for one asset in one fiat currency.
///
/// Identity fields (`name`, `symbol`, `rank`, supply figures) sit next to
/// whatever metric fields the provider returns for the currency, so new
/// provider metrics pass through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quote {
    fields: BTreeMap<String, FieldValue>,
}

impl Quote {
    pub fn new(fields: BTreeMap<String, FieldValue>) -> Self {
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(FieldValue::as_f64)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(FieldValue::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.text("name")
    }

    pub fn symbol(&self) -> Option<&str> {
        self.text("symbol")
    }

    pub fn rank(&self) -> Option<u32> {
        self.number("rank").map(|r| r as u32)
    }

    pub fn price(&self) -> Option<f64> {
        self.number("price")
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Market-wide figures plus the currency quote metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GlobalMetrics {
    fields: BTreeMap<String, FieldValue>,
}

impl GlobalMetrics {
    pub fn new(fields: BTreeMap<String, FieldValue>) -> Self {
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(FieldValue::as_f64)
    }

    pub fn active_cryptos(&self) -> Option<f64> {
        self.number("active_cryptos")
    }

    pub fn btc_dominance(&self) -> Option<f64> {
        self.number("btc_dominance")
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
