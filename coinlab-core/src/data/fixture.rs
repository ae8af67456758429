//! In-memory transport serving canned pages and payloads.
//!
//! Used by tests and for replaying recorded provider responses offline.
//! Pages are stored as HTML and go through the same table extraction as the
//! live transport. URLs are matched exactly (JSON query parameters are
//! ignored for matching but recorded for inspection).

use std::collections::HashMap;
use std::sync::Mutex;

use super::html::parse_tables;
use super::provider::{ApiResponse, Page, Transport, TransportError};

#[derive(Debug, Clone)]
enum Fixture {
    Html { status: u16, body: String },
    Json { status: u16, body: serde_json::Value },
    Fail(TransportError),
}

/// A request seen by the fixture transport.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
}

#[derive(Debug, Default)]
pub struct FixtureTransport {
    fixtures: HashMap<String, Fixture>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl FixtureTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `html` with status 200 at `url`.
    pub fn with_page(self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.with_page_status(url, 200, html)
    }

    pub fn with_page_status(
        mut self,
        url: impl Into<String>,
        status: u16,
        html: impl Into<String>,
    ) -> Self {
        self.fixtures.insert(
            url.into(),
            Fixture::Html {
                status,
                body: html.into(),
            },
        );
        self
    }

    /// Serve a JSON body with the given HTTP status at `url`.
    pub fn with_json(
        mut self,
        url: impl Into<String>,
        status: u16,
        body: serde_json::Value,
    ) -> Self {
        self.fixtures
            .insert(url.into(), Fixture::Json { status, body });
        self
    }

    /// Fail every request to `url` with `error`.
    pub fn with_failure(mut self, url: impl Into<String>, error: TransportError) -> Self {
        self.fixtures.insert(url.into(), Fixture::Fail(error));
        self
    }

    /// Requests seen so far, in order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    fn record(&self, url: &str, headers: &[(&str, &str)], query: &[(&str, String)]) {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(RecordedRequest {
                url: url.to_string(),
                headers: headers
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                query: query
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
            });
        }
    }

    fn lookup(&self, url: &str) -> Result<&Fixture, TransportError> {
        self.fixtures
            .get(url)
            .ok_or_else(|| TransportError::Connect(format!("no fixture for {url}")))
    }
}

impl Transport for FixtureTransport {
    fn name(&self) -> &str {
        "fixture"
    }

    fn fetch_page(&self, url: &str) -> Result<Page, TransportError> {
        self.record(url, &[], &[]);
        match self.lookup(url)? {
            Fixture::Html { status, body } => Ok(Page {
                url: url.to_string(),
                status: *status,
                tables: if (200..300).contains(status) {
                    parse_tables(body)?
                } else {
                    Vec::new()
                },
            }),
            Fixture::Json { .. } => Err(TransportError::Decode(format!(
                "{url} serves JSON, not HTML"
            ))),
            Fixture::Fail(e) => Err(e.clone()),
        }
    }

    fn fetch_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        query: &[(&str, String)],
    ) -> Result<ApiResponse, TransportError> {
        self.record(url, headers, query);
        match self.lookup(url)? {
            Fixture::Json { status, body } => Ok(ApiResponse {
                url: url.to_string(),
                status: *status,
                body: body.clone(),
            }),
            Fixture::Html { .. } => Err(TransportError::Decode(format!(
                "{url} serves HTML, not JSON"
            ))),
            Fixture::Fail(e) => Err(e.clone()),
        }
    }
}
