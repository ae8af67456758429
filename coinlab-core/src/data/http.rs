//! Live HTTP transport over a blocking reqwest client.
//!
//! One client (and its connection pool) is kept per transport, so sequential
//! calls reuse connections. `reqwest::blocking::Client` is safe to share
//! between threads, which makes this transport safe for concurrent callers.
//! No retries: every failure is reported once.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use reqwest::redirect::Policy;
use tracing::debug;

use super::html::parse_tables;
use super::provider::{ApiResponse, Page, Transport, TransportError};
use crate::config::ProviderConfig;

const MAX_REDIRECTS: usize = 10;

/// Transport talking to the real provider.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &ProviderConfig) -> Result<Self, TransportError> {
        Self::with_settings(config.timeout(), &config.user_agent)
    }

    pub fn with_settings(timeout: Duration, user_agent: &str) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| TransportError::Setup(e.to_string()))?;
        Ok(Self { client })
    }
}

/// Sort a reqwest failure into the transport failure kinds.
fn map_reqwest(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout(e.to_string())
    } else if e.is_redirect() {
        TransportError::Redirect(e.to_string())
    } else if e.is_connect() {
        TransportError::Connect(e.to_string())
    } else if e.is_decode() || e.is_body() {
        TransportError::Decode(e.to_string())
    } else {
        TransportError::Other(e.to_string())
    }
}

impl Transport for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    fn fetch_page(&self, url: &str) -> Result<Page, TransportError> {
        debug!(url, "fetching page");
        let resp = self.client.get(url).send().map_err(map_reqwest)?;
        let status = resp.status().as_u16();
        let final_url = resp.url().to_string();
        let body = resp.text().map_err(map_reqwest)?;

        // Error pages may contain layout tables; only parse successful bodies.
        let tables = if (200..300).contains(&status) {
            parse_tables(&body)?
        } else {
            Vec::new()
        };
        debug!(url, status, tables = tables.len(), "page fetched");

        Ok(Page {
            url: final_url,
            status,
            tables,
        })
    }

    fn fetch_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        query: &[(&str, String)],
    ) -> Result<ApiResponse, TransportError> {
        debug!(url, ?query, "calling API");
        let mut request = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .query(query);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let resp = request.send().map_err(map_reqwest)?;
        let status = resp.status().as_u16();
        let text = resp.text().map_err(map_reqwest)?;
        // Gateways answer throttling and outages with HTML; keep the status
        // and let classification decide.
        let body = match serde_json::from_str(&text) {
            Ok(body) => body,
            Err(_) if !(200..300).contains(&status) => serde_json::Value::Null,
            Err(e) => return Err(TransportError::Decode(format!("{url}: {e}"))),
        };
        debug!(url, status, "API responded");

        Ok(ApiResponse {
            url: url.to_string(),
            status,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_from_default_config() {
        let transport = HttpTransport::new(&ProviderConfig::default()).unwrap();
        assert_eq!(transport.name(), "http");
    }

    #[test]
    fn unreachable_host_is_a_transport_error() {
        let transport =
            HttpTransport::with_settings(Duration::from_millis(500), "coinlab-test").unwrap();
        // Port 9 on localhost (discard) is closed on test machines.
        let err = transport.fetch_page("http://127.0.0.1:9/").unwrap_err();
        assert!(matches!(
            err,
            TransportError::Connect(_) | TransportError::Timeout(_) | TransportError::Other(_)
        ));
    }
}
