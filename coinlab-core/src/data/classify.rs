//! Maps raw transport failures, HTTP statuses, and API body status codes to
//! the [`DataError`] taxonomy. Applied before any normalization so fetchers
//! fail fast.

use super::provider::{ApiResponse, DataError, Page, TransportError};
use chrono::NaiveDate;
use serde_json::Value;

/// What an API call was trying to do; decides how a 400 is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiContext<'a> {
    /// Live quote lookup for one ticker.
    Quote { ticker: &'a str },
    GlobalMetrics,
    Listings,
}

/// Body status codes the provider uses for a missing or invalid key.
const CREDENTIAL_CODES: [i64; 3] = [401, 1001, 1002];

/// Transport failures never reached a usable response.
pub fn transport_failure(url: &str, err: TransportError) -> DataError {
    match err {
        TransportError::Decode(reason) => DataError::malformed(url, reason),
        other => DataError::unavailable(url, other.to_string()),
    }
}

/// Reject a page that did not come back 2xx.
pub fn check_page(page: &Page) -> Result<(), DataError> {
    if page.is_success() {
        Ok(())
    } else {
        Err(DataError::unavailable(
            &page.url,
            format!("HTTP {}", page.status),
        ))
    }
}

/// Snapshot pages answer out-of-range periods with 404/410 or a page without
/// tables rather than an empty table.
pub fn check_snapshot_page(
    page: &Page,
    period: NaiveDate,
    earliest: NaiveDate,
    latest: NaiveDate,
) -> Result<(), DataError> {
    let invalid = || DataError::InvalidSnapshotPeriod {
        period,
        earliest,
        latest,
    };
    match page.status {
        404 | 410 => Err(invalid()),
        s if (200..300).contains(&s) && page.tables.is_empty() => Err(invalid()),
        _ => check_page(page),
    }
}

/// Classify an API response using the body status first, then HTTP status.
pub fn check_api(response: &ApiResponse, context: ApiContext<'_>) -> Result<(), DataError> {
    let url = response.url.as_str();
    let status = response.body.get("status");
    let error_code = status
        .and_then(|s| s.get("error_code"))
        .and_then(error_code_value)
        .unwrap_or(0);
    let message = status
        .and_then(|s| s.get("error_message"))
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    if error_code == 400 {
        return Err(match context {
            ApiContext::Quote { ticker } => DataError::UnknownTicker {
                ticker: ticker.to_string(),
            },
            // Inputs are checked before sending; this is the provider's call.
            _ => DataError::malformed(url, format!("provider rejected request: {message}")),
        });
    }
    if CREDENTIAL_CODES.contains(&error_code) || response.status == 401 {
        let detail = if message.is_empty() {
            format!("HTTP {}", response.status)
        } else {
            message
        };
        return Err(DataError::InvalidCredential(detail));
    }
    if response.status == 429 || response.status >= 500 {
        return Err(DataError::unavailable(
            url,
            format!("HTTP {} {message}", response.status).trim_end().to_string(),
        ));
    }
    if error_code != 0 {
        return Err(DataError::malformed(
            url,
            format!("provider error {error_code}: {message}"),
        ));
    }
    if !(200..300).contains(&response.status) {
        return Err(DataError::malformed(
            url,
            format!("HTTP {} without a provider status", response.status),
        ));
    }
    Ok(())
}

/// `error_code` has been sent both as a number and as a numeric string.
fn error_code_value(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
