//! API error classification
//!
//! Maps a non-success HTTP response to a `GatewayError` using the status and
//! the provider's `error_code` field instead of matching on message text.

use sacloud_lifecycle_common::{GatewayError, ResourceId, ResourceKind};
use serde::Deserialize;

/// Error body returned by the control plane
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error_msg: Option<String>,
}

/// Provider error codes meaning the addressed resource does not exist
const NOT_FOUND_CODES: &[&str] = &["not_found", "resource_not_found"];

/// Longest raw body echoed into an error message
const MAX_BODY_IN_MESSAGE: usize = 200;

/// Classify an error response.
///
/// `target` is the resource a read addressed; without one a 404 stays an
/// `Api` error since there is no id to report.
pub fn classify_response(
    status: u16,
    body: &str,
    target: Option<(ResourceKind, ResourceId)>,
) -> GatewayError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let code = parsed.error_code.as_deref();

    let not_found = status == 404 || code.is_some_and(|c| NOT_FOUND_CODES.contains(&c));
    if let (true, Some((kind, id))) = (not_found, target) {
        return GatewayError::NotFound { kind, id };
    }

    let message = match (parsed.error_msg, code) {
        (Some(msg), Some(code)) => format!("{code}: {msg}"),
        (Some(msg), None) => msg,
        (None, Some(code)) => code.to_string(),
        (None, None) => truncate(body.trim(), MAX_BODY_IN_MESSAGE),
    };
    GatewayError::Api { status, message }
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
