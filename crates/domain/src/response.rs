//! Normalized HTTP responses.
//!
//! A [`Response`] is what the execution pipeline hands back to the UI for
//! both successful calls and transport failures. It is transient: only its
//! displayed body and status code are copied onto the saved request.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status text used for transport failures.
pub const ERROR_STATUS_TEXT: &str = "Error";

/// A normalized HTTP response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    /// HTTP status code, `0` when no response was received.
    pub status: u16,
    /// Status text (e.g., "OK", "Not Found").
    pub status_text: String,
    /// Response headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Response body: parsed JSON when the payload was JSON, otherwise text.
    #[serde(default)]
    pub body: Value,
    /// Wall-clock time spent on the call.
    pub duration_ms: u64,
}

impl Response {
    /// Creates a response.
    #[must_use]
    pub fn new(
        status: u16,
        status_text: impl Into<String>,
        headers: BTreeMap<String, String>,
        body: Value,
        duration_ms: u64,
    ) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            headers,
            body,
            duration_ms,
        }
    }

    /// The response reported when the call never produced an HTTP status.
    #[must_use]
    pub fn transport_error(message: impl Into<String>) -> Self {
        Self {
            status: 0,
            status_text: ERROR_STATUS_TEXT.to_string(),
            headers: BTreeMap::new(),
            body: Value::String(message.into()),
            duration_ms: 0,
        }
    }

    /// Decodes a raw payload: JSON if it parses, text otherwise.
    #[must_use]
    pub fn decode_body(raw: &str) -> Value {
        if raw.trim().is_empty() {
            return Value::String(raw.to_string());
        }
        serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
    }

    /// Returns true if no HTTP status was received.
    #[must_use]
    pub const fn is_transport_error(&self) -> bool {
        self.status == 0
    }

    /// The body as shown to the user: text verbatim, anything else
    /// pretty-printed.
    #[must_use]
    pub fn body_text(&self) -> String {
        match &self.body {
            Value::String(text) => text.clone(),
            other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
        }
    }

    /// Classification of the status code.
    #[must_use]
    pub const fn class(&self) -> Option<StatusClass> {
        StatusClass::of(self.status)
    }

    /// Looks up a header case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Coarse status category used to color the status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusClass {
    /// 2xx
    Success,
    /// 3xx
    Redirect,
    /// 4xx
    ClientError,
    /// 5xx and above
    ServerError,
}

impl StatusClass {
    /// Classifies a status code. Informational codes and `0` have no class.
    #[must_use]
    pub const fn of(status: u16) -> Option<Self> {
        match status {
            200..=299 => Some(Self::Success),
            300..=399 => Some(Self::Redirect),
            400..=499 => Some(Self::ClientError),
            500.. => Some(Self::ServerError),
            _ => None,
        }
    }

    /// Returns the class name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Redirect => "redirect",
            Self::ClientError => "client-error",
            Self::ServerError => "server-error",
        }
    }
}

/// Class name for an optional response; empty when there is none.
#[must_use]
pub fn status_class(response: Option<&Response>) -> &'static str {
    response
        .and_then(Response::class)
        .map_or("", StatusClass::as_str)
}

/// Returns the canonical reason phrase for common status codes.
#[must_use]
pub const fn reason_phrase(status: u16) -> &'static str {
    match status {
        100 => "Continue",
        101 => "Switching Protocols",
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        408 => "Request Timeout",
        409 => "Conflict",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "Unknown",
    }
}
