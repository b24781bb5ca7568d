//! Text helpers for the request editor.

use url::Url;

use super::OrderedMap;
use crate::error::{DomainError, DomainResult};

/// Re-indents a JSON body with two spaces.
///
/// # Errors
///
/// Returns `DomainError::InvalidJson` if `text` is not JSON. The caller keeps
/// its original text in that case.
pub fn format_json(text: &str) -> DomainResult<String> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| DomainError::InvalidJson(e.to_string()))?;
    serde_json::to_string_pretty(&value).map_err(|e| DomainError::InvalidJson(e.to_string()))
}

/// Returns true if `text` parses as JSON.
#[must_use]
pub fn is_valid_json(text: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(text).is_ok()
}

/// Appends query parameters to a base URL.
///
/// The base is returned untouched when there are no parameters.
///
/// # Errors
///
/// Returns `DomainError::InvalidUrl` if parameters are given and the base
/// does not parse as an absolute URL.
pub fn build_url(base: &str, params: &OrderedMap) -> DomainResult<String> {
    if params.is_empty() {
        return Ok(base.to_string());
    }

    let mut url = Url::parse(base).map_err(|e| DomainError::InvalidUrl(format!("{e}: {base}")))?;
    url.query_pairs_mut()
        .extend_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    Ok(url.to_string())
}

/// Parses `Name: value` lines into a header map.
///
/// Lines without a colon are skipped; values may contain further colons.
#[must_use]
pub fn parse_headers(text: &str) -> OrderedMap {
    text.lines()
        .filter_map(|line| {
            let (name, value) = line.split_once(':')?;
            let name = name.trim();
            (!name.is_empty()).then(|| (name.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Renders a header map as `Name: value` lines.
#[must_use]
pub fn format_headers(headers: &OrderedMap) -> String {
    headers
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}
