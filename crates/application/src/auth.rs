//! Bearer tokens for requests linked to an auth configuration.
//!
//! An auth configuration is a stored request flagged `is_auth_config`
//! whose call returns an OAuth-style token document. Tokens are cached in
//! memory per configuration id and fetched again shortly before they
//! expire.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde_json::Value;
use thiserror::Error;

use crate::execute_request::ExecuteRequestError;

/// A cached token counts as expired this long before its real expiry.
pub const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Errors from obtaining a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The token call produced no response.
    #[error("Auth token request failed: {0}")]
    Request(#[from] ExecuteRequestError),

    /// The token endpoint answered with a non-2xx status.
    #[error("Auth token request failed with status {status}: {body}")]
    Rejected {
        /// Status code received
        status: u16,
        /// Response body, as displayed
        body: String,
    },

    /// The token response carries no `access_token`.
    #[error("Auth token response has no access_token: {0}")]
    InvalidToken(String),
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    lifetime: Duration,
    issued: Instant,
}

impl CachedToken {
    fn is_expired(&self) -> bool {
        self.issued.elapsed() >= self.lifetime.saturating_sub(EXPIRY_MARGIN)
    }
}

/// In-memory token cache keyed by auth configuration id.
#[derive(Debug, Default)]
pub struct TokenStore {
    tokens: RwLock<HashMap<String, CachedToken>>,
}

impl TokenStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The `Authorization` value for a configuration, if its token is still
    /// valid.
    #[must_use]
    pub fn bearer(&self, config_id: &str) -> Option<String> {
        self.tokens
            .read()
            .get(config_id)
            .filter(|token| !token.is_expired())
            .map(|token| format!("Bearer {}", token.access_token))
    }

    /// Returns true when no valid token is cached for the configuration.
    #[must_use]
    pub fn is_expired(&self, config_id: &str) -> bool {
        self.bearer(config_id).is_none()
    }

    /// Caches the token carried by a token endpoint response body and
    /// returns its `Authorization` value.
    ///
    /// `expires_in` is read in seconds and defaults to zero, which makes
    /// the token single-use.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` when the body has no string
    /// `access_token`.
    pub fn store(&self, config_id: &str, body: &Value) -> Result<String, AuthError> {
        let parsed;
        let document = match body {
            Value::String(text) => {
                parsed = serde_json::from_str::<Value>(text).unwrap_or(Value::Null);
                &parsed
            }
            other => other,
        };

        let access_token = document
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or_else(|| AuthError::InvalidToken(body.to_string()))?;
        let expires_in = document
            .get("expires_in")
            .and_then(|v| v.as_u64().or_else(|| v.as_str()?.trim().parse().ok()))
            .unwrap_or(0);

        let bearer = format!("Bearer {access_token}");
        self.tokens.write().insert(
            config_id.to_string(),
            CachedToken {
                access_token: access_token.to_string(),
                lifetime: Duration::from_secs(expires_in),
                issued: Instant::now(),
            },
        );
        Ok(bearer)
    }

    /// Drops the cached token for a configuration.
    pub fn remove(&self, config_id: &str) -> bool {
        self.tokens.write().remove(config_id).is_some()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_store_and_read_bearer() {
        let tokens = TokenStore::new();
        assert!(tokens.is_expired("auth"));

        let bearer = tokens
            .store("auth", &json!({"access_token": "abc", "expires_in": 3600}))
            .unwrap();

        assert_eq!(bearer, "Bearer abc");
        assert_eq!(tokens.bearer("auth").as_deref(), Some("Bearer abc"));
        assert!(!tokens.is_expired("auth"));
        assert!(tokens.is_expired("other"));
    }

    #[test]
    fn test_token_inside_margin_is_expired() {
        let tokens = TokenStore::new();
        tokens
            .store("short", &json!({"access_token": "abc", "expires_in": 60}))
            .unwrap();
        tokens
            .store("none", &json!({"access_token": "abc"}))
            .unwrap();

        assert!(tokens.is_expired("short"));
        assert!(tokens.is_expired("none"));
    }

    #[test]
    fn test_text_body_and_string_lifetime() {
        let tokens = TokenStore::new();
        tokens
            .store(
                "auth",
                &json!(r#"{"access_token":"xyz","expires_in":"600"}"#),
            )
            .unwrap();
        assert_eq!(tokens.bearer("auth").as_deref(), Some("Bearer xyz"));
    }

    #[test]
    fn test_missing_access_token() {
        let tokens = TokenStore::new();
        let error = tokens.store("auth", &json!({"error": "denied"})).unwrap_err();
        assert!(matches!(error, AuthError::InvalidToken(_)));
        assert!(tokens.is_expired("auth"));
    }

    #[test]
    fn test_remove() {
        let tokens = TokenStore::new();
        tokens
            .store("auth", &json!({"access_token": "abc", "expires_in": 3600}))
            .unwrap();
        assert!(tokens.remove("auth"));
        assert!(!tokens.remove("auth"));
        assert!(tokens.is_expired("auth"));
    }
}
