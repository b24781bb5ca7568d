//! HTTP proxy configuration.
//!
//! This module provides the proxy policy applied to every executed request.
//! It is stored apart from the request document.

use serde::{Deserialize, Serialize};

/// Key the proxy configuration is stored under.
pub const PROXY_SETTINGS_KEY: &str = "proxySettings";

/// How requests pick a proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProxyMode {
    /// Connect directly.
    #[default]
    Off,
    /// Route through the configured proxy host.
    On,
    /// Leave proxy selection to the host defaults.
    System,
}

/// Proxy configuration for HTTP requests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProxyConfig {
    /// Proxy mode.
    #[serde(default)]
    pub proxy_mode: ProxyMode,
    /// Proxy used for plain HTTP, and for HTTPS when `https_proxy` is unset
    /// (`host:port`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_proxy: Option<String>,
    /// Proxy used for HTTPS targets (`host:port`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub https_proxy: Option<String>,
    /// Proxy authentication username.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Proxy authentication password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Whether to verify server certificates.
    #[serde(default = "default_true")]
    pub verify_ssl_certificate: bool,
}

const fn default_true() -> bool {
    true
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            proxy_mode: ProxyMode::Off,
            http_proxy: None,
            https_proxy: None,
            username: None,
            password: None,
            verify_ssl_certificate: true,
        }
    }
}

impl ProxyConfig {
    /// Create the default configuration: no proxy, certificates verified.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an enabled proxy configuration for `host:port`.
    #[must_use]
    pub fn with_host(host: impl Into<String>) -> Self {
        Self {
            proxy_mode: ProxyMode::On,
            http_proxy: Some(host.into()),
            ..Default::default()
        }
    }

    /// Set a separate proxy for HTTPS targets.
    #[must_use]
    pub fn with_https_host(mut self, host: impl Into<String>) -> Self {
        self.https_proxy = Some(host.into());
        self
    }

    /// Set authentication credentials.
    #[must_use]
    pub fn with_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Turn certificate verification off.
    #[must_use]
    pub const fn insecure(mut self) -> Self {
        self.verify_ssl_certificate = false;
        self
    }

    /// Check if requests are routed through an explicit proxy.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.proxy_mode == ProxyMode::On && non_empty(self.http_proxy.as_deref()).is_some()
    }

    /// Check if the proxy has authentication.
    #[must_use]
    pub fn has_auth(&self) -> bool {
        non_empty(self.username.as_deref()).is_some()
            && non_empty(self.password.as_deref()).is_some()
    }

    /// Proxy URL for plain HTTP targets, with credentials if present.
    ///
    /// `None` unless the mode is `ON` and a host is set.
    #[must_use]
    pub fn proxy_url(&self) -> Option<String> {
        if !self.is_active() {
            return None;
        }
        non_empty(self.http_proxy.as_deref()).map(|host| self.url_for(host))
    }

    /// Proxy URL for HTTPS targets, falling back to the HTTP proxy.
    #[must_use]
    pub fn https_proxy_url(&self) -> Option<String> {
        if !self.is_active() {
            return None;
        }
        non_empty(self.https_proxy.as_deref())
            .or_else(|| non_empty(self.http_proxy.as_deref()))
            .map(|host| self.url_for(host))
    }

    fn url_for(&self, host: &str) -> String {
        match (
            non_empty(self.username.as_deref()),
            non_empty(self.password.as_deref()),
        ) {
            (Some(user), Some(pass)) => format!("http://{user}:{pass}@{host}"),
            _ => format!("http://{host}"),
        }
    }

    /// Security warnings raised by this configuration.
    #[must_use]
    pub fn security_warnings(&self) -> Vec<TlsSecurityWarning> {
        if self.verify_ssl_certificate {
            Vec::new()
        } else {
            vec![TlsSecurityWarning::CertificateVerificationDisabled]
        }
    }

    /// Validate the proxy configuration.
    ///
    /// Only meaningful for editing; execution never rejects a configuration.
    #[allow(clippy::missing_errors_doc)]
    pub fn validate(&self) -> Result<(), ProxyError> {
        if self.proxy_mode != ProxyMode::On {
            return Ok(());
        }

        let Some(host) = non_empty(self.http_proxy.as_deref()) else {
            return Err(ProxyError::MissingHost);
        };

        for host in std::iter::once(host).chain(non_empty(self.https_proxy.as_deref())) {
            if host.contains("://") {
                return Err(ProxyError::InvalidHost(
                    "host must be given as host:port without a scheme".to_string(),
                ));
            }
        }

        if non_empty(self.username.as_deref()).is_some()
            != non_empty(self.password.as_deref()).is_some()
        {
            return Err(ProxyError::IncompleteAuth);
        }

        Ok(())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// TLS security warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsSecurityWarning {
    /// Certificate verification is disabled.
    CertificateVerificationDisabled,
}

impl TlsSecurityWarning {
    /// Get a user-friendly message for this warning.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::CertificateVerificationDisabled => {
                "Certificate verification is disabled. This makes connections vulnerable to \
                 man-in-the-middle attacks."
            }
        }
    }
}

/// Proxy-related errors.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ProxyError {
    /// Missing proxy host.
    #[error("Proxy host is required when proxy is enabled")]
    MissingHost,
    /// Invalid proxy host.
    #[error("Invalid proxy host: {0}")]
    InvalidHost(String),
    /// Incomplete authentication.
    #[error("Both username and password are required for proxy authentication")]
    IncompleteAuth,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_proxy_config_default() {
        let config = ProxyConfig::new();
        assert_eq!(config.proxy_mode, ProxyMode::Off);
        assert!(config.verify_ssl_certificate);
        assert!(config.proxy_url().is_none());
    }

    #[test]
    fn test_proxy_url_with_auth() {
        let config = ProxyConfig::with_host("proxy.x:8080").with_auth("u", "p");
        assert!(config.has_auth());
        assert_eq!(config.proxy_url().unwrap(), "http://u:p@proxy.x:8080");
    }

    #[test]
    fn test_proxy_url_without_auth() {
        let config = ProxyConfig::with_host("proxy.x:8080");
        assert_eq!(config.proxy_url().unwrap(), "http://proxy.x:8080");
    }

    #[test]
    fn test_partial_credentials_are_not_embedded() {
        let mut config = ProxyConfig::with_host("proxy.x:8080");
        config.username = Some("u".to_string());
        config.password = Some(String::new());
        assert_eq!(config.proxy_url().unwrap(), "http://proxy.x:8080");
    }

    #[test]
    fn test_no_proxy_unless_on() {
        let mut config = ProxyConfig::with_host("proxy.x:8080");
        config.proxy_mode = ProxyMode::System;
        assert!(config.proxy_url().is_none());
        config.proxy_mode = ProxyMode::Off;
        assert!(config.https_proxy_url().is_none());

        let mut config = ProxyConfig::new();
        config.proxy_mode = ProxyMode::On;
        assert!(config.proxy_url().is_none());
    }

    #[test]
    fn test_https_proxy_falls_back_to_http_proxy() {
        let config = ProxyConfig::with_host("plain:3128");
        assert_eq!(config.https_proxy_url().unwrap(), "http://plain:3128");

        let config = config.with_https_host("secure:3129");
        assert_eq!(config.https_proxy_url().unwrap(), "http://secure:3129");
        assert_eq!(config.proxy_url().unwrap(), "http://plain:3128");
    }

    #[test]
    fn test_serde_shape() {
        let config: ProxyConfig = serde_json::from_str(r#"{"proxyMode":"SYSTEM"}"#).unwrap();
        assert_eq!(config.proxy_mode, ProxyMode::System);
        assert!(config.verify_ssl_certificate);

        let json = serde_json::to_value(ProxyConfig::with_host("h:1").insecure()).unwrap();
        assert_eq!(json["proxyMode"], "ON");
        assert_eq!(json["httpProxy"], "h:1");
        assert_eq!(json["verifySslCertificate"], false);
    }

    #[test]
    fn test_security_warnings() {
        assert!(ProxyConfig::new().security_warnings().is_empty());
        assert_eq!(
            ProxyConfig::new().insecure().security_warnings(),
            vec![TlsSecurityWarning::CertificateVerificationDisabled]
        );
    }

    #[test]
    fn test_proxy_validate() {
        assert!(ProxyConfig::new().validate().is_ok());

        let mut config = ProxyConfig::new();
        config.proxy_mode = ProxyMode::On;
        assert_eq!(config.validate(), Err(ProxyError::MissingHost));

        assert!(ProxyConfig::with_host("proxy.x:8080").validate().is_ok());

        let config = ProxyConfig::with_host("http://proxy.x:8080");
        assert!(matches!(config.validate(), Err(ProxyError::InvalidHost(_))));

        let mut config = ProxyConfig::with_host("proxy.x:8080");
        config.username = Some("user".to_string());
        assert_eq!(config.validate(), Err(ProxyError::IncompleteAuth));
    }
}
