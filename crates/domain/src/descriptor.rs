//! Execution descriptors handed to the network layer.

use std::time::Duration;

use crate::proxy::{ProxyConfig, ProxyMode};
use crate::request::{HttpMethod, OrderedMap, Request};

/// Maximum number of redirects followed per call.
pub const MAX_REDIRECTS: usize = 5;

/// Fixed per-call timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Proxy URLs to route one call through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRoute {
    /// Proxy for `http://` targets.
    pub http: String,
    /// Proxy for `https://` targets.
    pub https: String,
}

/// Everything the network executor needs to perform one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionDescriptor {
    /// HTTP method
    pub method: HttpMethod,
    /// Target URL, without the query parameters below
    pub url: String,
    /// Request headers
    pub headers: OrderedMap,
    /// Query parameters
    pub params: OrderedMap,
    /// Request body
    pub body: Option<String>,
    /// Explicit proxy, if any
    pub proxy: Option<ProxyRoute>,
    /// Whether the host's own proxy settings apply when no explicit proxy
    /// is set. False means connect directly.
    pub use_system_proxy: bool,
    /// Whether server certificates are verified
    pub verify_tls: bool,
    /// Redirect limit
    pub max_redirects: usize,
    /// Call timeout
    pub timeout: Duration,
}

impl ExecutionDescriptor {
    /// Merges a request with the proxy policy.
    ///
    /// An explicit proxy is configured only in `ON` mode with a host set;
    /// `SYSTEM` leaves proxy selection to the host.
    #[must_use]
    pub fn build(request: &Request, proxy: &ProxyConfig) -> Self {
        let route = proxy
            .proxy_url()
            .zip(proxy.https_proxy_url())
            .map(|(http, https)| ProxyRoute { http, https });

        Self {
            method: request.method,
            url: request.url.trim().to_string(),
            headers: request.headers.clone().unwrap_or_default(),
            params: request.params.clone().unwrap_or_default(),
            body: request.body.clone(),
            proxy: route,
            use_system_proxy: proxy.proxy_mode == ProxyMode::System,
            verify_tls: proxy.verify_ssl_certificate,
            max_redirects: MAX_REDIRECTS,
            timeout: REQUEST_TIMEOUT,
        }
    }

    /// Returns true if the call targets an `https://` URL.
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.url
            .get(..8)
            .is_some_and(|scheme| scheme.eq_ignore_ascii_case("https://"))
    }
}
