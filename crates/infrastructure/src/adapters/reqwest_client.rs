//! HTTP execution using reqwest.
//!
//! This adapter performs the calls described by an `ExecutionDescriptor`.
//! A client is built per call because proxy and certificate settings are
//! part of the descriptor.

use std::collections::BTreeMap;
use std::error::Error as _;
use std::time::Instant;

use rattle_application::TransportError;
use rattle_domain::{
    ExecutionDescriptor, HttpMethod, ProxyRoute, Response, build_url, reason_phrase,
};
use reqwest::{Client, Method, Proxy, redirect};
use tracing::trace;

/// User agent sent with every call.
pub const USER_AGENT: &str = concat!("Rattle/", env!("CARGO_PKG_VERSION"));

/// HTTP executor backed by reqwest.
///
/// Calls in system proxy mode use reqwest's own proxy discovery (the
/// `HTTP_PROXY` family of environment variables) unless the host supplies
/// its system proxy explicitly.
#[derive(Debug, Clone, Default)]
pub struct ReqwestExecutor {
    system_proxy: Option<ProxyRoute>,
}

impl ReqwestExecutor {
    /// Creates a new executor.
    #[must_use]
    pub const fn new() -> Self {
        Self { system_proxy: None }
    }

    /// Uses `route` as the host's system proxy.
    #[must_use]
    pub fn with_system_proxy(mut self, route: ProxyRoute) -> Self {
        self.system_proxy = Some(route);
        self
    }

    /// Converts domain `HttpMethod` to reqwest `Method`.
    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
            HttpMethod::Head => Method::HEAD,
            HttpMethod::Options => Method::OPTIONS,
        }
    }

    /// Builds a client honoring the descriptor's proxy, TLS, redirect and
    /// timeout settings.
    fn build_client(&self, descriptor: &ExecutionDescriptor) -> Result<Client, TransportError> {
        let mut builder = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(redirect::Policy::limited(descriptor.max_redirects))
            .timeout(descriptor.timeout);

        let route = match &descriptor.proxy {
            Some(route) => Some(route),
            None if descriptor.use_system_proxy => self.system_proxy.as_ref(),
            None => None,
        };
        if let Some(route) = route {
            let http = Proxy::http(&route.http)
                .map_err(|e| TransportError::Other(format!("Invalid proxy: {e}")))?;
            let https = Proxy::https(&route.https)
                .map_err(|e| TransportError::Other(format!("Invalid proxy: {e}")))?;
            builder = builder.proxy(http).proxy(https);
        } else if !descriptor.use_system_proxy {
            builder = builder.no_proxy();
        }

        if !descriptor.verify_tls {
            builder = builder.danger_accept_invalid_certs(true);
        }

        builder
            .build()
            .map_err(|e| TransportError::Other(error_chain(&e)))
    }

    /// Maps reqwest errors to `TransportError`.
    fn map_error(error: &reqwest::Error, descriptor: &ExecutionDescriptor) -> TransportError {
        let message = error_chain(error);
        let lower = message.to_lowercase();
        let host = || {
            error
                .url()
                .and_then(|u| u.host_str())
                .unwrap_or("unknown")
                .to_string()
        };

        if error.is_timeout() {
            return TransportError::Timeout {
                timeout_ms: u64::try_from(descriptor.timeout.as_millis()).unwrap_or(u64::MAX),
            };
        }

        if error.is_redirect() {
            return TransportError::TooManyRedirects {
                max: descriptor.max_redirects,
            };
        }

        if error.is_connect() {
            if lower.contains("dns") || lower.contains("resolve") || lower.contains("lookup") {
                return TransportError::Dns {
                    host: host(),
                    message,
                };
            }
            if lower.contains("refused") {
                return TransportError::ConnectionRefused {
                    host: host(),
                    port: error
                        .url()
                        .and_then(reqwest::Url::port_or_known_default)
                        .unwrap_or(80),
                };
            }
            if lower.contains("certificate") || lower.contains("tls") {
                return TransportError::Tls(message);
            }
            return TransportError::ConnectionFailed(message);
        }

        if error.is_builder() {
            return TransportError::InvalidUrl(message);
        }

        TransportError::Other(message)
    }

    /// Performs the call.
    ///
    /// # Errors
    ///
    /// Returns a `TransportError` when no response was received.
    pub async fn execute(
        &self,
        descriptor: &ExecutionDescriptor,
    ) -> Result<Response, TransportError> {
        let url = build_url(&descriptor.url, &descriptor.params)
            .map_err(|e| TransportError::InvalidUrl(e.to_string()))?;
        let client = self.build_client(descriptor)?;

        let mut builder = client.request(Self::to_reqwest_method(descriptor.method), &url);
        for (name, value) in &descriptor.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = descriptor.body.as_ref().filter(|b| !b.is_empty()) {
            builder = builder.body(body.clone());
        }

        let start = Instant::now();
        let response = builder
            .send()
            .await
            .map_err(|e| Self::map_error(&e, descriptor))?;

        let status = response.status();
        let mut headers: BTreeMap<String, String> = BTreeMap::new();
        for (name, value) in response.headers() {
            let value = value.to_str().unwrap_or("<binary>");
            headers
                .entry(name.to_string())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(value);
                })
                .or_insert_with(|| value.to_string());
        }

        let text = response
            .text()
            .await
            .map_err(|e| TransportError::Other(format!("Failed to read body: {}", error_chain(&e))))?;
        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        trace!(status = status.as_u16(), bytes = text.len(), "response received");

        Ok(Response::new(
            status.as_u16(),
            status
                .canonical_reason()
                .unwrap_or_else(|| reason_phrase(status.as_u16())),
            headers,
            Response::decode_body(&text),
            duration_ms,
        ))
    }
}

/// Joins an error with its sources, since reqwest keeps the useful detail
/// (resolver or socket message) in the source chain.
fn error_chain(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
