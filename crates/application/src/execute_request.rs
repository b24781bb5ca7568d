//! Execute Request Use Case
//!
//! Turns a stored request plus the proxy policy into one HTTP call through
//! the Host Bridge and normalizes the outcome.

use std::sync::Arc;

use parking_lot::Mutex;
use rattle_domain::{ExecutionDescriptor, ProxyConfig, Request, Response};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::ports::{HostBridge, TransportError};

/// Result type for request execution.
pub type ExecuteResult = Result<Response, ExecuteRequestError>;

/// Error type for the execute request use case.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecuteRequestError {
    /// URL is empty.
    #[error("URL is required")]
    EmptyUrl,

    /// The call produced no response.
    #[error("{0}")]
    Transport(#[from] TransportError),
}

impl ExecuteRequestError {
    /// The response shown for a failed call: status `0`, status text
    /// `"Error"` and the failure message as body.
    #[must_use]
    pub fn to_response(&self) -> Response {
        Response::transport_error(self.to_string())
    }
}

/// Extension trait for collapsing a result into a displayable response.
pub trait ExecuteResultExt {
    /// Returns the response, or the normalized failure response.
    fn into_response(self) -> Response;
}

impl ExecuteResultExt for ExecuteResult {
    fn into_response(self) -> Response {
        match self {
            Ok(response) => response,
            Err(e) => e.to_response(),
        }
    }
}

/// Counts outstanding calls and mirrors "any outstanding" into a watch
/// channel.
struct InFlight {
    count: Mutex<usize>,
    sender: watch::Sender<bool>,
}

impl InFlight {
    fn enter(&self) -> InFlightGuard<'_> {
        let mut count = self.count.lock();
        *count += 1;
        if *count == 1 {
            self.sender.send_replace(true);
        }
        InFlightGuard(self)
    }
}

struct InFlightGuard<'a>(&'a InFlight);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut count = self.0.count.lock();
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.0.sender.send_replace(false);
        }
    }
}

/// Use case for executing HTTP requests.
///
/// Concurrent calls are independent: nothing is queued or deduplicated.
/// The loading signal only reports whether any call is outstanding.
///
/// # Example
///
/// ```ignore
/// let use_case = ExecuteRequest::new(bridge);
///
/// let request = Request::with_url("Users", HttpMethod::Get, "https://api.example.com/users");
/// let response = use_case.execute(&request, &ProxyConfig::default()).await.into_response();
/// ```
pub struct ExecuteRequest {
    bridge: Arc<dyn HostBridge>,
    in_flight: InFlight,
}

impl ExecuteRequest {
    /// Creates a new `ExecuteRequest` use case over the given bridge.
    #[must_use]
    pub fn new(bridge: Arc<dyn HostBridge>) -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            bridge,
            in_flight: InFlight {
                count: Mutex::new(0),
                sender,
            },
        }
    }

    /// Executes the request and returns the response.
    ///
    /// Any received status, including 4xx and 5xx, is a success.
    ///
    /// # Errors
    ///
    /// Returns `ExecuteRequestError::EmptyUrl` without calling the host when
    /// the URL is blank, and `ExecuteRequestError::Transport` when no
    /// response was received.
    pub async fn execute(&self, request: &Request, proxy: &ProxyConfig) -> ExecuteResult {
        if request.url.trim().is_empty() {
            return Err(ExecuteRequestError::EmptyUrl);
        }

        let descriptor = ExecutionDescriptor::build(request, proxy);
        for warning in proxy.security_warnings() {
            warn!(id = %request.id, url = %descriptor.url, "{}", warning.message());
        }

        let _guard = self.in_flight.enter();
        debug!(
            id = %request.id,
            method = %descriptor.method,
            url = %descriptor.url,
            proxied = descriptor.proxy.is_some(),
            "executing request"
        );

        match self.bridge.execute_http(&descriptor).await {
            Ok(response) => {
                debug!(
                    id = %request.id,
                    status = response.status,
                    duration_ms = response.duration_ms,
                    "request completed"
                );
                Ok(response)
            }
            Err(error) => {
                warn!(id = %request.id, %error, "request failed");
                Err(error.into())
            }
        }
    }

    /// Returns true while at least one call is outstanding.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        *self.in_flight.sender.borrow()
    }

    /// Receiver for the loading signal.
    #[must_use]
    pub fn loading(&self) -> watch::Receiver<bool> {
        self.in_flight.sender.subscribe()
    }
}
