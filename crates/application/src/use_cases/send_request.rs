//! Send request use case.

use std::sync::Arc;

use rattle_domain::{ExecutionDescriptor, ProxyConfig, Request, Response, console_log};
use thiserror::Error;
use tracing::{debug, info};

use crate::auth::{AuthError, TokenStore};
use crate::execute_request::{ExecuteRequest, ExecuteRequestError};
use crate::proxy_store::ProxyStore;
use crate::store::TreeStore;

/// Header carrying the bearer token of a linked auth configuration.
const AUTHORIZATION: &str = "Authorization";

/// Errors from sending a stored request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendRequestError {
    /// No request with this id is stored.
    #[error("request not found: {0}")]
    NotFound(String),

    /// The linked auth configuration did not yield a token.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The call failed.
    #[error(transparent)]
    Execute(#[from] ExecuteRequestError),
}

impl SendRequestError {
    /// The normalized failure response, when the call was attempted.
    #[must_use]
    pub fn response(&self) -> Option<Response> {
        match self {
            Self::NotFound(_) => None,
            Self::Auth(error) => Some(Response::transport_error(error.to_string())),
            Self::Execute(error) => Some(error.to_response()),
        }
    }
}

/// Use case for executing a stored request with the current proxy policy
/// and recording the outcome on it.
///
/// A request whose `auth_config_id` names an auth configuration is sent
/// with `Authorization: Bearer <token>`. Tokens are cached per
/// configuration for the lifetime of this use case.
pub struct SendRequest {
    store: Arc<TreeStore>,
    proxies: Arc<ProxyStore>,
    executor: Arc<ExecuteRequest>,
    tokens: TokenStore,
}

impl SendRequest {
    /// Creates a new `SendRequest` use case.
    #[must_use]
    pub fn new(
        store: Arc<TreeStore>,
        proxies: Arc<ProxyStore>,
        executor: Arc<ExecuteRequest>,
    ) -> Self {
        Self {
            store,
            proxies,
            executor,
            tokens: TokenStore::new(),
        }
    }

    /// The bearer token cache.
    #[must_use]
    pub const fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Sends the request stored under `id`.
    ///
    /// On success the displayed body, status code and console log are
    /// stored on the request. On failure only the console log is stored.
    ///
    /// # Errors
    /// - Returns `SendRequestError::NotFound` for an unknown id
    /// - Returns `SendRequestError::Auth` if the linked auth configuration
    ///   yields no token
    /// - Returns `SendRequestError::Execute` if the call fails
    pub async fn execute(&self, id: &str) -> Result<Response, SendRequestError> {
        let mut request = self
            .store
            .request(id)
            .ok_or_else(|| SendRequestError::NotFound(id.to_string()))?;
        let proxy = self.proxies.get();

        let outcome = match self.bearer_for(&request, &proxy).await {
            Ok(bearer) => {
                if let Some(bearer) = bearer {
                    authorize(&mut request, bearer);
                }
                self.executor
                    .execute(&request, &proxy)
                    .await
                    .map_err(SendRequestError::from)
            }
            Err(error) => Err(error.into()),
        };

        let descriptor = ExecutionDescriptor::build(&request, &proxy);
        let recorded = match &outcome {
            Ok(response) => {
                let log = console_log(&descriptor, Ok(response));
                self.store.record_response(id, response, log)
            }
            Err(error) => {
                let log = console_log(&descriptor, Err(&error.to_string()));
                self.store.record_console_log(id, log)
            }
        };
        if !recorded {
            debug!(id, "request removed while in flight, outcome not recorded");
        }
        outcome
    }

    /// Resolves the `Authorization` value for a request linked to an auth
    /// configuration, fetching a token when none is cached.
    ///
    /// Returns `None` when the request has no link or the link does not
    /// name an auth configuration.
    async fn bearer_for(
        &self,
        request: &Request,
        proxy: &ProxyConfig,
    ) -> Result<Option<String>, AuthError> {
        let Some(config_id) = request.auth_config_id.as_deref().filter(|id| !id.is_empty())
        else {
            return Ok(None);
        };
        let Some(config) = self.store.request(config_id).filter(|r| r.is_auth_config) else {
            debug!(id = %request.id, config_id, "linked auth configuration not found");
            return Ok(None);
        };
        if let Some(bearer) = self.tokens.bearer(config_id) {
            return Ok(Some(bearer));
        }

        let response = self.executor.execute(&config, proxy).await?;
        if !(200..300).contains(&response.status) {
            return Err(AuthError::Rejected {
                status: response.status,
                body: response.body_text(),
            });
        }
        let bearer = self.tokens.store(config_id, &response.body)?;
        info!(config_id, "auth token fetched");
        Ok(Some(bearer))
    }
}

/// Sets the `Authorization` header, replacing any spelling of it.
fn authorize(request: &mut Request, bearer: String) {
    let headers = request.headers.get_or_insert_with(Default::default);
    headers.retain(|name, _| !name.eq_ignore_ascii_case(AUTHORIZATION));
    headers.insert(AUTHORIZATION.to_string(), bearer);
}
