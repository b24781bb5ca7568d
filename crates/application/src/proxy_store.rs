//! Proxy configuration store
//!
//! Holds the proxy policy applied to every executed request. It is
//! persisted under its own key, apart from the request document, so it can
//! be read before the document has loaded.

use std::sync::Arc;

use parking_lot::RwLock;
use rattle_domain::{PROXY_SETTINGS_KEY, ProxyConfig};
use tracing::{debug, info, warn};

use crate::ports::KeyValueStore;

/// The current [`ProxyConfig`] and its persistence.
pub struct ProxyStore {
    kv: Arc<dyn KeyValueStore>,
    config: RwLock<ProxyConfig>,
}

impl ProxyStore {
    /// Creates a store holding the default configuration, without reading
    /// anything.
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            config: RwLock::new(ProxyConfig::default()),
        }
    }

    /// Reads the persisted configuration. A missing, unreadable or
    /// malformed value yields the default.
    pub async fn load(kv: Arc<dyn KeyValueStore>) -> Self {
        let config = match kv.get(PROXY_SETTINGS_KEY).await {
            Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|error| {
                warn!(%error, "malformed proxy settings, using defaults");
                ProxyConfig::default()
            }),
            Ok(None) => {
                debug!("no proxy settings stored, using defaults");
                ProxyConfig::default()
            }
            Err(error) => {
                warn!(%error, "could not read proxy settings, using defaults");
                ProxyConfig::default()
            }
        };
        info!(mode = ?config.proxy_mode, "proxy settings loaded");

        Self {
            kv,
            config: RwLock::new(config),
        }
    }

    /// Returns a copy of the current configuration.
    #[must_use]
    pub fn get(&self) -> ProxyConfig {
        self.config.read().clone()
    }

    /// Replaces the configuration and persists it. A persistence failure is
    /// logged; the new value stays in effect either way.
    pub async fn set(&self, config: ProxyConfig) {
        if let Err(error) = config.validate() {
            warn!(%error, "storing incomplete proxy settings");
        }
        *self.config.write() = config.clone();

        let json = match serde_json::to_string(&config) {
            Ok(json) => json,
            Err(error) => {
                warn!(%error, "could not encode proxy settings");
                return;
            }
        };
        match self.kv.set(PROXY_SETTINGS_KEY, &json).await {
            Ok(()) => debug!(mode = ?config.proxy_mode, "proxy settings saved"),
            Err(error) => warn!(%error, "could not persist proxy settings"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::MockKeyValue;
    use pretty_assertions::assert_eq;
    use rattle_domain::ProxyMode;

    fn kv(mock: &Arc<MockKeyValue>) -> Arc<dyn KeyValueStore> {
        Arc::clone(mock) as Arc<dyn KeyValueStore>
    }

    #[tokio::test]
    async fn test_missing_settings_default() {
        let mock = MockKeyValue::new();
        let store = ProxyStore::load(kv(&mock)).await;
        assert_eq!(store.get(), ProxyConfig::default());
        assert!(store.get().verify_ssl_certificate);
    }

    #[tokio::test]
    async fn test_set_persists_and_reloads() {
        let mock = MockKeyValue::new();
        let store = ProxyStore::load(kv(&mock)).await;
        let config = ProxyConfig::with_host("proxy.x:8080").with_auth("u", "p");

        store.set(config.clone()).await;
        assert_eq!(store.get(), config);
        assert!(mock.value(PROXY_SETTINGS_KEY).unwrap().contains("\"proxyMode\":\"ON\""));

        let reloaded = ProxyStore::load(kv(&mock)).await;
        assert_eq!(reloaded.get(), config);
    }

    #[tokio::test]
    async fn test_malformed_settings_default() {
        let mock = MockKeyValue::new();
        mock.put(PROXY_SETTINGS_KEY, "{\"proxyMode\": 12}");
        let store = ProxyStore::load(kv(&mock)).await;
        assert_eq!(store.get().proxy_mode, ProxyMode::Off);
    }

    #[tokio::test]
    async fn test_persistence_failure_keeps_new_value() {
        let mock = MockKeyValue::new();
        let store = ProxyStore::new(kv(&mock));
        mock.fail();

        store.set(ProxyConfig::new().insecure()).await;
        assert!(!store.get().verify_ssl_certificate);

        let reloaded = ProxyStore::load(kv(&mock)).await;
        assert!(reloaded.get().verify_ssl_certificate);
    }

    #[tokio::test]
    async fn test_get_returns_a_copy() {
        let mock = MockKeyValue::new();
        let store = ProxyStore::new(kv(&mock));
        let mut copy = store.get();
        copy.proxy_mode = ProxyMode::System;
        assert_eq!(store.get().proxy_mode, ProxyMode::Off);
    }
}
