//! Rattle - composition root
//!
//! Wires the tree store, proxy store and execution pipeline to a host
//! bridge, and sets up logging. A front end holds one [`App`] and drives
//! everything through it.

use std::sync::Arc;

use parking_lot::Mutex;
use rattle_application::{
    ExecuteRequest, HostBridge, KeyValueStore, LoadOutcome, ProxyStore, SaveRequest,
    SaveRequestError, SendRequest, SendRequestError, StoreObserver, TabSet, TreeStore, TreeView,
};
use rattle_domain::{ProxyConfig, Request, Response};
use rattle_infrastructure::{AppConfig, FileKeyValueStore, LocalHostBridge};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub use rattle_application as application;
pub use rattle_domain as domain;
pub use rattle_infrastructure as infrastructure;

/// Installs the global `tracing` subscriber.
///
/// `filter` uses `EnvFilter` syntax; an invalid filter falls back to
/// `info`. Returns false if a subscriber was already installed.
pub fn init_tracing(filter: &str) -> bool {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}

/// The running core: stores, pipeline, sidebar tree and tabs.
pub struct App {
    store: Arc<TreeStore>,
    proxies: Arc<ProxyStore>,
    executor: Arc<ExecuteRequest>,
    send: SendRequest,
    save: SaveRequest,
    tree: Arc<TreeView>,
    tabs: Mutex<TabSet>,
}

impl App {
    /// Starts the core on the local host described by `config`.
    ///
    /// Loads the document and the proxy settings before returning.
    pub async fn bootstrap(config: &AppConfig) -> (Self, LoadOutcome) {
        info!(
            version = env!("CARGO_PKG_VERSION"),
            data_dir = %config.data_dir.display(),
            "starting Rattle"
        );
        let bridge: Arc<dyn HostBridge> = Arc::new(LocalHostBridge::from_config(config));
        let kv: Arc<dyn KeyValueStore> = Arc::new(FileKeyValueStore::in_dir(&config.data_dir));
        Self::start(bridge, kv).await
    }

    /// Starts the core on the given host.
    pub async fn start(
        bridge: Arc<dyn HostBridge>,
        kv: Arc<dyn KeyValueStore>,
    ) -> (Self, LoadOutcome) {
        let store = Arc::new(TreeStore::new(Arc::clone(&bridge)));
        let proxies = Arc::new(ProxyStore::load(kv).await);
        let executor = Arc::new(ExecuteRequest::new(bridge));

        let tree = TreeView::new();
        store.subscribe(Arc::clone(&tree) as Arc<dyn StoreObserver>);
        let outcome = store.load().await;

        let app = Self {
            send: SendRequest::new(
                Arc::clone(&store),
                Arc::clone(&proxies),
                Arc::clone(&executor),
            ),
            save: SaveRequest::new(Arc::clone(&store)),
            store,
            proxies,
            executor,
            tree,
            tabs: Mutex::new(TabSet::new()),
        };
        app.restore_tabs();
        (app, outcome)
    }

    /// Reopens the tabs recorded in the loaded document, in tab order.
    fn restore_tabs(&self) {
        let snapshot = self.store.snapshot();
        let mut open: Vec<&Request> = snapshot.open_requests().collect();
        open.sort_by_key(|r| r.tab_nbr.unwrap_or(u32::MAX));

        let mut tabs = self.tabs.lock();
        for request in &open {
            tabs.open(request.id.clone());
        }
        if let Some(current) = open.iter().find(|r| r.session.is_current_tab) {
            tabs.select(&current.id);
        }
        tabs.sync_flags(&self.store);
        debug!(tabs = tabs.tabs().len(), "tabs restored");
    }

    /// The request and group store.
    #[must_use]
    pub const fn store(&self) -> &Arc<TreeStore> {
        &self.store
    }

    /// The proxy configuration store.
    #[must_use]
    pub const fn proxies(&self) -> &Arc<ProxyStore> {
        &self.proxies
    }

    /// The execution pipeline, for its loading signal.
    #[must_use]
    pub const fn executor(&self) -> &Arc<ExecuteRequest> {
        &self.executor
    }

    /// The sidebar tree.
    #[must_use]
    pub const fn tree(&self) -> &Arc<TreeView> {
        &self.tree
    }

    /// Copy of the open tabs.
    #[must_use]
    pub fn tabs(&self) -> TabSet {
        self.tabs.lock().clone()
    }

    /// Creates an untitled request and opens it in a new tab.
    pub fn new_request(&self, group_id: Option<String>) -> Request {
        let request = self.store.create_request(group_id);
        self.with_tabs(|tabs| tabs.open(request.id.clone()));
        self.store.request(&request.id).unwrap_or(request)
    }

    /// Opens a stored request in a tab. Returns false for an unknown id.
    pub fn open_tab(&self, id: &str) -> bool {
        if self.store.request(id).is_none() {
            return false;
        }
        self.with_tabs(|tabs| tabs.open(id));
        true
    }

    /// Activates an open tab.
    pub fn select_tab(&self, id: &str) -> bool {
        self.with_tabs(|tabs| tabs.select(id))
    }

    /// Closes a tab.
    pub fn close_tab(&self, id: &str) -> bool {
        self.with_tabs(|tabs| tabs.close(id))
    }

    fn with_tabs<T>(&self, f: impl FnOnce(&mut TabSet) -> T) -> T {
        let mut tabs = self.tabs.lock();
        let result = f(&mut tabs);
        tabs.sync_flags(&self.store);
        result
    }

    /// Sends a stored request with the current proxy settings.
    ///
    /// # Errors
    ///
    /// See [`SendRequest::execute`]. A failed call still carries a
    /// displayable response via [`SendRequestError::response`].
    pub async fn send(&self, id: &str) -> Result<Response, SendRequestError> {
        self.send.execute(id).await
    }

    /// Marks a request saved and writes the document.
    ///
    /// # Errors
    ///
    /// See [`SaveRequest::execute`].
    pub async fn save(&self, id: &str) -> Result<(), SaveRequestError> {
        self.save.execute(id).await
    }

    /// Replaces and persists the proxy settings.
    pub async fn set_proxy(&self, config: ProxyConfig) {
        self.proxies.set(config).await;
    }
}
