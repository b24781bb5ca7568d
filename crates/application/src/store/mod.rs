//! Persisted tree store
//!
//! [`TreeStore`] owns every request and group, persists them as one
//! document through the Host Bridge and publishes an immutable
//! [`StoreSnapshot`] after each change.
//!
//! Mutations are synchronous. Each one that changes state publishes exactly
//! one snapshot, and every registered observer has seen it by the time the
//! mutating call returns. A re-entrant lock serializes mutation and
//! publication, so an observer may call back into the store from its
//! callback; the nested change is queued and published once the current
//! snapshot has reached every observer.

mod observer;
mod snapshot;

use std::cell::RefCell;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use parking_lot::{ReentrantMutex, RwLock};
use rattle_domain::{
    DOCUMENT_FILE_NAME, Document, DomainError, Group, GroupPatch, Request, RequestPatch, Response,
};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

pub use observer::{FnObserver, StoreObserver, SubscriptionId};
pub use rattle_domain::generate_id;
pub use snapshot::{DefaultGroup, LoadOutcome, StoreSnapshot};

use crate::ports::{HostBridge, HostError};

/// Errors surfaced by [`TreeStore::save`] and logged by [`TreeStore::load`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The host failed to provide a path or to read or write the file.
    #[error("host error: {0}")]
    Host(#[from] HostError),

    /// The document could not be encoded or decoded.
    #[error("document error: {0}")]
    Document(#[from] DomainError),
}

#[derive(Default)]
struct State {
    requests: IndexMap<String, Request>,
    groups: IndexMap<String, Group>,
    current: Arc<StoreSnapshot>,
    pending: VecDeque<Arc<StoreSnapshot>>,
    publishing: bool,
}

impl State {
    fn replace(&mut self, document: Document) {
        self.requests = document
            .requests
            .into_iter()
            .map(|r| (r.id.clone(), r))
            .collect();
        self.groups = document
            .groups
            .into_iter()
            .map(|g| (g.id.clone(), g))
            .collect();
    }

    fn commit(&mut self) {
        let snapshot = Arc::new(StoreSnapshot {
            revision: self.current.revision + 1,
            requests: self.requests.values().cloned().collect(),
            groups: self.groups.values().cloned().collect(),
        });
        self.current = Arc::clone(&snapshot);
        self.pending.push_back(snapshot);
    }
}

/// In-memory request and group collections backed by the persisted document.
pub struct TreeStore {
    bridge: Arc<dyn HostBridge>,
    state: ReentrantMutex<RefCell<State>>,
    observers: RwLock<Vec<(SubscriptionId, Arc<dyn StoreObserver>)>>,
    next_subscription: AtomicU64,
    sender: watch::Sender<Arc<StoreSnapshot>>,
}

impl TreeStore {
    /// Creates an empty store. Call [`Self::load`] to populate it.
    #[must_use]
    pub fn new(bridge: Arc<dyn HostBridge>) -> Self {
        let (sender, _) = watch::channel(Arc::new(StoreSnapshot::default()));
        Self {
            bridge,
            state: ReentrantMutex::new(RefCell::new(State::default())),
            observers: RwLock::new(Vec::new()),
            next_subscription: AtomicU64::new(0),
            sender,
        }
    }

    /// Replaces both collections with the persisted document.
    ///
    /// Never fails: a missing, unreadable or malformed document installs
    /// the default groups instead. Publishes exactly one snapshot.
    pub async fn load(&self) -> LoadOutcome {
        let (document, outcome) = match self.read_document().await {
            Ok(Some(document)) => {
                let outcome = LoadOutcome::Loaded {
                    requests: document.requests.len(),
                    groups: document.groups.len(),
                };
                (document, outcome)
            }
            Ok(None) => (Self::default_document(), LoadOutcome::FirstRun),
            Err(error) => {
                warn!(%error, "could not load document, starting from defaults");
                let reason = error.to_string();
                (Self::default_document(), LoadOutcome::Recovered { reason })
            }
        };

        self.mutate(|state| {
            state.replace(document);
            ((), true)
        });
        info!(?outcome, "document loaded");
        outcome
    }

    /// Writes both collections to the persisted document.
    ///
    /// In-memory state is left untouched whether or not the write succeeds.
    ///
    /// # Errors
    /// Returns an error if the document cannot be encoded or written.
    pub async fn save(&self) -> Result<(), StoreError> {
        let snapshot = self.snapshot();
        match self.write_document(&snapshot).await {
            Ok(()) => {
                info!(
                    revision = snapshot.revision,
                    requests = snapshot.requests.len(),
                    groups = snapshot.groups.len(),
                    "document saved"
                );
                Ok(())
            }
            Err(error) => {
                error!(%error, "could not save document");
                Err(error)
            }
        }
    }

    async fn document_path(&self) -> Result<PathBuf, StoreError> {
        Ok(self.bridge.app_data_dir().await?.join(DOCUMENT_FILE_NAME))
    }

    async fn read_document(&self) -> Result<Option<Document>, StoreError> {
        let path = self.document_path().await?;
        if !self.bridge.file_exists(&path).await {
            debug!(path = %path.display(), "no document yet");
            return Ok(None);
        }
        let json = self.bridge.read_file(&path).await?;
        Ok(Some(Document::from_json(&json)?))
    }

    async fn write_document(&self, snapshot: &StoreSnapshot) -> Result<(), StoreError> {
        let json = snapshot.document().to_json()?;
        let path = self.document_path().await?;
        self.bridge.write_file(&path, &json).await?;
        Ok(())
    }

    fn default_document() -> Document {
        Document::new(Vec::new(), Group::defaults())
    }

    /// Inserts a request, replacing any request with the same id.
    pub fn add_request(&self, request: Request) {
        debug!(id = %request.id, "adding request");
        self.mutate(|state| {
            state.requests.insert(request.id.clone(), request);
            ((), true)
        });
    }

    /// Applies a patch to a request. Returns false, without publishing, if
    /// the id is unknown.
    pub fn update_request(&self, id: &str, patch: RequestPatch) -> bool {
        let updated = self.mutate(|state| match state.requests.get_mut(id) {
            Some(request) => {
                patch.apply(request);
                (true, true)
            }
            None => (false, false),
        });
        if !updated {
            debug!(id, "update of unknown request ignored");
        }
        updated
    }

    /// Removes a request. Publishes even if the id is unknown.
    pub fn delete_request(&self, id: &str) -> Option<Request> {
        debug!(id, "deleting request");
        self.mutate(|state| (state.requests.shift_remove(id), true))
    }

    /// Inserts a group, replacing any group with the same id.
    pub fn add_group(&self, group: Group) {
        debug!(id = %group.id, "adding group");
        self.mutate(|state| {
            state.groups.insert(group.id.clone(), group);
            ((), true)
        });
    }

    /// Applies a patch to a group. Returns false, without publishing, if
    /// the id is unknown.
    pub fn update_group(&self, id: &str, patch: GroupPatch) -> bool {
        let updated = self.mutate(|state| match state.groups.get_mut(id) {
            Some(group) => {
                patch.apply(group);
                (true, true)
            }
            None => (false, false),
        });
        if !updated {
            debug!(id, "update of unknown group ignored");
        }
        updated
    }

    /// Removes a group. Its requests and child groups are kept and drop out
    /// of the tree until they are moved. Publishes even if the id is unknown.
    pub fn delete_group(&self, id: &str) -> Option<Group> {
        debug!(id, "deleting group");
        self.mutate(|state| (state.groups.shift_remove(id), true))
    }

    /// Adds an unsaved "New Request" draft to a group and returns it.
    pub fn create_request(&self, group_id: Option<String>) -> Request {
        let request = Request::draft(group_id);
        self.add_request(request.clone());
        request
    }

    /// Adds a group and returns it.
    pub fn create_group(&self, name: impl Into<String>, parent_id: Option<String>) -> Group {
        let group = Group {
            parent_id,
            ..Group::new(name)
        };
        self.add_group(group.clone());
        group
    }

    /// Stores the displayed body, status code and console log of a
    /// response on a request, as one change.
    pub fn record_response(&self, id: &str, response: &Response, console_log: String) -> bool {
        self.update_request(
            id,
            RequestPatch {
                response: Some(Some(response.body_text())),
                status_code: Some(Some(response.status)),
                console_log: Some(Some(console_log)),
                ..RequestPatch::default()
            },
        )
    }

    /// Stores the console log of a failed call. The last response is kept.
    pub fn record_console_log(&self, id: &str, console_log: String) -> bool {
        self.update_request(
            id,
            RequestPatch {
                console_log: Some(Some(console_log)),
                ..RequestPatch::default()
            },
        )
    }

    /// Clears the modified flag after the request was saved.
    pub fn mark_saved(&self, id: &str) -> bool {
        self.update_request(
            id,
            RequestPatch {
                is_modified: Some(false),
                ..RequestPatch::default()
            },
        )
    }

    fn mutate<T>(&self, change: impl FnOnce(&mut State) -> (T, bool)) -> T {
        let guard = self.state.lock();
        let value = {
            let mut state = guard.borrow_mut();
            let (value, changed) = change(&mut state);
            if !changed {
                return value;
            }
            state.commit();
            if state.publishing {
                // An outer call on this thread is already publishing and
                // will pick the new snapshot up from the queue.
                return value;
            }
            state.publishing = true;
            value
        };
        self.publish_pending(&guard);
        value
    }

    fn publish_pending(&self, cell: &RefCell<State>) {
        loop {
            let next = cell.borrow_mut().pending.pop_front();
            let Some(snapshot) = next else {
                cell.borrow_mut().publishing = false;
                return;
            };
            self.deliver(&snapshot);
        }
    }

    fn deliver(&self, snapshot: &Arc<StoreSnapshot>) {
        let observers: Vec<Arc<dyn StoreObserver>> = self
            .observers
            .read()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();

        debug!(
            revision = snapshot.revision,
            observers = observers.len(),
            "publishing snapshot"
        );

        self.sender.send_replace(Arc::clone(snapshot));
        for observer in observers {
            notify(observer.as_ref(), snapshot);
        }
    }

    /// The latest published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<StoreSnapshot> {
        Arc::clone(&self.state.lock().borrow().current)
    }

    /// Returns a copy of a request.
    #[must_use]
    pub fn request(&self, id: &str) -> Option<Request> {
        self.state.lock().borrow().requests.get(id).cloned()
    }

    /// Returns a copy of a group.
    #[must_use]
    pub fn group(&self, id: &str) -> Option<Group> {
        self.state.lock().borrow().groups.get(id).cloned()
    }

    /// Returns the first root group carrying a default group's name.
    #[must_use]
    pub fn default_group(&self, which: DefaultGroup) -> Option<Group> {
        self.state
            .lock()
            .borrow()
            .groups
            .values()
            .find(|g| g.parent_id.is_none() && g.name == which.name())
            .cloned()
    }

    /// Copies both collections into a document.
    #[must_use]
    pub fn document(&self) -> Document {
        self.snapshot().document()
    }

    /// Registers an observer and immediately hands it the current snapshot.
    pub fn subscribe(&self, observer: Arc<dyn StoreObserver>) -> SubscriptionId {
        let guard = self.state.lock();
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.observers.write().push((id, Arc::clone(&observer)));
        info!(observer = observer.name(), "store observer registered");

        let current = Arc::clone(&guard.borrow().current);
        notify(observer.as_ref(), &current);
        id
    }

    /// Removes an observer. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = self.observers.write();
        let before = observers.len();
        observers.retain(|(existing, _)| *existing != id);
        before != observers.len()
    }

    /// Receiver that always holds the latest snapshot.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<Arc<StoreSnapshot>> {
        self.sender.subscribe()
    }
}

/// Hands a snapshot to one observer. A panic is logged and contained so the
/// remaining observers and later revisions are still delivered.
fn notify(observer: &dyn StoreObserver, snapshot: &Arc<StoreSnapshot>) {
    let delivered = panic::catch_unwind(AssertUnwindSafe(|| observer.on_snapshot(snapshot)));
    if delivered.is_err() {
        error!(
            observer = observer.name(),
            revision = snapshot.revision,
            "store observer panicked"
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::test_support::MockBridge;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use rattle_domain::{HttpMethod, NodeKind};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn store(bridge: &Arc<MockBridge>) -> TreeStore {
        TreeStore::new(Arc::clone(bridge) as Arc<dyn HostBridge>)
    }

    /// Records the revision of every snapshot it sees.
    fn recorder(store: &TreeStore) -> (SubscriptionId, Arc<Mutex<Vec<u64>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let id = store.subscribe(Arc::new(FnObserver::new("recorder", move |s| {
            sink.lock().push(s.revision);
        })));
        seen.lock().clear();
        (id, seen)
    }

    #[tokio::test]
    async fn test_first_run_installs_default_groups() {
        let bridge = MockBridge::new();
        let store = store(&bridge);
        let (_, seen) = recorder(&store);

        assert_eq!(store.load().await, LoadOutcome::FirstRun);

        let snapshot = store.snapshot();
        let names: Vec<_> = snapshot.groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["History", "Auth configurations"]);
        assert!(snapshot.requests.is_empty());
        assert_eq!(*seen.lock(), vec![1]);
    }

    #[tokio::test]
    async fn test_load_reads_existing_document() {
        let bridge = MockBridge::new();
        bridge.put_file(
            MockBridge::document_path(),
            r#"{"apiModels":[{"id":"r1","name":"Ping","method":"GET","url":"http://x","groupId":"g1"}],
                "apiGroups":[{"id":"g1","name":"APIs"}]}"#,
        );
        let store = store(&bridge);

        let outcome = store.load().await;
        assert_eq!(outcome, LoadOutcome::Loaded { requests: 1, groups: 1 });
        assert!(!outcome.used_defaults());
        assert_eq!(store.request("r1").unwrap().name, "Ping");
        assert_eq!(store.snapshot().tree()[0].children[0].id, "r1");
    }

    #[tokio::test]
    async fn test_malformed_document_falls_back_to_defaults() {
        let bridge = MockBridge::new();
        bridge.put_file(MockBridge::document_path(), "{not json");
        let store = store(&bridge);

        let outcome = store.load().await;
        assert!(matches!(outcome, LoadOutcome::Recovered { .. }));
        assert_eq!(store.snapshot().groups.len(), 2);
    }

    #[tokio::test]
    async fn test_unreadable_document_falls_back_to_defaults() {
        let bridge = MockBridge::new();
        bridge.put_file(MockBridge::document_path(), "{}");
        bridge.fail_reads();
        let store = store(&bridge);

        assert!(store.load().await.used_defaults());
        assert_eq!(store.snapshot().groups.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_data_dir_falls_back_to_defaults() {
        let bridge = MockBridge::new();
        bridge.lose_data_dir();
        let store = store(&bridge);

        let outcome = store.load().await;
        let LoadOutcome::Recovered { reason } = outcome else {
            panic!("expected recovery, got {outcome:?}");
        };
        assert!(reason.contains("no data directory"));
    }

    #[tokio::test]
    async fn test_save_then_load_round_trips() {
        let bridge = MockBridge::new();
        let first = store(&bridge);
        first.load().await;
        let group = first.create_group("APIs", None);
        first.add_request(
            Request::with_url("Users", HttpMethod::Post, "http://example.test/users")
                .in_group(group.id.clone())
                .with_header("Accept", "application/json")
                .with_body("{}"),
        );
        first.add_request(Request::auth_config("Token", "OAuth2"));
        first.save().await.unwrap();

        let saved = bridge.file(&MockBridge::document_path()).unwrap();
        assert!(saved.starts_with("{\n  \"apiModels\""));

        let second = store(&bridge);
        second.load().await;
        assert!(first.document().same_contents(&second.document()));
    }

    #[tokio::test]
    async fn test_save_failure_is_reported_and_state_kept() {
        let bridge = MockBridge::new();
        let store = store(&bridge);
        store.load().await;
        store.create_request(None);
        bridge.fail_writes();

        let before = store.snapshot();
        let result = store.save().await;
        assert!(matches!(result, Err(StoreError::Host(HostError::Io(_)))));
        assert_eq!(store.snapshot(), before);
    }

    #[tokio::test]
    async fn test_each_mutation_publishes_once() {
        let bridge = MockBridge::new();
        let store = store(&bridge);
        store.load().await;
        let (_, seen) = recorder(&store);

        let group = store.create_group("G", None);
        let request = store.create_request(Some(group.id.clone()));
        assert!(store.update_request(
            &request.id,
            RequestPatch {
                url: Some("http://x".to_string()),
                ..RequestPatch::default()
            }
        ));
        assert!(store.update_group(&group.id, GroupPatch::rename("H")));
        store.delete_request(&request.id);
        store.delete_group(&group.id);

        assert_eq!(*seen.lock(), vec![2, 3, 4, 5, 6, 7]);
    }

    #[tokio::test]
    async fn test_update_of_unknown_id_is_silent() {
        let bridge = MockBridge::new();
        let store = store(&bridge);
        store.load().await;
        let (_, seen) = recorder(&store);

        assert!(!store.update_request("missing", RequestPatch::default()));
        assert!(!store.update_group("missing", GroupPatch::rename("x")));
        assert!(seen.lock().is_empty());

        assert_eq!(store.delete_request("missing"), None);
        assert_eq!(store.delete_group("missing"), None);
        assert_eq!(seen.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_observer_sees_change_before_call_returns() {
        let bridge = MockBridge::new();
        let store = store(&bridge);
        let names = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&names);
        store.subscribe(Arc::new(FnObserver::new("names", move |s| {
            *sink.lock() = s.groups.iter().map(|g| g.name.clone()).collect::<Vec<_>>();
        })));

        store.add_group(Group::new("Fresh"));
        assert_eq!(*names.lock(), vec!["Fresh".to_string()]);
    }

    #[tokio::test]
    async fn test_observer_may_mutate_the_store() {
        let bridge = MockBridge::new();
        let store = Arc::new(store(&bridge));
        let (_, seen) = recorder(&store);

        // Files every new request without a group under "Inbox".
        let weak = Arc::downgrade(&store);
        store.subscribe(Arc::new(FnObserver::new("inbox", move |s| {
            let Some(store) = weak.upgrade() else { return };
            let orphans = s
                .requests
                .iter()
                .filter(|r| store.request(&r.id).is_some_and(|live| live.group_id.is_none()));
            for orphan in orphans {
                let inbox = store.create_group("Inbox", None);
                store.update_request(
                    &orphan.id,
                    RequestPatch {
                        group_id: Some(Some(inbox.id)),
                        ..RequestPatch::default()
                    },
                );
            }
        })));

        let request = store.create_request(None);

        assert_eq!(*seen.lock(), vec![1, 2, 3]);
        let stored = store.request(&request.id).unwrap();
        let inbox = store.group(stored.group_id.as_deref().unwrap()).unwrap();
        assert_eq!(inbox.name, "Inbox");
    }

    #[tokio::test]
    async fn test_panicking_observer_does_not_stall_publication() {
        let bridge = MockBridge::new();
        let store = store(&bridge);
        let (_, before) = recorder(&store);
        store.subscribe(Arc::new(FnObserver::new("flaky", |s| {
            if s.revision == 1 {
                panic!("observer failure");
            }
        })));
        let (_, after) = recorder(&store);

        store.create_group("A", None);
        store.create_group("B", None);

        assert_eq!(*before.lock(), vec![1, 2]);
        assert_eq!(*after.lock(), vec![1, 2]);
        assert_eq!(store.watch().borrow().revision, 2);
        assert_eq!(store.snapshot().groups.len(), 2);
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        let bridge = MockBridge::new();
        let store = store(&bridge);
        let (id, seen) = recorder(&store);

        store.create_group("A", None);
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.create_group("B", None);

        assert_eq!(*seen.lock(), vec![1]);
    }

    #[tokio::test]
    async fn test_subscribe_replays_current_snapshot() {
        let bridge = MockBridge::new();
        let store = store(&bridge);
        store.load().await;

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        store.subscribe(Arc::new(FnObserver::new("late", move |s| {
            sink.lock().push(s.revision);
        })));
        assert_eq!(*seen.lock(), vec![1]);
    }

    #[tokio::test]
    async fn test_watch_tracks_latest_snapshot() {
        let bridge = MockBridge::new();
        let store = store(&bridge);
        let mut rx = store.watch();

        store.load().await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().revision, 1);

        store.create_group("G", None);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().groups.len(), 3);
    }

    #[tokio::test]
    async fn test_deleting_group_orphans_its_requests() {
        let bridge = MockBridge::new();
        let store = store(&bridge);
        let group = store.create_group("G", None);
        let request = store.create_request(Some(group.id.clone()));

        store.delete_group(&group.id);

        let snapshot = store.snapshot();
        assert!(snapshot.request(&request.id).is_some());
        assert!(snapshot.tree().is_empty());
    }

    #[tokio::test]
    async fn test_record_response_and_mark_saved() {
        let bridge = MockBridge::new();
        let store = store(&bridge);
        let request = store.create_request(None);
        assert!(request.session.is_modified);

        let response = Response::new(201, "Created", BTreeMap::new(), json!({"id": 7}), 12);
        assert!(store.record_response(&request.id, &response, "log".to_string()));
        assert!(store.mark_saved(&request.id));

        let stored = store.request(&request.id).unwrap();
        assert_eq!(stored.status_code, Some(201));
        assert_eq!(stored.response.as_deref(), Some("{\n  \"id\": 7\n}"));
        assert_eq!(stored.console_log.as_deref(), Some("log"));
        assert!(!stored.session.is_modified);
        assert!(!store.record_response("missing", &response, String::new()));
    }

    #[tokio::test]
    async fn test_record_console_log_keeps_last_response() {
        let bridge = MockBridge::new();
        let store = store(&bridge);
        let request = store.create_request(None);
        let response = Response::new(200, "OK", BTreeMap::new(), json!("fine"), 1);
        store.record_response(&request.id, &response, "first".to_string());
        let (_, seen) = recorder(&store);

        assert!(store.record_console_log(&request.id, "second".to_string()));

        let stored = store.request(&request.id).unwrap();
        assert_eq!(stored.console_log.as_deref(), Some("second"));
        assert_eq!(stored.status_code, Some(200));
        assert_eq!(stored.response.as_deref(), Some("fine"));
        assert_eq!(seen.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_default_group_lookup() {
        let bridge = MockBridge::new();
        let store = store(&bridge);
        assert_eq!(store.default_group(DefaultGroup::History), None);

        store.load().await;
        let history = store.default_group(DefaultGroup::History).unwrap();
        let auth = store.default_group(DefaultGroup::AuthConfigurations).unwrap();
        assert_eq!(history.name, "History");
        assert_eq!(auth.name, "Auth configurations");

        let mut config = Request::auth_config("Token", "OAuth2");
        config.group_id = Some(auth.id.clone());
        store.add_request(config);
        let tree = store.snapshot().tree();
        assert_eq!(tree[1].children[0].kind, NodeKind::AuthConfig);
    }
}
