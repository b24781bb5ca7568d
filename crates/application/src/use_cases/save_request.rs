//! Save request use case.

use std::sync::Arc;

use rattle_domain::RequestPatch;
use thiserror::Error;

use crate::store::{StoreError, TreeStore};

/// Errors from saving a request.
#[derive(Debug, Error)]
pub enum SaveRequestError {
    /// No request with this id is stored.
    #[error("request not found: {0}")]
    NotFound(String),

    /// The document could not be written.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Use case for committing a request's edits and writing the document.
pub struct SaveRequest {
    store: Arc<TreeStore>,
}

impl SaveRequest {
    /// Creates a new `SaveRequest` use case.
    #[must_use]
    pub const fn new(store: Arc<TreeStore>) -> Self {
        Self { store }
    }

    /// Clears the request's modified and new flags, then writes the
    /// document.
    ///
    /// The flags stay cleared if the write fails; the next save retries it.
    ///
    /// # Errors
    /// - Returns `SaveRequestError::NotFound` for an unknown id
    /// - Returns `SaveRequestError::Store` if the document cannot be written
    pub async fn execute(&self, id: &str) -> Result<(), SaveRequestError> {
        let patch = RequestPatch {
            is_modified: Some(false),
            is_new_tab: Some(false),
            ..RequestPatch::default()
        };
        if !self.store.update_request(id, patch) {
            return Err(SaveRequestError::NotFound(id.to_string()));
        }
        self.store.save().await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ports::HostBridge;
    use crate::test_support::MockBridge;
    use rattle_domain::Document;

    #[tokio::test]
    async fn test_save_clears_flags_and_writes() {
        let bridge = MockBridge::new();
        let store = Arc::new(TreeStore::new(Arc::clone(&bridge) as Arc<dyn HostBridge>));
        store.load().await;
        let draft = store.create_request(None);

        SaveRequest::new(Arc::clone(&store))
            .execute(&draft.id)
            .await
            .unwrap();

        let stored = store.request(&draft.id).unwrap();
        assert!(!stored.session.is_modified);
        assert!(!stored.session.is_new_tab);

        let written = bridge.file(&MockBridge::document_path()).unwrap();
        let document = Document::from_json(&written).unwrap();
        assert!(document.same_contents(&store.document()));
    }

    #[tokio::test]
    async fn test_unknown_id_writes_nothing() {
        let bridge = MockBridge::new();
        let store = Arc::new(TreeStore::new(Arc::clone(&bridge) as Arc<dyn HostBridge>));

        let result = SaveRequest::new(store).execute("missing").await;
        assert!(matches!(result, Err(SaveRequestError::NotFound(_))));
        assert_eq!(bridge.file(&MockBridge::document_path()), None);
    }

    #[tokio::test]
    async fn test_write_failure_is_reported() {
        let bridge = MockBridge::new();
        let store = Arc::new(TreeStore::new(Arc::clone(&bridge) as Arc<dyn HostBridge>));
        let draft = store.create_request(None);
        bridge.fail_writes();

        let result = SaveRequest::new(store).execute(&draft.id).await;
        assert!(matches!(result, Err(SaveRequestError::Store(_))));
    }
}
