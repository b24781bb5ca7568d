//! Open request tabs

use rattle_domain::RequestPatch;

use crate::store::TreeStore;

/// Ordered set of open request ids with at most one active tab.
///
/// The active tab, when there is one, is always open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabSet {
    open: Vec<String>,
    active: Option<String>,
}

impl TabSet {
    /// Creates an empty tab set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a tab, appending it if needed, and makes it active.
    pub fn open(&mut self, id: impl Into<String>) {
        let id = id.into();
        if !self.is_open(&id) {
            self.open.push(id.clone());
        }
        self.active = Some(id);
    }

    /// Activates an open tab. Returns false if it is not open.
    pub fn select(&mut self, id: &str) -> bool {
        if !self.is_open(id) {
            return false;
        }
        self.active = Some(id.to_string());
        true
    }

    /// Closes a tab. Closing the active tab activates the last remaining
    /// one. Returns false if it was not open.
    pub fn close(&mut self, id: &str) -> bool {
        let Some(position) = self.open.iter().position(|open| open == id) else {
            return false;
        };
        self.open.remove(position);
        if self.active.as_deref() == Some(id) {
            self.active = self.open.last().cloned();
        }
        true
    }

    /// Returns true if the tab is open.
    #[must_use]
    pub fn is_open(&self, id: &str) -> bool {
        self.open.iter().any(|open| open == id)
    }

    /// The active tab.
    #[must_use]
    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Open tabs in opening order.
    #[must_use]
    pub fn tabs(&self) -> &[String] {
        &self.open
    }

    /// Writes the open, current and position flags onto the stored
    /// requests. Only requests whose flags change are updated.
    pub fn sync_flags(&self, store: &TreeStore) {
        let snapshot = store.snapshot();
        for request in &snapshot.requests {
            let position = self.open.iter().position(|open| *open == request.id);
            let is_tab_open = position.is_some();
            let is_current_tab = self.active.as_deref() == Some(request.id.as_str());
            let tab_nbr = position.and_then(|p| u32::try_from(p + 1).ok());

            if request.session.is_tab_open == is_tab_open
                && request.session.is_current_tab == is_current_tab
                && request.tab_nbr == tab_nbr
            {
                continue;
            }
            store.update_request(
                &request.id,
                RequestPatch {
                    is_tab_open: Some(is_tab_open),
                    is_current_tab: Some(is_current_tab),
                    tab_nbr: Some(tab_nbr),
                    ..RequestPatch::default()
                },
            );
        }
    }
}
