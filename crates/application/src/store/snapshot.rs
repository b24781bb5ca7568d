//! Immutable views of the store

use rattle_domain::{Document, Group, Request, TreeNode, build_tree};

/// A consistent copy of both collections at one revision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSnapshot {
    /// Incremented by every published change. `0` before the first load.
    pub revision: u64,
    /// Requests in insertion order.
    pub requests: Vec<Request>,
    /// Groups in insertion order.
    pub groups: Vec<Group>,
}

impl StoreSnapshot {
    /// Looks up a request.
    #[must_use]
    pub fn request(&self, id: &str) -> Option<&Request> {
        self.requests.iter().find(|r| r.id == id)
    }

    /// Looks up a group.
    #[must_use]
    pub fn group(&self, id: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    /// Requests currently shown in a tab.
    pub fn open_requests(&self) -> impl Iterator<Item = &Request> {
        self.requests.iter().filter(|r| r.session.is_tab_open)
    }

    /// Derives the sidebar tree.
    #[must_use]
    pub fn tree(&self) -> Vec<TreeNode> {
        build_tree(&self.groups, &self.requests)
    }

    /// Copies the collections into a document.
    #[must_use]
    pub fn document(&self) -> Document {
        Document::new(self.requests.clone(), self.groups.clone())
    }
}

/// How [`super::TreeStore::load`] obtained its state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The document was read.
    Loaded {
        /// Number of requests read
        requests: usize,
        /// Number of groups read
        groups: usize,
    },
    /// No document exists yet; defaults were installed.
    FirstRun,
    /// The document could not be read or parsed; defaults were installed.
    Recovered {
        /// What went wrong
        reason: String,
    },
}

impl LoadOutcome {
    /// Returns true if defaults were installed.
    #[must_use]
    pub const fn used_defaults(&self) -> bool {
        !matches!(self, Self::Loaded { .. })
    }
}

/// The two groups seeded into a fresh document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultGroup {
    /// "History"
    History,
    /// "Auth configurations"
    AuthConfigurations,
}

impl DefaultGroup {
    /// Group name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::History => Group::HISTORY,
            Self::AuthConfigurations => Group::AUTH_CONFIGURATIONS,
        }
    }
}
