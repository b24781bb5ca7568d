//! Request groups

use serde::{Deserialize, Serialize};

use crate::id::generate_id;

/// A named container that can nest other groups and hold requests.
///
/// `parent_id` is not validated: it may name a missing group or the
/// group itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    /// Unique identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Enclosing group
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl Group {
    /// Name of the group executed requests are filed under.
    pub const HISTORY: &'static str = "History";
    /// Name of the group holding auth configurations.
    pub const AUTH_CONFIGURATIONS: &'static str = "Auth configurations";

    /// Creates a root group with a fresh id.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            name: name.into(),
            parent_id: None,
        }
    }

    /// Creates a group nested under `parent_id`.
    #[must_use]
    pub fn child_of(name: impl Into<String>, parent_id: impl Into<String>) -> Self {
        Self {
            parent_id: Some(parent_id.into()),
            ..Self::new(name)
        }
    }

    /// The groups every fresh document starts with.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        vec![Self::new(Self::HISTORY), Self::new(Self::AUTH_CONFIGURATIONS)]
    }
}

/// Partial update of a [`Group`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[allow(clippy::option_option)]
pub struct GroupPatch {
    /// New display name
    pub name: Option<String>,
    /// New parent; `Some(None)` moves the group to the root
    pub parent_id: Option<Option<String>>,
}

impl GroupPatch {
    /// Patch that renames a group.
    #[must_use]
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            parent_id: None,
        }
    }

    /// Writes every present field onto `group`.
    pub fn apply(self, group: &mut Group) {
        if let Some(name) = self.name {
            group.name = name;
        }
        if let Some(parent_id) = self.parent_id {
            group.parent_id = parent_id;
        }
    }
}
