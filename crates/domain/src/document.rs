//! The persisted document: every request and group in one JSON object.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::group::Group;
use crate::request::Request;

/// File name of the document inside the application data directory.
pub const DOCUMENT_FILE_NAME: &str = "rattle.json";

/// All requests and groups, as written to disk.
///
/// ```json
/// { "apiModels": [ ... ], "apiGroups": [ ... ] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Every saved request.
    #[serde(rename = "apiModels", default)]
    pub requests: Vec<Request>,
    /// Every group.
    #[serde(rename = "apiGroups", default)]
    pub groups: Vec<Group>,
}

impl Document {
    /// Creates a document from its two collections.
    #[must_use]
    pub const fn new(requests: Vec<Request>, groups: Vec<Group>) -> Self {
        Self { requests, groups }
    }

    /// Serializes to 2-space indented JSON with a trailing newline.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidDocument` if serialization fails.
    pub fn to_json(&self) -> DomainResult<String> {
        let mut json = serde_json::to_string_pretty(self)
            .map_err(|e| DomainError::InvalidDocument(e.to_string()))?;
        json.push('\n');
        Ok(json)
    }

    /// Parses a document. Missing arrays are treated as empty.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidDocument` if the JSON is malformed or does
    /// not have the document shape.
    pub fn from_json(json: &str) -> DomainResult<Self> {
        serde_json::from_str(json).map_err(|e| DomainError::InvalidDocument(e.to_string()))
    }

    /// Compares two documents as id-keyed sets, ignoring collection order.
    #[must_use]
    pub fn same_contents(&self, other: &Self) -> bool {
        fn by_id<'a, T>(items: &'a [T], id: impl Fn(&T) -> &str) -> HashMap<&'a str, &'a T> {
            items.iter().map(|item| (id(item), item)).collect()
        }

        by_id(&self.requests, |r| r.id.as_str()) == by_id(&other.requests, |r| r.id.as_str())
            && by_id(&self.groups, |g| g.id.as_str()) == by_id(&other.groups, |g| g.id.as_str())
    }
}
