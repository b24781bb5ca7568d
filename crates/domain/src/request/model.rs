//! Saved request record

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::HttpMethod;
use crate::id::generate_id;

/// Ordered key-value map for deterministic serialization.
pub type OrderedMap = BTreeMap<String, String>;

/// Editing state the UI tracks per request.
///
/// Kept apart from the request definition but flattened into the same
/// JSON object, so documents keep their existing shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionFlags {
    /// The request has edits that were not saved yet.
    #[serde(default)]
    pub is_modified: bool,
    /// The request is shown in a tab.
    #[serde(default)]
    pub is_tab_open: bool,
    /// The request is the active tab.
    #[serde(default)]
    pub is_current_tab: bool,
    /// The request was created in this session and never saved.
    #[serde(default)]
    pub is_new_tab: bool,
}

/// A named HTTP call definition plus its last known response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// Unique identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// HTTP method
    #[serde(default)]
    pub method: HttpMethod,
    /// Target URL
    #[serde(default)]
    pub url: String,
    /// Query parameters, unique by key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<OrderedMap>,
    /// Header name to value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<OrderedMap>,
    /// Raw request body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Last response body, as displayed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    /// Last response status code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Owning group
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    /// Whether this record is an auth configuration rather than a call
    #[serde(default)]
    pub is_auth_config: bool,
    /// Auth scheme name for auth configurations (e.g. "OAuth2")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_type: Option<String>,
    /// Auth configuration this request authenticates with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_config_id: Option<String>,
    /// Position in the tab strip
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_nbr: Option<u32>,
    /// Captured console output of the last run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub console_log: Option<String>,
    /// UI editing state
    #[serde(flatten)]
    pub session: SessionFlags,
}

impl Request {
    /// Default name given to freshly created requests.
    pub const DEFAULT_NAME: &'static str = "New Request";

    /// Creates a GET request with an empty URL and a fresh id.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            name: name.into(),
            method: HttpMethod::default(),
            url: String::new(),
            params: None,
            headers: None,
            body: None,
            response: None,
            status_code: None,
            group_id: None,
            is_auth_config: false,
            auth_type: None,
            auth_config_id: None,
            tab_nbr: None,
            console_log: None,
            session: SessionFlags::default(),
        }
    }

    /// Creates the unsaved "New Request" draft the sidebar adds to a group.
    #[must_use]
    pub fn draft(group_id: Option<String>) -> Self {
        Self {
            group_id,
            session: SessionFlags {
                is_modified: true,
                is_new_tab: true,
                ..SessionFlags::default()
            },
            ..Self::new(Self::DEFAULT_NAME)
        }
    }

    /// Creates a request with the given method and URL.
    #[must_use]
    pub fn with_url(name: impl Into<String>, method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            ..Self::new(name)
        }
    }

    /// Creates an auth configuration record.
    #[must_use]
    pub fn auth_config(name: impl Into<String>, auth_type: impl Into<String>) -> Self {
        Self {
            is_auth_config: true,
            auth_type: Some(auth_type.into()),
            ..Self::new(name)
        }
    }

    /// Places the request in a group.
    #[must_use]
    pub fn in_group(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(OrderedMap::new)
            .insert(name.into(), value.into());
        self
    }

    /// Adds a query parameter, replacing any previous value for the key.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params
            .get_or_insert_with(OrderedMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Partial update of a [`Request`].
///
/// Absent fields are left alone. Fields that are optional on the request
/// take `Some(None)` to clear them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[allow(clippy::option_option)]
pub struct RequestPatch {
    /// New display name
    pub name: Option<String>,
    /// New method
    pub method: Option<HttpMethod>,
    /// New URL
    pub url: Option<String>,
    /// New query parameters
    pub params: Option<Option<OrderedMap>>,
    /// New headers
    pub headers: Option<Option<OrderedMap>>,
    /// New body
    pub body: Option<Option<String>>,
    /// New stored response body
    pub response: Option<Option<String>>,
    /// New stored status code
    pub status_code: Option<Option<u16>>,
    /// New group membership
    pub group_id: Option<Option<String>>,
    /// New auth configuration flag
    pub is_auth_config: Option<bool>,
    /// New auth scheme name
    pub auth_type: Option<Option<String>>,
    /// New auth configuration reference
    pub auth_config_id: Option<Option<String>>,
    /// New tab position
    pub tab_nbr: Option<Option<u32>>,
    /// New console output
    pub console_log: Option<Option<String>>,
    /// New modified flag
    pub is_modified: Option<bool>,
    /// New tab-open flag
    pub is_tab_open: Option<bool>,
    /// New active-tab flag
    pub is_current_tab: Option<bool>,
    /// New new-tab flag
    pub is_new_tab: Option<bool>,
}

impl RequestPatch {
    /// Creates an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Writes every present field onto `request`. The id is never touched.
    pub fn apply(self, request: &mut Request) {
        fn set<T>(slot: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *slot = value;
            }
        }

        set(&mut request.name, self.name);
        set(&mut request.method, self.method);
        set(&mut request.url, self.url);
        set(&mut request.params, self.params);
        set(&mut request.headers, self.headers);
        set(&mut request.body, self.body);
        set(&mut request.response, self.response);
        set(&mut request.status_code, self.status_code);
        set(&mut request.group_id, self.group_id);
        set(&mut request.is_auth_config, self.is_auth_config);
        set(&mut request.auth_type, self.auth_type);
        set(&mut request.auth_config_id, self.auth_config_id);
        set(&mut request.tab_nbr, self.tab_nbr);
        set(&mut request.console_log, self.console_log);
        set(&mut request.session.is_modified, self.is_modified);
        set(&mut request.session.is_tab_open, self.is_tab_open);
        set(&mut request.session.is_current_tab, self.is_current_tab);
        set(&mut request.session.is_new_tab, self.is_new_tab);
    }
}
