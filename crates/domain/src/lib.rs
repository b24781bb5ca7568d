//! Rattle Domain - Core business types
//!
//! This crate defines the request/group model of the Rattle request store,
//! the sidebar tree derived from it and the proxy policy applied to
//! executed calls. All types here are pure Rust with no I/O dependencies.

pub mod descriptor;
pub mod document;
pub mod error;
pub mod group;
pub mod id;
pub mod proxy;
pub mod request;
pub mod response;
pub mod transcript;
pub mod tree;

pub use descriptor::{ExecutionDescriptor, MAX_REDIRECTS, ProxyRoute, REQUEST_TIMEOUT};
pub use document::{DOCUMENT_FILE_NAME, Document};
pub use error::{DomainError, DomainResult};
pub use group::{Group, GroupPatch};
pub use id::generate_id;
pub use proxy::{PROXY_SETTINGS_KEY, ProxyConfig, ProxyError, ProxyMode, TlsSecurityWarning};
pub use request::{
    HttpMethod, OrderedMap, Request, RequestPatch, SessionFlags, build_url, format_headers,
    format_json, is_valid_json, parse_headers,
};
pub use response::{Response, StatusClass, reason_phrase, status_class};
pub use transcript::console_log;
pub use tree::{FlatNode, NodeKind, NodeSource, TreeNode, build_tree, flatten};
