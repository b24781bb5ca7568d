//! HTTP Request domain types

mod method;
mod model;
mod text;

pub use method::HttpMethod;
pub use model::{OrderedMap, Request, RequestPatch, SessionFlags};
pub use text::{build_url, format_headers, format_json, is_valid_json, parse_headers};
