//! Application use cases (business logic orchestration).

mod save_request;
mod send_request;

pub use save_request::*;
pub use send_request::*;
