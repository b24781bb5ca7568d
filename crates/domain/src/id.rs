//! ID generation utilities.

use uuid::Uuid;

/// Generates a new entity id.
///
/// The id is a UUID v7: a millisecond timestamp followed by random bits.
/// Ids generated within one process are unique and sort in creation order.
#[must_use]
pub fn generate_id() -> String {
    Uuid::now_v7().to_string()
}
