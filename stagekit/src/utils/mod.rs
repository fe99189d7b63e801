//! Small shared helpers.

pub mod timestamps;

pub use timestamps::{format_timestamp, iso_timestamp, Timestamp};

use uuid::Uuid;

/// Generates a new random stage UUID.
#[must_use]
pub fn generate_uuid() -> Uuid {
    Uuid::new_v4()
}

/// Parses a stored UUID string, returning `None` for empty or malformed input.
#[must_use]
pub fn parse_uuid(value: &str) -> Option<Uuid> {
    if value.is_empty() {
        return None;
    }
    Uuid::parse_str(value).ok()
}
