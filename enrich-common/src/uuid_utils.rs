//! UUID utilities

use uuid::Uuid;

/// Generate a new UUIDv4
pub fn generate() -> Uuid {
    Uuid::new_v4()
}

/// Parse UUID from string, treating malformed input as an unknown id
pub fn parse(s: &str) -> crate::Result<Uuid> {
    Uuid::parse_str(s).map_err(|_| crate::Error::NotFound(format!("Invalid id: {}", s)))
}
