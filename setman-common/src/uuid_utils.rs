//! UUID utilities

use crate::{Code, Error, Result};
use uuid::Uuid;

/// Generate a new UUIDv4
pub fn generate() -> Uuid {
    Uuid::new_v4()
}

/// Parse a UUID column value, mapping failures into the catalog taxonomy
pub fn parse(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s)
        .map_err(|e| Error::with_message(Code::ParseFailed, format!("Invalid UUID '{}': {}", s, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_unique() {
        assert_ne!(generate(), generate());
    }

    #[test]
    fn test_parse_roundtrip_and_failure() {
        let id = generate();
        assert_eq!(parse(&id.to_string()).unwrap(), id);

        let err = parse("not-a-uuid").unwrap_err();
        assert_eq!(err.code(), Code::ParseFailed);
    }
}
