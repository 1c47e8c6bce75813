use serde::{Deserialize, Serialize};
use std::fmt;

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub fn new_correlation_id() -> String {
    let uuid = uuid::Uuid::new_v4();
    let bytes = uuid.as_bytes();
    format!(
        "{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3]
    )
}

/// Identifier for a single test attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttemptId(String);

impl AttemptId {
    pub fn new() -> Self {
        Self(new_id())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AttemptId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_id_is_valid_uuid() {
        let id = new_id();
        let parsed = uuid::Uuid::parse_str(&id);
        assert!(parsed.is_ok());
        assert_eq!(parsed.unwrap().get_version_num(), 4);
    }

    #[test]
    fn new_id_is_unique() {
        let a = new_id();
        let b = new_id();
        assert_ne!(a, b);
    }

    #[test]
    fn correlation_id_length() {
        let cid = new_correlation_id();
        assert_eq!(cid.len(), 8);
    }

    #[test]
    fn correlation_id_is_hex() {
        let cid = new_correlation_id();
        assert!(cid.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn attempt_id_new() {
        let aid = AttemptId::new();
        let parsed = uuid::Uuid::parse_str(aid.as_str());
        assert!(parsed.is_ok());
    }

    #[test]
    fn attempt_id_display() {
        let aid = AttemptId::new();
        assert_eq!(aid.to_string(), aid.as_str());
    }

    #[test]
    fn attempt_id_default_is_nonempty() {
        let aid = AttemptId::default();
        assert!(!aid.as_str().is_empty());
    }

    #[test]
    fn attempt_id_equality_and_hash() {
        use std::collections::HashSet;
        let a = AttemptId::new();
        let b = a.clone();
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        set.insert(b);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn attempt_id_serialization() {
        let aid = AttemptId::new();
        let json = serde_json::to_string(&aid).unwrap();
        let deserialized: AttemptId = serde_json::from_str(&json).unwrap();
        assert_eq!(aid, deserialized);
    }
}
