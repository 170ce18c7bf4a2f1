use serde::{Deserialize, Serialize};
use std::fmt;

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Identity of one connected client, stable for the lifetime of its connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(String);

impl ClientId {
    pub fn new() -> Self {
        Self(new_id())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight characters, for compact log lines.
    pub fn short(&self) -> &str {
        self.0.get(..8).unwrap_or(&self.0)
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ClientId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
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
    fn client_id_is_unique() {
        assert_ne!(ClientId::new(), ClientId::new());
    }

    #[test]
    fn client_id_display() {
        let id = ClientId::new();
        assert_eq!(id.to_string(), id.as_str());
    }

    #[test]
    fn client_id_short() {
        let id = ClientId::new();
        assert_eq!(id.short().len(), 8);
        assert!(id.as_str().starts_with(id.short()));

        let tiny = ClientId::from("abc");
        assert_eq!(tiny.short(), "abc");
    }

    #[test]
    fn client_id_serialization() {
        let id = ClientId::new();
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: ClientId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }

    #[test]
    fn client_id_hash() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        let a = ClientId::new();
        set.insert(a.clone());
        set.insert(a);
        assert_eq!(set.len(), 1);
    }
}
