use std::collections::HashMap;

use crate::types::{CapabilityKind, McpError};

/// Insertion-ordered table of capabilities keyed by name (or URI).
///
/// Keys are unique; lookups are O(1) and iteration follows registration
/// order.
#[derive(Debug)]
pub struct Registry<T> {
    kind: CapabilityKind,
    entries: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T> Registry<T> {
    pub fn new(kind: CapabilityKind) -> Self {
        Registry {
            kind,
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Add an entry. Fails with `Duplicate` if `key` is already registered.
    pub fn insert(&mut self, key: impl Into<String>, entry: T) -> Result<(), McpError> {
        let key = key.into();
        if self.index.contains_key(&key) {
            return Err(McpError::Duplicate {
                kind: self.kind,
                name: key,
            });
        }
        self.index.insert(key, self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.index.get(key).map(|&i| &self.entries[i])
    }

    /// Like [`get`](Self::get) but reports a missing key as `NotFound`.
    pub fn lookup(&self, key: &str) -> Result<&T, McpError> {
        self.get(key)
            .ok_or_else(|| McpError::not_found(self.kind, key))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preserves_insertion_order() {
        let mut reg = Registry::new(CapabilityKind::Tool);
        for name in ["zeta", "alpha", "mid"] {
            reg.insert(name, name.to_uppercase()).unwrap();
        }
        let listed: Vec<&str> = reg.iter().map(String::as_str).collect();
        assert_eq!(listed, vec!["ZETA", "ALPHA", "MID"]);
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut reg = Registry::new(CapabilityKind::Prompt);
        reg.insert("greet", 1).unwrap();
        let err = reg.insert("greet", 2).unwrap_err();
        assert!(matches!(err, McpError::Duplicate { kind: CapabilityKind::Prompt, .. }));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get("greet"), Some(&1));
    }

    #[test]
    fn test_lookup_missing() {
        let reg: Registry<u8> = Registry::new(CapabilityKind::Resource);
        let err = reg.lookup("demo://nope").unwrap_err();
        assert_eq!(err.to_string(), "Unknown resource: demo://nope");
        assert!(reg.is_empty());
    }
}
