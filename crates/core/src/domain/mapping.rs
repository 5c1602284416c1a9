use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Source pull request number -> upstream pull request number.
///
/// Entries are created when an upstream PR is opened, removed when it is
/// merged, and left alone on close/reopen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrMapping(BTreeMap<String, u64>);

impl PrMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, source_pr: &str) -> Option<u64> {
        self.0.get(source_pr).copied()
    }

    pub fn insert(&mut self, source_pr: impl Into<String>, upstream_pr: u64) -> Option<u64> {
        self.0.insert(source_pr.into(), upstream_pr)
    }

    pub fn remove(&mut self, source_pr: &str) -> Option<u64> {
        self.0.remove(source_pr)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape_is_a_plain_object() {
        let mut mapping = PrMapping::new();
        mapping.insert("19623", 8123);
        let json = serde_json::to_string(&mapping).unwrap();
        assert_eq!(json, r#"{"19623":8123}"#);

        let parsed: PrMapping = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.get("19623"), Some(8123));
    }

    #[test]
    fn test_insert_and_remove() {
        let mut mapping = PrMapping::new();
        assert!(mapping.is_empty());
        assert_eq!(mapping.insert("1", 10), None);
        assert_eq!(mapping.get("1"), Some(10));
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping.remove("1"), Some(10));
        assert_eq!(mapping.get("1"), None);
    }
}
