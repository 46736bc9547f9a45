//! Flat key/value view over a mapping node

use super::document::{Mapping, Node};

/// String values keyed by name, backed by an ordered [`Mapping`]
///
/// Lookups only see scalar values; a nested mapping under the same key is
/// treated as absent for string access but can be reached with
/// [`ConfigMap::find_entry`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigMap {
    root: Mapping,
}

impl ConfigMap {
    /// Wrap an existing mapping
    pub const fn new(root: Mapping) -> Self {
        Self { root }
    }

    /// Underlying mapping
    pub const fn root(&self) -> &Mapping {
        &self.root
    }

    /// Underlying mapping, mutably
    pub fn root_mut(&mut self) -> &mut Mapping {
        &mut self.root
    }

    /// Consume the view and hand back the mapping
    pub fn into_inner(self) -> Mapping {
        self.root
    }

    /// True when there are no entries
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Scalar value under `key`
    pub fn get_string_value(&self, key: &str) -> Option<String> {
        self.root
            .get(key)
            .and_then(Node::as_str)
            .map(ToString::to_string)
    }

    /// Set a scalar, replacing the existing node in place or appending
    pub fn set_string_value(&mut self, key: &str, value: &str) {
        self.root.insert(key, Node::scalar(value));
    }

    /// Nested mapping under `key`
    pub fn find_entry(&self, key: &str) -> Option<&Mapping> {
        match self.root.get(key) {
            Some(Node::Mapping(m)) => Some(m),
            _ => None,
        }
    }

    /// Nested mapping under `key`, mutably
    pub fn find_entry_mut(&mut self, key: &str) -> Option<&mut Mapping> {
        match self.root.get_mut(key) {
            Some(Node::Mapping(m)) => Some(m),
            _ => None,
        }
    }

    /// Remove `key`, reporting whether it was present
    pub fn remove_entry(&mut self, key: &str) -> bool {
        self.root.remove(key).is_some()
    }

    /// Scalar entries in document order
    pub fn string_entries(&self) -> Vec<(String, String)> {
        self.root
            .entries()
            .iter()
            .filter_map(|e| e.value.as_str().map(|v| (e.key.clone(), v.to_string())))
            .collect()
    }
}
