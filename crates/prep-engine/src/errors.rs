//! Aggregation of the domain conditions raised during one computation.

use prep_core::codes::{ErrorCode, ErrorMessage, ErrorRegistry};
use prep_core::errors::PrepError;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Raised domain errors keyed by code, kept in first-raise order.
///
/// Raising a code that is already present replaces its message in place,
/// so the map never holds duplicates and merged sub-results cannot shuffle
/// the order of earlier entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorMap {
    entries: Vec<(ErrorCode, ErrorMessage)>,
}

impl ErrorMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets every raised entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Records `code` with the message registered for it.
    ///
    /// A code missing from the registry is a defect in the calculator and
    /// is returned as [`PrepError::Registry`].
    pub fn raise(&mut self, code: ErrorCode, registry: &ErrorRegistry) -> Result<(), PrepError> {
        let message = registry.lookup(code)?.clone();
        self.insert(code, message);
        Ok(())
    }

    /// Records `code` with an explicit message.
    pub fn insert(&mut self, code: ErrorCode, message: ErrorMessage) {
        match self.entries.iter_mut().find(|(existing, _)| *existing == code) {
            Some(entry) => entry.1 = message,
            None => self.entries.push((code, message)),
        }
    }

    /// Copies every entry of `other` into this map, last write wins.
    pub fn merge(&mut self, other: &ErrorMap) {
        for (code, message) in &other.entries {
            self.insert(*code, message.clone());
        }
    }

    /// Iterates over the entries in first-raise order.
    pub fn iter(&self) -> impl Iterator<Item = (ErrorCode, &ErrorMessage)> {
        self.entries.iter().map(|(code, message)| (*code, message))
    }

    /// Returns the message for `code`, if raised.
    pub fn get(&self, code: ErrorCode) -> Option<&ErrorMessage> {
        self.entries
            .iter()
            .find(|(existing, _)| *existing == code)
            .map(|(_, message)| message)
    }

    /// Returns `true` when `code` has been raised.
    pub fn contains(&self, code: ErrorCode) -> bool {
        self.get(code).is_some()
    }

    /// Raised codes in first-raise order.
    pub fn codes(&self) -> Vec<ErrorCode> {
        self.entries.iter().map(|(code, _)| *code).collect()
    }

    /// Number of raised entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing has been raised.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for ErrorMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (code, message) in &self.entries {
            map.serialize_entry(code.as_str(), message)?;
        }
        map.end()
    }
}
