//! # Contract Storage
//!
//! Persistent key/value store of a single contract.
//! Keys are canonical 32-byte big-endian words; values keep their kind.

use crate::domain::value_objects::{StorageKey, Value};
use std::collections::BTreeMap;

/// Storage of one contract.
///
/// Absent keys read as [`Value::ZERO`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Storage {
    slots: BTreeMap<StorageKey, Value>,
}

impl Storage {
    /// Creates an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: BTreeMap::new(),
        }
    }

    /// Load a value (SLOAD).
    #[must_use]
    pub fn sload(&self, key: &StorageKey) -> Value {
        self.slots.get(key).copied().unwrap_or(Value::ZERO)
    }

    /// Store a value (SSTORE), overwriting unconditionally.
    pub fn sstore(&mut self, key: StorageKey, value: Value) {
        self.slots.insert(key, value);
    }

    /// Number of written slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if nothing was ever written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Iterate written slots in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&StorageKey, &Value)> {
        self.slots.iter()
    }
}

// =============================================================================
// TESTS
// =============================================================================
