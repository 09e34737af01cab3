//! # Contract Registry
//!
//! Address-indexed arena of deployed contracts shared by every frame of one
//! execution. Writes are visible to all frames immediately and are not rolled
//! back when a frame reverts or faults; a driver that wants all-or-nothing
//! semantics brackets the execution with [`ContractRegistry::checkpoint`] and
//! [`ContractRegistry::restore`].

use crate::domain::services::keccak256;
use crate::domain::value_objects::{Address, Bytes, Hash};
use crate::evm::storage::Storage;
use std::collections::HashMap;

// =============================================================================
// CONTRACT
// =============================================================================

/// A deployed contract: immutable code plus mutable storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Contract {
    /// Address the contract lives at.
    pub address: Address,
    /// Bytecode.
    pub code: Bytes,
    /// Persistent storage.
    pub storage: Storage,
}

impl Contract {
    /// Creates a contract with empty storage.
    #[must_use]
    pub fn new(address: Address, code: impl Into<Bytes>) -> Self {
        Self {
            address,
            code: code.into(),
            storage: Storage::new(),
        }
    }

    /// Keccak-256 of the code.
    #[must_use]
    pub fn code_hash(&self) -> Hash {
        keccak256(self.code.as_slice())
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

/// Snapshot of a registry taken by [`ContractRegistry::checkpoint`].
#[derive(Clone, Debug)]
pub struct RegistryCheckpoint {
    contracts: HashMap<Address, Contract>,
    nonce: u64,
}

impl RegistryCheckpoint {
    /// Number of contracts captured.
    #[must_use]
    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    /// Returns true if the snapshot holds no contracts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }
}

/// All contracts reachable by CALL, plus the creation counter used by CREATE.
#[derive(Clone, Debug, Default)]
pub struct ContractRegistry {
    contracts: HashMap<Address, Contract>,
    nonce: u64,
}

impl ContractRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a contract.
    #[must_use]
    pub fn get(&self, address: &Address) -> Option<&Contract> {
        self.contracts.get(address)
    }

    /// Look up a contract for mutation.
    pub fn get_mut(&mut self, address: &Address) -> Option<&mut Contract> {
        self.contracts.get_mut(address)
    }

    /// Register a contract at `address`, returning any contract it replaces.
    pub fn insert(&mut self, address: Address, contract: Contract) -> Option<Contract> {
        self.contracts.insert(address, contract)
    }

    /// Returns true if a contract exists at `address`.
    #[must_use]
    pub fn contains(&self, address: &Address) -> bool {
        self.contracts.contains_key(address)
    }

    /// Number of registered contracts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    /// Returns true if no contracts are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    /// Current creation counter.
    #[must_use]
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Return the creation counter and advance it.
    pub fn next_nonce(&mut self) -> u64 {
        let nonce = self.nonce;
        self.nonce = self.nonce.wrapping_add(1);
        nonce
    }

    /// Capture the full registry state.
    #[must_use]
    pub fn checkpoint(&self) -> RegistryCheckpoint {
        RegistryCheckpoint {
            contracts: self.contracts.clone(),
            nonce: self.nonce,
        }
    }

    /// Discard every change made since `checkpoint` was taken.
    pub fn restore(&mut self, checkpoint: RegistryCheckpoint) {
        self.contracts = checkpoint.contracts;
        self.nonce = checkpoint.nonce;
    }

    /// Iterate registered contracts in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&Address, &Contract)> {
        self.contracts.iter()
    }
}

// =============================================================================
// TESTS
// =============================================================================
