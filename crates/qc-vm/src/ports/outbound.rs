//! # Driven Ports (SPI - Outbound)
//!
//! Interfaces the interpreter calls out to. Callers plug in concrete
//! implementations; see `crate::adapters` for the defaults.

use crate::domain::value_objects::Address;

// =============================================================================
// ADDRESS DERIVATION
// =============================================================================

/// Derives the address of a contract created by CREATE.
///
/// Implementations must be pure: the same `(creator, nonce)` always yields
/// the same address, and distinct inputs should practically never collide.
/// The registry does not check for collisions; a colliding CREATE replaces
/// the existing contract.
pub trait AddressDerivation {
    /// Returns the address for the `nonce`-th creation performed through the
    /// registry, requested by `creator`.
    fn derive(&self, creator: Address, nonce: u64) -> Address;
}

impl<F> AddressDerivation for F
where
    F: Fn(Address, u64) -> Address,
{
    fn derive(&self, creator: Address, nonce: u64) -> Address {
        self(creator, nonce)
    }
}

// =============================================================================
// TESTS
// =============================================================================
