//! # Address Derivation Adapter
//!
//! Keccak/RLP contract address scheme used when the caller does not supply
//! its own `AddressDerivation`.

use crate::domain::services::compute_contract_address;
use crate::domain::value_objects::Address;
use crate::ports::outbound::AddressDerivation;

/// `keccak256(rlp([creator, nonce]))[12..]`.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeccakAddressDerivation;

impl AddressDerivation for KeccakAddressDerivation {
    fn derive(&self, creator: Address, nonce: u64) -> Address {
        compute_contract_address(creator, nonce)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_domain_service() {
        let creator = Address::new([0x11; 20]);
        assert_eq!(
            KeccakAddressDerivation.derive(creator, 7),
            compute_contract_address(creator, 7)
        );
    }

    #[test]
    fn test_deterministic() {
        let creator = Address::new([0x22; 20]);
        let deriver = KeccakAddressDerivation;
        assert_eq!(deriver.derive(creator, 0), deriver.derive(creator, 0));
        assert_ne!(deriver.derive(creator, 0), deriver.derive(creator, 1));
    }
}
