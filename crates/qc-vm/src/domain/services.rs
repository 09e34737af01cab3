//! # Domain Services
//!
//! Pure functions used by the interpreter and its default adapters.
//! These functions are deterministic and have no side effects.

use crate::domain::value_objects::{Address, Hash};
use sha3::{Digest, Keccak256};

// =============================================================================
// CONTRACT ADDRESS COMPUTATION
// =============================================================================

/// Computes a contract address from its creator and a creation nonce.
///
/// Address = keccak256(rlp(\[creator, nonce\]))\[12:\]
#[must_use]
pub fn compute_contract_address(creator: Address, nonce: u64) -> Address {
    let mut content = Vec::with_capacity(30);

    // RLP string header for 20 bytes is 0x80 + 20 = 0x94
    content.push(0x94);
    content.extend_from_slice(creator.as_bytes());

    if nonce == 0 {
        content.push(0x80);
    } else if nonce < 0x80 {
        content.push(nonce as u8);
    } else {
        let nonce_bytes = trim_leading_zeros(nonce);
        content.push(0x80 + nonce_bytes.len() as u8);
        content.extend_from_slice(&nonce_bytes);
    }

    // Content never exceeds 30 bytes, so the short list header always applies
    let mut rlp = Vec::with_capacity(content.len() + 1);
    rlp.push(0xc0 + content.len() as u8);
    rlp.extend_from_slice(&content);

    let hash = Keccak256::digest(&rlp);
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&hash[12..32]);
    Address::new(addr)
}

/// Big-endian bytes of `value` without leading zeros.
fn trim_leading_zeros(value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(7);
    bytes[start..].to_vec()
}

// =============================================================================
// KECCAK256 UTILITY
// =============================================================================

/// Computes keccak256 hash of data.
#[must_use]
pub fn keccak256(data: &[u8]) -> Hash {
    let hash = Keccak256::digest(data);
    Hash::new(hash.into())
}

// =============================================================================
// TESTS
// =============================================================================
