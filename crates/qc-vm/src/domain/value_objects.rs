//! # Value Objects
//!
//! Immutable domain primitives for bytecode execution.
//! These types represent concepts that are defined by their value, not identity.

use crate::errors::ValueError;
use serde::{Deserialize, Serialize};
use std::fmt;

// Re-export U256 from primitive-types for 256-bit arithmetic
pub use primitive_types::U256;

// =============================================================================
// ADDRESS (20 bytes)
// =============================================================================

/// A 20-byte contract address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The zero address (0x0000...0000).
    pub const ZERO: Self = Self([0u8; 20]);

    /// Creates an address from a 20-byte array.
    #[must_use]
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Creates an address from a slice. Returns None if wrong length.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() == 20 {
            let mut bytes = [0u8; 20];
            bytes.copy_from_slice(slice);
            Some(Self(bytes))
        } else {
            None
        }
    }

    /// Takes the low 20 bytes of a stack word.
    #[must_use]
    pub fn from_word(word: U256) -> Self {
        let mut bytes = [0u8; 32];
        word.to_big_endian(&mut bytes);
        let mut addr = [0u8; 20];
        addr.copy_from_slice(&bytes[12..32]);
        Self(addr)
    }

    /// Widens the address into a stack word.
    #[must_use]
    pub fn to_word(&self) -> U256 {
        U256::from_big_endian(&self.0)
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Returns true if this is the zero address.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in &self.0[..4] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, "...")?;
        for byte in &self.0[18..] {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl From<Address> for [u8; 20] {
    fn from(addr: Address) -> Self {
        addr.0
    }
}

// =============================================================================
// HASH (32 bytes)
// =============================================================================

/// A 32-byte hash, also used for log topics.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Hash(pub [u8; 32]);

impl Hash {
    /// The zero hash.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Creates a hash from a 32-byte array.
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Big-endian encoding of a stack word.
    #[must_use]
    pub fn from_word(word: U256) -> Self {
        let mut bytes = [0u8; 32];
        word.to_big_endian(&mut bytes);
        Self(bytes)
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Returns true if this is the zero hash.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in &self.0[..4] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, "...")?;
        for byte in &self.0[28..] {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl From<[u8; 32]> for Hash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

// =============================================================================
// STORAGE KEY (32 bytes)
// =============================================================================

/// Canonical storage slot key: the 32-byte big-endian encoding of the key word.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct StorageKey(pub [u8; 32]);

impl StorageKey {
    /// The zero key.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Creates a storage key from a U256.
    #[must_use]
    pub fn from_u256(value: U256) -> Self {
        let mut bytes = [0u8; 32];
        value.to_big_endian(&mut bytes);
        Self(bytes)
    }

    /// Converts back to the key word.
    #[must_use]
    pub fn to_u256(&self) -> U256 {
        U256::from_big_endian(&self.0)
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StorageKey({})", self.to_u256())
    }
}

impl From<U256> for StorageKey {
    fn from(value: U256) -> Self {
        Self::from_u256(value)
    }
}

// =============================================================================
// BYTES (variable length)
// =============================================================================

/// Variable-length byte vector for code, call data, return data and log data.
#[derive(Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Bytes(pub Vec<u8>);

impl Bytes {
    /// Creates an empty Bytes.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Creates Bytes from a vector.
    #[must_use]
    pub fn from_vec(vec: Vec<u8>) -> Self {
        Self(vec)
    }

    /// Creates Bytes from a slice.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Self {
        Self(slice.to_vec())
    }

    /// Returns the underlying vector.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }

    /// Returns a reference to the underlying slice.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Returns the length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Bytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        if self.0.len() <= 8 {
            for byte in &self.0 {
                write!(f, "{byte:02x}")?;
            }
        } else {
            for byte in &self.0[..4] {
                write!(f, "{byte:02x}")?;
            }
            write!(f, "..({} bytes)", self.0.len())?;
        }
        Ok(())
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(vec: Vec<u8>) -> Self {
        Self(vec)
    }
}

impl From<&[u8]> for Bytes {
    fn from(slice: &[u8]) -> Self {
        Self(slice.to_vec())
    }
}

impl AsRef<[u8]> for Bytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

// =============================================================================
// VALUE (tagged stack word)
// =============================================================================

/// What a stack word represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ValueKind {
    /// Plain 256-bit unsigned integer.
    #[default]
    Integer,
    /// 160-bit contract address.
    Address,
    /// 32-byte hash.
    Hash32,
}

/// A typed stack word.
///
/// ## Invariants
/// - `word` fits in 160 bits when `kind` is `Address`
///
/// Equality compares the kind too; use [`Value::word`] to compare magnitudes only.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Value {
    kind: ValueKind,
    word: U256,
}

impl Value {
    /// Integer zero, also the default storage value.
    pub const ZERO: Self = Self {
        kind: ValueKind::Integer,
        word: U256([0; 4]),
    };

    /// Creates an integer value.
    #[must_use]
    pub const fn integer(word: U256) -> Self {
        Self {
            kind: ValueKind::Integer,
            word,
        }
    }

    /// Creates an address value.
    #[must_use]
    pub fn address(address: Address) -> Self {
        Self {
            kind: ValueKind::Address,
            word: address.to_word(),
        }
    }

    /// Creates a hash value.
    #[must_use]
    pub fn from_hash(hash: Hash) -> Self {
        Self {
            kind: ValueKind::Hash32,
            word: U256::from_big_endian(hash.as_bytes()),
        }
    }

    /// Integer 1 for true, 0 for false.
    #[must_use]
    pub fn from_bool(flag: bool) -> Self {
        if flag {
            Self::integer(U256::one())
        } else {
            Self::ZERO
        }
    }

    /// Builds a value of `kind` from big-endian bytes, rejecting inputs wider
    /// than the kind allows.
    ///
    /// # Errors
    ///
    /// Returns `AddressTooLong` for more than 20 address bytes and
    /// `WordTooLong` for more than 32 integer/hash bytes.
    pub fn from_be_bytes(kind: ValueKind, bytes: &[u8]) -> Result<Self, ValueError> {
        match kind {
            ValueKind::Address if bytes.len() > 20 => {
                Err(ValueError::AddressTooLong { len: bytes.len() })
            }
            _ if bytes.len() > 32 => Err(ValueError::WordTooLong { len: bytes.len() }),
            _ => Ok(Self {
                kind,
                word: U256::from_big_endian(bytes),
            }),
        }
    }

    /// Returns the kind tag.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Returns the magnitude.
    #[must_use]
    pub const fn word(&self) -> U256 {
        self.word
    }

    /// Returns true if the magnitude is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.word.is_zero()
    }

    /// Interprets the value as an address (low 20 bytes).
    #[must_use]
    pub fn as_address(&self) -> Address {
        Address::from_word(self.word)
    }

    /// Converts the magnitude into a host offset/size, `None` if it does not fit.
    #[must_use]
    pub fn as_usize(&self) -> Option<usize> {
        if self.word > U256::from(usize::MAX) {
            None
        } else {
            Some(self.word.as_usize())
        }
    }

    /// Converts the magnitude into a `u64`, saturating at `u64::MAX`.
    #[must_use]
    pub fn as_u64_saturating(&self) -> u64 {
        if self.word > U256::from(u64::MAX) {
            u64::MAX
        } else {
            self.word.as_u64()
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ValueKind::Integer => write!(f, "{}", self.word),
            ValueKind::Address => write!(f, "{:?}", self.as_address()),
            ValueKind::Hash32 => write!(f, "{:?}", Hash::from_word(self.word)),
        }
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Self::integer(U256::from(value))
    }
}

impl From<U256> for Value {
    fn from(word: U256) -> Self {
        Self::integer(word)
    }
}

impl From<Address> for Value {
    fn from(address: Address) -> Self {
        Self::address(address)
    }
}

// =============================================================================
// TESTS
// =============================================================================
