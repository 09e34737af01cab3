//! # Error Types
//!
//! All error types for bytecode execution.
//!
//! Halts (`Stop`, `Return`, `Revert`) are not errors; they are reported through
//! [`crate::domain::entities::Halt`]. Everything here aborts the current frame
//! and every frame above it.

use crate::domain::value_objects::Address;
use thiserror::Error;

// =============================================================================
// VM ERRORS
// =============================================================================

/// Faults that abort a frame during execution.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VmError {
    /// Push onto a full stack.
    #[error("stack overflow")]
    StackOverflow,

    /// Pop (or DUP/SWAP read) past the bottom of the stack.
    #[error("stack underflow")]
    StackUnderflow,

    /// A store would grow memory past its ceiling.
    #[error("memory limit exceeded: {requested} > {max} bytes")]
    MemoryLimitExceeded {
        /// Memory length the store needed.
        requested: usize,
        /// Configured ceiling.
        max: usize,
    },

    /// A load touched bytes beyond the current memory length.
    #[error("memory access out of bounds: offset {offset}, size {size}")]
    MemoryOutOfBounds {
        /// Start of the read.
        offset: usize,
        /// Bytes requested.
        size: usize,
    },

    /// The frame cannot pay for the next opcode.
    #[error("out of gas: cost {cost}, remaining {remaining}")]
    OutOfGas {
        /// Price of the rejected opcode.
        cost: u64,
        /// Gas left, unchanged by the rejection.
        remaining: u64,
    },

    /// Byte is not part of the instruction set.
    #[error("unknown opcode: 0x{0:02X}")]
    UnknownOpcode(u8),

    /// CALL target is not registered.
    #[error("contract not found: {0:?}")]
    ContractNotFound(Address),

    /// PUSH immediate runs past the end of code.
    #[error("push out of bounds: pc {pc}, immediate size {size}")]
    PushOutOfBounds {
        /// Position of the PUSH opcode.
        pc: usize,
        /// Immediate width in bytes.
        size: usize,
    },

    /// Nested CALL would exceed the configured depth.
    #[error("call depth exceeded: {depth} > {max}")]
    CallDepthExceeded {
        /// Depth the refused callee would have had.
        depth: usize,
        /// Configured maximum.
        max: usize,
    },
}

impl VmError {
    /// Returns true if the fault comes from exhausting a metered resource
    /// (gas, stack slots, memory or call depth) rather than malformed code.
    #[must_use]
    pub fn is_resource_exhaustion(&self) -> bool {
        matches!(
            self,
            Self::OutOfGas { .. }
                | Self::StackOverflow
                | Self::MemoryLimitExceeded { .. }
                | Self::CallDepthExceeded { .. }
        )
    }
}

// =============================================================================
// VALUE ERRORS
// =============================================================================

/// Errors from building a [`crate::domain::value_objects::Value`] out of raw bytes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// More than 20 bytes for an address.
    #[error("address too long: {len} > 20 bytes")]
    AddressTooLong { len: usize },

    /// More than 32 bytes for an integer or hash word.
    #[error("word too long: {len} > 32 bytes")]
    WordTooLong { len: usize },
}

// =============================================================================
// CONFIG ERRORS
// =============================================================================

/// Errors from loading or validating [`crate::domain::entities::VmConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration text is not valid JSON for `VmConfig`.
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A limit that must be positive was zero.
    #[error("invalid config: {field} must be greater than zero")]
    ZeroLimit { field: &'static str },
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vm_error_display() {
        let err = VmError::OutOfGas {
            cost: 3,
            remaining: 2,
        };
        assert_eq!(err.to_string(), "out of gas: cost 3, remaining 2");

        let err = VmError::UnknownOpcode(0xFE);
        assert_eq!(err.to_string(), "unknown opcode: 0xFE");

        let err = VmError::CallDepthExceeded {
            depth: 1025,
            max: 1024,
        };
        assert_eq!(err.to_string(), "call depth exceeded: 1025 > 1024");
    }

    #[test]
    fn test_memory_and_push_error_fields() {
        let err = VmError::MemoryLimitExceeded {
            requested: 33,
            max: 32,
        };
        assert_eq!(err.to_string(), "memory limit exceeded: 33 > 32 bytes");

        let err = VmError::MemoryOutOfBounds { offset: 4, size: 2 };
        assert_eq!(err.to_string(), "memory access out of bounds: offset 4, size 2");

        let err = VmError::PushOutOfBounds { pc: 7, size: 1 };
        assert_eq!(err.to_string(), "push out of bounds: pc 7, immediate size 1");
    }

    #[test]
    fn test_resource_exhaustion() {
        assert!(VmError::StackOverflow.is_resource_exhaustion());
        assert!(VmError::OutOfGas {
            cost: 1,
            remaining: 0
        }
        .is_resource_exhaustion());
        assert!(!VmError::StackUnderflow.is_resource_exhaustion());
        assert!(!VmError::UnknownOpcode(0x0C).is_resource_exhaustion());
        assert!(!VmError::ContractNotFound(Address::ZERO).is_resource_exhaustion());
    }

    #[test]
    fn test_value_error_display() {
        let err = ValueError::AddressTooLong { len: 21 };
        assert_eq!(err.to_string(), "address too long: 21 > 20 bytes");
    }

    #[test]
    fn test_config_error_from_json() {
        let parse_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: ConfigError = parse_err.into();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().starts_with("config parse error"));
    }
}
