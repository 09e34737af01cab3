//! # Core Domain Entities
//!
//! Main business entities for bytecode execution.

use crate::domain::value_objects::{Address, Bytes, Hash, U256};
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};

// =============================================================================
// CONTEXT
// =============================================================================

/// Read-only environment parameters shared by every frame of one execution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    /// Block number.
    pub block_number: U256,
    /// Block timestamp (unix seconds).
    pub timestamp: U256,
    /// Account that started the execution.
    pub sender: Address,
    /// Gas budget of the root frame.
    pub gas_limit: u64,
    /// Gas price.
    pub gas_price: U256,
}

impl Context {
    /// Creates a context with the given sender and root gas budget.
    #[must_use]
    pub fn new(sender: Address, gas_limit: u64) -> Self {
        Self {
            sender,
            gas_limit,
            ..Self::default()
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self {
            block_number: U256::one(),
            timestamp: U256::one(),
            sender: Address::ZERO,
            gas_limit: 1_000_000,
            gas_price: U256::one(),
        }
    }
}

// =============================================================================
// LOG (EVENT)
// =============================================================================

/// Emitted log (event) from contract execution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    /// Contract address that emitted the log.
    pub address: Address,
    /// Topics in pop order.
    pub topics: Vec<Hash>,
    /// Non-indexed data.
    pub data: Bytes,
}

impl Log {
    /// Creates a new log.
    #[must_use]
    pub fn new(address: Address, topics: Vec<Hash>, data: Bytes) -> Self {
        Self {
            address,
            topics,
            data,
        }
    }
}

// =============================================================================
// HALT
// =============================================================================

/// Non-faulting terminal state of a frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Halt {
    /// STOP, or the program counter ran off the end of code.
    Stop,
    /// RETURN with its payload.
    Return(Bytes),
    /// REVERT with its payload.
    Revert(Bytes),
}

impl Halt {
    /// Payload carried by the halt (empty for `Stop`).
    #[must_use]
    pub fn data(&self) -> &[u8] {
        match self {
            Self::Stop => &[],
            Self::Return(data) | Self::Revert(data) => data.as_slice(),
        }
    }

    /// Returns true for `Revert`.
    #[must_use]
    pub fn is_revert(&self) -> bool {
        matches!(self, Self::Revert(_))
    }
}

// =============================================================================
// VM CONFIGURATION
// =============================================================================

/// Virtual Machine configuration.
///
/// Missing fields take their defaults when loaded from JSON.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmConfig {
    /// Maximum nesting of CALL frames below the root (default: 1024).
    pub max_call_depth: usize,
    /// Maximum stack size (default: 1024).
    pub max_stack_size: usize,
    /// Maximum memory size in bytes (default: 32 MiB).
    pub max_memory_size: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            max_call_depth: 1024,
            max_stack_size: 1024,
            max_memory_size: 32 * 1024 * 1024,
        }
    }
}

impl VmConfig {
    /// Parses and validates a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns `Parse` for malformed JSON and `ZeroLimit` if any limit is zero.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every limit is positive.
    ///
    /// # Errors
    ///
    /// Returns `ZeroLimit` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_call_depth == 0 {
            return Err(ConfigError::ZeroLimit {
                field: "max_call_depth",
            });
        }
        if self.max_stack_size == 0 {
            return Err(ConfigError::ZeroLimit {
                field: "max_stack_size",
            });
        }
        if self.max_memory_size == 0 {
            return Err(ConfigError::ZeroLimit {
                field: "max_memory_size",
            });
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vm_config_defaults() {
        let config = VmConfig::default();
        assert_eq!(config.max_call_depth, 1024);
        assert_eq!(config.max_stack_size, 1024);
        assert_eq!(config.max_memory_size, 32 * 1024 * 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_vm_config_from_partial_json() {
        let config = VmConfig::from_json(r#"{ "max_call_depth": 8 }"#).unwrap();
        assert_eq!(config.max_call_depth, 8);
        assert_eq!(config.max_stack_size, 1024);
    }

    #[test]
    fn test_vm_config_rejects_zero_limit() {
        let err = VmConfig::from_json(r#"{ "max_stack_size": 0 }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ZeroLimit {
                field: "max_stack_size"
            }
        ));
    }

    #[test]
    fn test_vm_config_rejects_malformed_json() {
        let err = VmConfig::from_json("{ max_call_depth: }").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_context_new() {
        let sender = Address::new([9u8; 20]);
        let ctx = Context::new(sender, 500);
        assert_eq!(ctx.sender, sender);
        assert_eq!(ctx.gas_limit, 500);
        assert_eq!(ctx.block_number, U256::one());
    }

    #[test]
    fn test_halt_data() {
        assert!(Halt::Stop.data().is_empty());
        let halt = Halt::Revert(Bytes::from_slice(&[1, 2]));
        assert_eq!(halt.data(), &[1, 2]);
        assert!(halt.is_revert());
        assert!(!Halt::Return(Bytes::new()).is_revert());
    }
}
