//! # QC-VM - Metered Bytecode Interpreter
//!
//! **Status:** Core complete
//!
//! ## Purpose
//!
//! Executes contract bytecode on a 1024-slot stack machine with frame-local
//! byte memory, per-contract persistent storage and fixed per-opcode gas.
//! Contracts can CREATE new contracts and CALL each other through a shared
//! registry, with each nested frame running on its own gas budget.
//!
//! ## Execution Model
//!
//! | Concern | Behavior |
//! |---------|----------|
//! | Arithmetic | 256-bit, wrapping; DIV by zero yields 0 |
//! | Gas | Charged once per opcode before any effect; rejection mutates nothing |
//! | Memory | Grows on store to exactly the written end; loads never grow it |
//! | Storage | Absent keys read as zero; values keep their kind |
//! | CALL | Callee gas is its own budget; faults propagate to the root |
//! | Nesting | Frames live on a heap call stack, not the host stack |
//! | Revert | A halt, not a fault; the callee's logs are dropped |
//! | Effects | Not rolled back by the interpreter; see `Executor::execute_atomic` |
//!
//! ### Safety Limits
//!
//! | Limit | Default | Error |
//! |-------|---------|-------|
//! | `max_stack_size` | 1024 | `StackOverflow` |
//! | `max_memory_size` | 32 MiB | `MemoryLimitExceeded` |
//! | `max_call_depth` | 1024 | `CallDepthExceeded` |
//!
//! ## Outbound Dependencies
//!
//! | Trait | Purpose | Default adapter |
//! |-------|---------|-----------------|
//! | `AddressDerivation` | Address of CREATE'd contracts | `KeccakAddressDerivation` |
//!
//! ## Components
//!
//! | Component | Location | Purpose |
//! |-----------|----------|---------|
//! | Interpreter | `evm/interpreter.rs` | Fetch/decode/execute loop |
//! | Nested calls | `evm/call.rs` | CALL and CREATE |
//! | Stack | `evm/stack.rs` | 1024-item stack |
//! | Memory | `evm/memory.rs` | Byte memory |
//! | Gas | `evm/gas.rs` | Cost table and meter |
//! | Registry | `evm/registry.rs` | Contracts shared by all frames |
//! | Executor | `executor.rs` | Top-level driver |
//!
//! ## Usage Example
//!
//! ```
//! use qc_vm::prelude::*;
//!
//! let mut executor = Executor::new(VmConfig::default());
//!
//! // SSTORE key 1 = 42, then RETURN the first two input bytes
//! let code = vec![0x60, 0x01, 0x60, 0x2a, 0x55, 0x60, 0x00, 0x60, 0x02, 0xF3];
//! let contract = Contract::new(Address::new([7u8; 20]), code);
//! let context = Context::new(Address::ZERO, 50_000);
//!
//! let outcome = executor.execute_with_input(contract, &context, &[0xbe, 0xef]);
//!
//! assert_eq!(outcome.output(), &[0xbe, 0xef]);
//! assert_eq!(outcome.storage.sload(&StorageKey::from_u256(U256::one())), Value::from(42u64));
//! ```

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod domain;
pub mod errors;
pub mod evm;
pub mod executor;
pub mod ports;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    // Domain entities
    pub use crate::domain::entities::{Context, Halt, Log, VmConfig};

    // Value objects
    pub use crate::domain::value_objects::{
        Address, Bytes, Hash, StorageKey, Value, ValueKind, U256,
    };

    // Domain services
    pub use crate::domain::services::{compute_contract_address, keccak256};

    // Ports
    pub use crate::ports::outbound::AddressDerivation;

    // Errors
    pub use crate::errors::{ConfigError, ValueError, VmError};

    // VM components
    pub use crate::evm::{
        gas::{self, GasMeter},
        memory::Memory,
        opcodes::Opcode,
        registry::{Contract, ContractRegistry, RegistryCheckpoint},
        stack::Stack,
        storage::Storage,
        FrameEnv, FrameState, Interpreter,
    };

    // Adapters
    pub use crate::adapters::KeccakAddressDerivation;

    // Driver
    pub use crate::executor::{ExecutionOutcome, ExecutionStatus, Executor};
}

// =============================================================================
// CRATE INFO
// =============================================================================

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = "QC-VM";

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_prelude_exports() {
        // Verify prelude exports compile
        use prelude::*;
        let _ = VmConfig::default();
        let _ = Address::ZERO;
        let _ = Executor::default();
        assert_eq!(Opcode::Call.gas_cost(), gas::costs::CALL);
    }
}
