//! # Executor
//!
//! Top-level driver: registers a contract, runs its root frame against a
//! [`Context`] and reports an [`ExecutionOutcome`]. Faults are reported in
//! the outcome, never raised.
//!
//! ## Usage
//!
//! ```
//! use qc_vm::prelude::*;
//!
//! let address = Address::new([1u8; 20]);
//! let contract = Contract::new(address, vec![0x60, 0x0a, 0x60, 0x14, 0x01, 0x00]);
//!
//! let mut executor = Executor::new(VmConfig::default());
//! let outcome = executor.execute(contract, &Context::new(Address::ZERO, 100));
//!
//! assert!(outcome.is_success());
//! assert_eq!(outcome.gas_used, 9);
//! assert_eq!(outcome.stack, vec![Value::from(30u64)]);
//! ```

use crate::adapters::KeccakAddressDerivation;
use crate::domain::entities::{Context, Halt, Log, VmConfig};
use crate::domain::value_objects::{Bytes, Value};
use crate::errors::VmError;
use crate::evm::interpreter::{Frame, FrameEnv, Interpreter};
use crate::evm::registry::{Contract, ContractRegistry};
use crate::evm::storage::Storage;
use crate::ports::outbound::AddressDerivation;
use tracing::{debug, instrument, warn};

// =============================================================================
// OUTCOME
// =============================================================================

/// How the root frame terminated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExecutionStatus {
    /// STOP or end of code.
    Stopped,
    /// RETURN with its payload.
    Returned(Bytes),
    /// REVERT with its payload.
    Reverted(Bytes),
    /// Aborted by a fault in the root frame or any nested frame.
    Faulted(VmError),
}

impl From<Halt> for ExecutionStatus {
    fn from(halt: Halt) -> Self {
        match halt {
            Halt::Stop => Self::Stopped,
            Halt::Return(data) => Self::Returned(data),
            Halt::Revert(data) => Self::Reverted(data),
        }
    }
}

/// Result of one top-level execution, with snapshots of the root frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// Terminal status.
    pub status: ExecutionStatus,
    /// Gas consumed by the root frame.
    pub gas_used: u64,
    /// Gas left in the root frame.
    pub gas_remaining: u64,
    /// Logs of the root frame and its successful nested calls.
    /// Empty when the root frame reverted or faulted.
    pub logs: Vec<Log>,
    /// Root frame `return_data` at termination.
    pub return_data: Bytes,
    /// Root stack, bottom first.
    pub stack: Vec<Value>,
    /// Root memory.
    pub memory: Bytes,
    /// Storage of the root contract.
    pub storage: Storage,
}

impl ExecutionOutcome {
    /// Returns true for `Stopped` and `Returned`.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(
            self.status,
            ExecutionStatus::Stopped | ExecutionStatus::Returned(_)
        )
    }

    /// RETURN or REVERT payload; empty otherwise.
    #[must_use]
    pub fn output(&self) -> &[u8] {
        match &self.status {
            ExecutionStatus::Returned(data) | ExecutionStatus::Reverted(data) => data.as_slice(),
            ExecutionStatus::Stopped | ExecutionStatus::Faulted(_) => &[],
        }
    }

    /// The fault, if the execution faulted.
    #[must_use]
    pub fn error(&self) -> Option<&VmError> {
        match &self.status {
            ExecutionStatus::Faulted(err) => Some(err),
            _ => None,
        }
    }

    fn faulted_before_start(error: VmError, gas_limit: u64) -> Self {
        Self {
            status: ExecutionStatus::Faulted(error),
            gas_used: 0,
            gas_remaining: gas_limit,
            logs: Vec::new(),
            return_data: Bytes::new(),
            stack: Vec::new(),
            memory: Bytes::new(),
            storage: Storage::new(),
        }
    }
}

// =============================================================================
// EXECUTOR
// =============================================================================

/// Owns the registry and runs root frames against it.
///
/// Registry changes persist across executions. Use
/// [`Executor::execute_atomic`] to discard the effects of a reverted or
/// faulted execution.
#[derive(Debug)]
pub struct Executor<D: AddressDerivation = KeccakAddressDerivation> {
    config: VmConfig,
    registry: ContractRegistry,
    deriver: D,
}

impl Executor {
    /// Creates an executor with the default address derivation.
    #[must_use]
    pub fn new(config: VmConfig) -> Self {
        Self::with_deriver(config, KeccakAddressDerivation)
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new(VmConfig::default())
    }
}

impl<D: AddressDerivation> Executor<D> {
    /// Creates an executor with a custom address derivation.
    #[must_use]
    pub fn with_deriver(config: VmConfig, deriver: D) -> Self {
        Self {
            config,
            registry: ContractRegistry::new(),
            deriver,
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    /// Registered contracts.
    #[must_use]
    pub fn registry(&self) -> &ContractRegistry {
        &self.registry
    }

    /// Registered contracts, for seeding callees before an execution.
    pub fn registry_mut(&mut self) -> &mut ContractRegistry {
        &mut self.registry
    }

    /// Register a contract without running it.
    pub fn deploy(&mut self, contract: Contract) {
        self.registry.insert(contract.address, contract);
    }

    /// Register `contract` (replacing any contract at its address) and run it
    /// with `context.gas_limit` gas.
    pub fn execute(&mut self, contract: Contract, context: &Context) -> ExecutionOutcome {
        self.execute_with_input(contract, context, &[])
    }

    /// Like [`Executor::execute`], with `input` preloaded into root memory at
    /// offset 0.
    #[instrument(
        skip_all,
        fields(contract = %contract.address, gas_limit = context.gas_limit, input_len = input.len())
    )]
    pub fn execute_with_input(
        &mut self,
        contract: Contract,
        context: &Context,
        input: &[u8],
    ) -> ExecutionOutcome {
        let address = contract.address;
        self.registry.insert(address, contract);

        let env = FrameEnv::new(&mut self.registry, context, &self.config, &self.deriver);
        let mut frame = match Interpreter::new(env, address, context.gas_limit) {
            Ok(frame) => frame,
            Err(err) => return ExecutionOutcome::faulted_before_start(err, context.gas_limit),
        };

        let result = frame.load_input(input).and_then(|()| frame.run());

        let Frame {
            stack,
            memory,
            gas,
            logs,
            return_data,
            ..
        } = frame.root;

        let (status, logs) = match result {
            Ok(halt) => {
                let keep_logs = !halt.is_revert();
                let status = ExecutionStatus::from(halt);
                (status, if keep_logs { logs } else { Vec::new() })
            }
            Err(err) => {
                warn!(error = %err, gas_used = gas.used(), "execution faulted");
                (ExecutionStatus::Faulted(err), Vec::new())
            }
        };

        let storage = self
            .registry
            .get(&address)
            .map(|contract| contract.storage.clone())
            .unwrap_or_default();

        debug!(?status, gas_used = gas.used(), logs = logs.len(), "execution finished");

        ExecutionOutcome {
            status,
            gas_used: gas.used(),
            gas_remaining: gas.remaining(),
            logs,
            return_data,
            stack: stack.into_vec(),
            memory: Bytes::from_vec(memory.into_vec()),
            storage,
        }
    }

    /// Run like [`Executor::execute`], restoring the registry to its prior
    /// state if the root frame reverts or faults.
    pub fn execute_atomic(&mut self, contract: Contract, context: &Context) -> ExecutionOutcome {
        self.execute_atomic_with_input(contract, context, &[])
    }

    /// Atomic variant of [`Executor::execute_with_input`].
    pub fn execute_atomic_with_input(
        &mut self,
        contract: Contract,
        context: &Context,
        input: &[u8],
    ) -> ExecutionOutcome {
        let checkpoint = self.registry.checkpoint();
        let outcome = self.execute_with_input(contract, context, input);
        if !outcome.is_success() {
            debug!("rolling back registry");
            self.registry.restore(checkpoint);
        }
        outcome
    }
}

// =============================================================================
// TESTS
// =============================================================================
