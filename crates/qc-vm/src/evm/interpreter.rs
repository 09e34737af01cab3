//! # Interpreter
//!
//! Fetch, decode and execute opcodes until the root frame halts or faults.
//!
//! Nested CALL frames live on a heap-allocated call stack owned by the
//! [`Interpreter`], so call depth is bounded by `max_call_depth` alone and
//! never by the host thread's stack. Frames for CALL are built in
//! [`crate::evm::call`].

use crate::adapters::KeccakAddressDerivation;
use crate::domain::entities::{Context, Halt, Log, VmConfig};
use crate::domain::value_objects::{Address, Bytes, Hash, StorageKey, Value, U256};
use crate::errors::VmError;
use crate::evm::gas::GasMeter;
use crate::evm::memory::Memory;
use crate::evm::opcodes::Opcode;
use crate::evm::registry::ContractRegistry;
use crate::evm::stack::Stack;
use crate::ports::outbound::AddressDerivation;
use tracing::{debug, trace};

// =============================================================================
// SHARED ENVIRONMENT
// =============================================================================

/// State shared by every frame of one execution.
///
/// Only the registry is mutable.
pub struct FrameEnv<'a, D: AddressDerivation = KeccakAddressDerivation> {
    /// Deployed contracts.
    pub registry: &'a mut ContractRegistry,
    /// Block and transaction parameters.
    pub context: &'a Context,
    /// Resource limits.
    pub config: &'a VmConfig,
    /// CREATE address scheme.
    pub deriver: &'a D,
}

impl<'a, D: AddressDerivation> FrameEnv<'a, D> {
    /// Bundles the shared state.
    pub fn new(
        registry: &'a mut ContractRegistry,
        context: &'a Context,
        config: &'a VmConfig,
        deriver: &'a D,
    ) -> Self {
        Self {
            registry,
            context,
            config,
            deriver,
        }
    }
}

// =============================================================================
// FRAME STATE
// =============================================================================

/// Lifecycle of an execution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrameState {
    /// More opcodes may execute.
    Running,
    /// The root frame terminated without a fault.
    Halted(Halt),
    /// Aborted by a fault in the root frame or any nested frame.
    Faulted(VmError),
}

/// What the dispatch loop does after a handler returns.
pub(crate) enum Control {
    /// Advance past the opcode and its immediates.
    Continue,
    /// Set the program counter to exactly this index.
    Jump(usize),
    /// Terminate the frame.
    Halt(Halt),
    /// Suspend the frame and run this callee on top of it.
    Call(Box<Frame>),
}

// =============================================================================
// FRAME
// =============================================================================

/// Per-call state: everything a CALL does not share with its caller.
#[derive(Debug)]
pub(crate) struct Frame {
    /// Address whose code runs and whose storage SLOAD/SSTORE touch.
    pub(crate) contract: Address,
    pub(crate) code: Bytes,
    pub(crate) pc: usize,
    pub(crate) stack: Stack,
    pub(crate) memory: Memory,
    pub(crate) gas: GasMeter,
    pub(crate) depth: usize,
    pub(crate) call_data: Bytes,
    /// Output of the last CALL, or this frame's own RETURN/REVERT payload.
    pub(crate) return_data: Bytes,
    pub(crate) logs: Vec<Log>,
    /// Range of this frame's memory handed back to the caller on success.
    pub(crate) ret_offset: Value,
    pub(crate) ret_size: Value,
}

impl Frame {
    pub(crate) fn new(
        config: &VmConfig,
        contract: Address,
        code: Bytes,
        gas_limit: u64,
        depth: usize,
    ) -> Self {
        debug!(%contract, depth, gas_limit, code_len = code.len(), "entering frame");

        Self {
            contract,
            code,
            pc: 0,
            stack: Stack::with_limit(config.max_stack_size),
            memory: Memory::with_limit(config.max_memory_size),
            gas: GasMeter::new(gas_limit),
            depth,
            call_data: Bytes::new(),
            return_data: Bytes::new(),
            logs: Vec::new(),
            ret_offset: Value::ZERO,
            ret_size: Value::ZERO,
        }
    }

    /// Fetch, charge and execute the opcode at the program counter.
    ///
    /// Returns `Continue` once the program counter has moved, a `Halt` when
    /// the frame terminates, or a `Call` with the program counter still on
    /// the CALL.
    fn dispatch<D: AddressDerivation>(
        &mut self,
        env: &mut FrameEnv<'_, D>,
    ) -> Result<Control, VmError> {
        let Some(&byte) = self.code.as_slice().get(self.pc) else {
            return Ok(Control::Halt(Halt::Stop));
        };
        let opcode = Opcode::from_byte(byte).ok_or(VmError::UnknownOpcode(byte))?;

        self.gas.consume(opcode.gas_cost())?;

        trace!(
            pc = self.pc,
            %opcode,
            gas_remaining = self.gas.remaining(),
            stack_len = self.stack.len(),
            depth = self.depth,
            "step"
        );

        match self.execute_opcode(env, opcode)? {
            Control::Continue => {
                self.pc += 1 + opcode.immediate_size();
                Ok(Control::Continue)
            }
            Control::Jump(dest) => {
                self.pc = dest;
                Ok(Control::Continue)
            }
            control => Ok(control),
        }
    }

    /// Execute a decoded opcode whose gas has already been charged.
    fn execute_opcode<D: AddressDerivation>(
        &mut self,
        env: &mut FrameEnv<'_, D>,
        opcode: Opcode,
    ) -> Result<Control, VmError> {
        match opcode {
            // =================================================================
            // STOP & ARITHMETIC
            // =================================================================
            Opcode::Stop => Ok(Control::Halt(Halt::Stop)),
            Opcode::Add => self.binary_op(|a, b| a.overflowing_add(b).0),
            Opcode::Mul => self.binary_op(|a, b| a.overflowing_mul(b).0),
            Opcode::Sub => self.binary_op(|a, b| a.overflowing_sub(b).0),
            Opcode::Div => {
                self.binary_op(|a, b| if b.is_zero() { U256::zero() } else { a / b })
            }

            // =================================================================
            // COMPARISON
            // =================================================================
            Opcode::Lt => self.binary_op(|a, b| U256::from(u8::from(a < b))),
            Opcode::Gt => self.binary_op(|a, b| U256::from(u8::from(a > b))),
            Opcode::Eq => self.binary_op(|a, b| U256::from(u8::from(a == b))),

            // =================================================================
            // STORAGE
            // =================================================================
            Opcode::SLoad => {
                let key = StorageKey::from_u256(self.stack.pop()?.word());
                let value = env
                    .registry
                    .get(&self.contract)
                    .map_or(Value::ZERO, |contract| contract.storage.sload(&key));
                self.stack.push(value)?;
                Ok(Control::Continue)
            }

            Opcode::SStore => {
                let value = self.stack.pop()?;
                let key = StorageKey::from_u256(self.stack.pop()?.word());
                env.registry
                    .get_mut(&self.contract)
                    .ok_or(VmError::ContractNotFound(self.contract))?
                    .storage
                    .sstore(key, value);
                Ok(Control::Continue)
            }

            // =================================================================
            // FLOW
            // =================================================================
            Opcode::Jump => {
                let dest = self.stack.pop()?;
                Ok(Control::Jump(jump_target(dest)))
            }

            Opcode::JumpI => {
                let condition = self.stack.pop()?;
                let dest = self.stack.pop()?;
                if condition.is_zero() {
                    Ok(Control::Continue)
                } else {
                    Ok(Control::Jump(jump_target(dest)))
                }
            }

            // =================================================================
            // STACK
            // =================================================================
            Opcode::Push1 => self.op_push(opcode.immediate_size()),
            Opcode::Dup1 => {
                self.stack.dup(1)?;
                Ok(Control::Continue)
            }
            Opcode::Swap1 => {
                self.stack.swap(1)?;
                Ok(Control::Continue)
            }

            // =================================================================
            // LOGGING
            // =================================================================
            Opcode::Log0 => {
                let topic_count = opcode.log_topics().unwrap_or(0);
                self.op_log(topic_count)
            }

            // =================================================================
            // SYSTEM
            // =================================================================
            Opcode::Create => self.op_create(env),
            Opcode::Call => self.op_call(env),

            Opcode::Return => {
                let data = self.pop_memory_range()?;
                Ok(Control::Halt(Halt::Return(data)))
            }

            Opcode::Revert => {
                let data = self.pop_memory_range()?;
                Ok(Control::Halt(Halt::Revert(data)))
            }
        }
    }

    /// Pop b then a, push `op(a, b)` as an integer.
    fn binary_op(&mut self, op: impl FnOnce(U256, U256) -> U256) -> Result<Control, VmError> {
        let b = self.stack.pop()?;
        let a = self.stack.pop()?;
        self.stack.push(Value::integer(op(a.word(), b.word())))?;
        Ok(Control::Continue)
    }

    fn op_push(&mut self, size: usize) -> Result<Control, VmError> {
        let start = self.pc + 1;
        let immediate = self
            .code
            .as_slice()
            .get(start..start.saturating_add(size))
            .ok_or(VmError::PushOutOfBounds { pc: self.pc, size })?;
        self.stack
            .push(Value::integer(U256::from_big_endian(immediate)))?;
        Ok(Control::Continue)
    }

    fn op_log(&mut self, topic_count: usize) -> Result<Control, VmError> {
        let size = self.stack.pop()?;
        let offset = self.stack.pop()?;

        let mut topics = Vec::with_capacity(topic_count);
        for _ in 0..topic_count {
            topics.push(Hash::from_word(self.stack.pop()?.word()));
        }

        let data = load_range(&self.memory, offset, size)?;
        self.logs.push(Log::new(self.contract, topics, data));
        Ok(Control::Continue)
    }

    /// Pop size then offset and copy that memory range.
    fn pop_memory_range(&mut self) -> Result<Bytes, VmError> {
        let size = self.stack.pop()?;
        let offset = self.stack.pop()?;
        load_range(&self.memory, offset, size)
    }
}

// =============================================================================
// INTERPRETER
// =============================================================================

/// Runs a root frame and every frame it CALLs.
///
/// Inspection methods describe the active frame: the innermost call in
/// progress while stepping, and the root frame once execution has ended.
pub struct Interpreter<'a, D: AddressDerivation = KeccakAddressDerivation> {
    env: FrameEnv<'a, D>,
    pub(crate) root: Frame,
    /// Suspended callers sit below their callee; the last entry is active.
    callees: Vec<Frame>,
    state: FrameState,
}

impl<'a, D: AddressDerivation> Interpreter<'a, D> {
    /// Create a root frame running the contract at `contract`.
    ///
    /// # Errors
    ///
    /// Returns `ContractNotFound` if nothing is registered at `contract`.
    pub fn new(env: FrameEnv<'a, D>, contract: Address, gas_limit: u64) -> Result<Self, VmError> {
        let code = env
            .registry
            .get(&contract)
            .ok_or(VmError::ContractNotFound(contract))?
            .code
            .clone();
        let root = Frame::new(env.config, contract, code, gas_limit, 0);

        Ok(Self {
            env,
            root,
            callees: Vec::new(),
            state: FrameState::Running,
        })
    }

    /// Seed root memory at offset 0 with `input` and record it as call data.
    ///
    /// Intended for use before the first step.
    ///
    /// # Errors
    ///
    /// Returns `MemoryLimitExceeded` if `input` does not fit in memory.
    pub fn load_input(&mut self, input: &[u8]) -> Result<(), VmError> {
        self.root.memory.store(0, input)?;
        self.root.call_data = Bytes::from_slice(input);
        Ok(())
    }

    /// Run until the root frame halts or a fault aborts execution.
    ///
    /// # Errors
    ///
    /// Returns the fault that aborted execution.
    pub fn run(&mut self) -> Result<Halt, VmError> {
        loop {
            if let Some(halt) = self.step()? {
                return Ok(halt);
            }
        }
    }

    /// Execute exactly one opcode in the active frame.
    ///
    /// Returns `Some(halt)` once the root frame has terminated. A nested
    /// frame halting returns `None` and resumes its caller. Stepping a
    /// terminated interpreter repeats its final result without executing
    /// anything.
    ///
    /// # Errors
    ///
    /// Returns the fault raised by this opcode (or an earlier one). A fault
    /// in any frame aborts every frame.
    pub fn step(&mut self) -> Result<Option<Halt>, VmError> {
        match &self.state {
            FrameState::Halted(halt) => return Ok(Some(halt.clone())),
            FrameState::Faulted(err) => return Err(err.clone()),
            FrameState::Running => {}
        }

        let frame = self.callees.last_mut().unwrap_or(&mut self.root);
        match frame.dispatch(&mut self.env) {
            Ok(Control::Call(callee)) => {
                self.callees.push(*callee);
                Ok(None)
            }
            Ok(Control::Halt(halt)) => self.halt_frame(halt),
            Ok(Control::Continue | Control::Jump(_)) => Ok(None),
            Err(err) => self.fault(err),
        }
    }

    /// Terminate the active frame, resuming its caller if there is one.
    fn halt_frame(&mut self, halt: Halt) -> Result<Option<Halt>, VmError> {
        let Some(callee) = self.callees.pop() else {
            if let Halt::Return(data) | Halt::Revert(data) = &halt {
                self.root.return_data = data.clone();
            }
            debug!(
                contract = %self.root.contract,
                depth = 0,
                gas_used = self.root.gas.used(),
                ?halt,
                "frame halted"
            );
            self.state = FrameState::Halted(halt.clone());
            return Ok(Some(halt));
        };

        debug!(
            contract = %callee.contract,
            depth = callee.depth,
            gas_used = callee.gas.used(),
            ?halt,
            "frame halted"
        );

        let caller = self.callees.last_mut().unwrap_or(&mut self.root);
        match caller.resume(callee, halt) {
            Ok(()) => Ok(None),
            Err(err) => self.fault(err),
        }
    }

    /// Abort every frame with `err`.
    fn fault(&mut self, err: VmError) -> Result<Option<Halt>, VmError> {
        let active = self.callees.last().unwrap_or(&self.root);
        debug!(
            contract = %active.contract,
            depth = active.depth,
            pc = active.pc,
            unwound = self.callees.len(),
            error = %err,
            "frame faulted"
        );
        self.callees.clear();
        self.state = FrameState::Faulted(err.clone());
        Err(err)
    }

    fn active(&self) -> &Frame {
        self.callees.last().unwrap_or(&self.root)
    }

    // =========================================================================
    // INSPECTION
    // =========================================================================

    /// Address of the running contract.
    #[must_use]
    pub fn contract(&self) -> Address {
        self.active().contract
    }

    /// Code being executed.
    #[must_use]
    pub fn code(&self) -> &[u8] {
        self.active().code.as_slice()
    }

    /// Program counter.
    #[must_use]
    pub fn pc(&self) -> usize {
        self.active().pc
    }

    /// Operand stack.
    #[must_use]
    pub fn stack(&self) -> &Stack {
        &self.active().stack
    }

    /// Frame memory.
    #[must_use]
    pub fn memory(&self) -> &Memory {
        &self.active().memory
    }

    /// Gas meter.
    #[must_use]
    pub fn gas(&self) -> &GasMeter {
        &self.active().gas
    }

    /// Nesting depth (root = 0).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.active().depth
    }

    /// Arguments this frame was called with.
    #[must_use]
    pub fn call_data(&self) -> &[u8] {
        self.active().call_data.as_slice()
    }

    /// Output of the last CALL, or this frame's RETURN/REVERT payload.
    #[must_use]
    pub fn return_data(&self) -> &[u8] {
        self.active().return_data.as_slice()
    }

    /// Logs emitted so far, including those of successful nested calls.
    #[must_use]
    pub fn logs(&self) -> &[Log] {
        &self.active().logs
    }

    /// Lifecycle state.
    #[must_use]
    pub fn state(&self) -> &FrameState {
        &self.state
    }

    /// Shared registry.
    #[must_use]
    pub fn registry(&self) -> &ContractRegistry {
        &*self.env.registry
    }

    /// Shared context.
    #[must_use]
    pub fn context(&self) -> &Context {
        self.env.context
    }
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Destinations beyond `usize` land past the end of code.
fn jump_target(dest: Value) -> usize {
    dest.as_usize().unwrap_or(usize::MAX)
}

/// Copy `size` bytes at `offset` out of `memory`.
///
/// Words that do not fit in `usize` can never be in bounds.
pub(crate) fn load_range(memory: &Memory, offset: Value, size: Value) -> Result<Bytes, VmError> {
    let offset = offset.as_usize().unwrap_or(usize::MAX);
    let size = size.as_usize().unwrap_or(usize::MAX);
    memory.load(offset, size).map(Bytes::from_slice)
}

// =============================================================================
// TESTS
// =============================================================================
