//! # Nested Execution
//!
//! CALL runs another registered contract in a fresh frame that shares the
//! registry and context with its caller. The callee is pushed onto the
//! interpreter's call stack rather than run recursively; its caller resumes
//! once it halts. CREATE registers new code without running it.
//!
//! ## Call outcome handling
//!
//! | Callee result | Caller `return_data`                   | Callee logs |
//! |---------------|----------------------------------------|-------------|
//! | Stop / Return | callee memory `[ret_offset, +ret_size)` | appended    |
//! | Revert        | revert payload                         | discarded   |
//! | Fault         | unchanged, caller faults too           | discarded   |

use crate::domain::entities::Halt;
use crate::domain::value_objects::{Address, Value};
use crate::errors::VmError;
use crate::evm::interpreter::{load_range, Control, Frame, FrameEnv};
use crate::evm::registry::Contract;
use crate::ports::outbound::AddressDerivation;
use tracing::debug;

impl Frame {
    /// CALL: pop gas, address, value, ret offset/size, args offset/size.
    ///
    /// Returns the callee frame; the program counter stays on the CALL
    /// until [`Frame::resume`].
    pub(crate) fn op_call<D: AddressDerivation>(
        &mut self,
        env: &FrameEnv<'_, D>,
    ) -> Result<Control, VmError> {
        let gas_limit = self.stack.pop()?;
        let target = self.stack.pop()?;
        let _value = self.stack.pop()?;
        let ret_offset = self.stack.pop()?;
        let ret_size = self.stack.pop()?;
        let args_offset = self.stack.pop()?;
        let args_size = self.stack.pop()?;

        let target = Address::from_word(target.word());
        let code = env
            .registry
            .get(&target)
            .ok_or(VmError::ContractNotFound(target))?
            .code
            .clone();

        let depth = self.depth + 1;
        let max = env.config.max_call_depth;
        if depth > max {
            return Err(VmError::CallDepthExceeded { depth, max });
        }

        let args = load_range(&self.memory, args_offset, args_size)?;
        let gas = gas_limit.as_u64_saturating();

        debug!(
            caller = %self.contract,
            callee = %target,
            depth,
            gas,
            args_len = args.len(),
            "CALL"
        );

        let mut callee = Frame::new(env.config, target, code, gas, depth);
        callee.call_data = args;
        callee.ret_offset = ret_offset;
        callee.ret_size = ret_size;

        Ok(Control::Call(Box::new(callee)))
    }

    /// Apply a halted callee's result and step past the CALL.
    pub(crate) fn resume(&mut self, callee: Frame, halt: Halt) -> Result<(), VmError> {
        match halt {
            Halt::Stop | Halt::Return(_) => {
                self.return_data = load_range(&callee.memory, callee.ret_offset, callee.ret_size)?;
                self.logs.extend(callee.logs);
            }
            Halt::Revert(data) => {
                debug!(callee = %callee.contract, depth = callee.depth, "CALL reverted");
                self.return_data = data;
            }
        }

        self.pc += 1;
        Ok(())
    }

    /// CREATE: pop value, offset, size; register the code at a derived address.
    pub(crate) fn op_create<D: AddressDerivation>(
        &mut self,
        env: &mut FrameEnv<'_, D>,
    ) -> Result<Control, VmError> {
        let _value = self.stack.pop()?;
        let offset = self.stack.pop()?;
        let size = self.stack.pop()?;

        let code = load_range(&self.memory, offset, size)?;

        let nonce = env.registry.next_nonce();
        let address = env.deriver.derive(self.contract, nonce);

        debug!(
            creator = %self.contract,
            %address,
            nonce,
            code_len = code.len(),
            "CREATE"
        );

        env.registry.insert(address, Contract::new(address, code));
        self.stack.push(Value::address(address))?;

        Ok(Control::Continue)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::adapters::KeccakAddressDerivation;
    use crate::domain::entities::{Context, Halt, VmConfig};
    use crate::domain::services::compute_contract_address;
    use crate::domain::value_objects::{Address, Value, ValueKind, U256};
    use crate::errors::VmError;
    use crate::evm::interpreter::{FrameEnv, Interpreter};
    use crate::evm::registry::{Contract, ContractRegistry};

    const CALLER: Address = Address::new([0xC0; 20]);
    const CALLEE: Address = Address::new([0x00; 20]);
    const CALL_COST: u64 = 8 * 3 + 5 + 40;

    /// CALL to `CALLEE` (the zero address) with the given return size and
    /// empty args. Costs 8 pushes, a MUL and the CALL itself.
    fn call_to_zero(ret_size: u8) -> Vec<u8> {
        vec![
            0x60, 0x00, // args_size
            0x60, 0x00, // args_offset
            0x60, ret_size, // ret_size
            0x60, 0x00, // ret_offset
            0x60, 0x00, // value
            0x60, 0x00, // address
            0x60, 0xFF, 0x60, 0xFF, 0x02, // gas = 255 * 255
            0xF1,
        ]
    }

    fn run(
        registry: &mut ContractRegistry,
        config: &VmConfig,
        input: &[u8],
    ) -> (Result<Halt, VmError>, Vec<u8>, usize, u64) {
        let context = Context::default();
        let deriver = KeccakAddressDerivation;
        let env = FrameEnv::new(registry, &context, config, &deriver);
        let mut frame = Interpreter::new(env, CALLER, 100_000).unwrap();
        frame.load_input(input).unwrap();
        let result = frame.run();
        (
            result,
            frame.return_data().to_vec(),
            frame.logs().len(),
            frame.gas().used(),
        )
    }

    #[test]
    fn test_call_missing_contract() {
        let mut registry = ContractRegistry::new();
        registry.insert(CALLER, Contract::new(CALLER, call_to_zero(0)));

        let (result, _, _, used) = run(&mut registry, &VmConfig::default(), &[]);
        assert_eq!(result, Err(VmError::ContractNotFound(CALLEE)));
        assert_eq!(used, CALL_COST);
    }

    #[test]
    fn test_call_gas_not_deducted_from_caller() {
        let mut registry = ContractRegistry::new();
        registry.insert(CALLER, Contract::new(CALLER, call_to_zero(0)));
        // Callee: PUSH1 1, PUSH1 1, ADD
        registry.insert(CALLEE, Contract::new(CALLEE, vec![0x60, 0x01, 0x60, 0x01, 0x01]));

        let (result, return_data, _, used) = run(&mut registry, &VmConfig::default(), &[]);
        assert_eq!(result, Ok(Halt::Stop));
        assert!(return_data.is_empty());
        assert_eq!(used, CALL_COST);
    }

    #[test]
    fn test_call_return_range_reads_callee_memory() {
        let mut registry = ContractRegistry::new();
        registry.insert(CALLER, Contract::new(CALLER, call_to_zero(1)));
        registry.insert(CALLEE, Contract::new(CALLEE, vec![0x00]));

        // Callee memory is empty, so a one-byte return range is out of bounds
        let (result, _, _, _) = run(&mut registry, &VmConfig::default(), &[]);
        assert_eq!(
            result,
            Err(VmError::MemoryOutOfBounds { offset: 0, size: 1 })
        );
    }

    #[test]
    fn test_call_loads_args_from_caller_memory() {
        let mut registry = ContractRegistry::new();
        let mut code = vec![
            0x60, 0x02, // args_size
            0x60, 0x01, // args_offset
        ];
        code.extend_from_slice(&call_to_zero(0)[4..]);
        registry.insert(CALLER, Contract::new(CALLER, code));
        // Callee: LOG0 over an empty range, so the log proves it ran
        registry.insert(
            CALLEE,
            Contract::new(CALLEE, vec![0x60, 0x00, 0x60, 0x00, 0xA0]),
        );

        let (result, _, logs, _) = run(&mut registry, &VmConfig::default(), &[7, 8, 9]);
        assert_eq!(result, Ok(Halt::Stop));
        assert_eq!(logs, 1);
    }

    #[test]
    fn test_call_args_out_of_bounds() {
        let mut registry = ContractRegistry::new();
        let mut code = vec![0x60, 0x04, 0x60, 0x00];
        code.extend_from_slice(&call_to_zero(0)[4..]);
        registry.insert(CALLER, Contract::new(CALLER, code));
        registry.insert(CALLEE, Contract::new(CALLEE, vec![0x00]));

        let (result, _, _, _) = run(&mut registry, &VmConfig::default(), &[1]);
        assert_eq!(
            result,
            Err(VmError::MemoryOutOfBounds { offset: 0, size: 4 })
        );
    }

    #[test]
    fn test_call_revert_discards_logs() {
        let mut registry = ContractRegistry::new();
        registry.insert(CALLER, Contract::new(CALLER, call_to_zero(0)));
        // Callee: LOG0 (empty), then REVERT with empty payload
        registry.insert(
            CALLEE,
            Contract::new(
                CALLEE,
                vec![0x60, 0x00, 0x60, 0x00, 0xA0, 0x60, 0x00, 0x60, 0x00, 0xFD],
            ),
        );

        let (result, return_data, logs, _) = run(&mut registry, &VmConfig::default(), &[]);
        assert_eq!(result, Ok(Halt::Stop));
        assert!(return_data.is_empty());
        assert_eq!(logs, 0);
    }

    #[test]
    fn test_callee_fault_propagates() {
        let mut registry = ContractRegistry::new();
        registry.insert(CALLER, Contract::new(CALLER, call_to_zero(0)));
        registry.insert(CALLEE, Contract::new(CALLEE, vec![0xFE]));

        let (result, _, _, _) = run(&mut registry, &VmConfig::default(), &[]);
        assert_eq!(result, Err(VmError::UnknownOpcode(0xFE)));
    }

    #[test]
    fn test_callee_gas_is_own_budget() {
        let mut registry = ContractRegistry::new();
        let mut code = call_to_zero(0);
        code[13] = 0x01; // callee gas = 1 * 2
        code[15] = 0x02;
        registry.insert(CALLER, Contract::new(CALLER, code));
        registry.insert(CALLEE, Contract::new(CALLEE, vec![0x60, 0x01]));

        let (result, _, _, _) = run(&mut registry, &VmConfig::default(), &[]);
        assert_eq!(
            result,
            Err(VmError::OutOfGas {
                cost: 3,
                remaining: 2
            })
        );
    }

    #[test]
    fn test_call_depth_limit() {
        // The zero address calls itself until the limit is hit
        let mut registry = ContractRegistry::new();
        let code = call_to_zero(0);
        registry.insert(CALLER, Contract::new(CALLER, code.clone()));
        registry.insert(CALLEE, Contract::new(CALLEE, code));

        let config = VmConfig {
            max_call_depth: 3,
            ..VmConfig::default()
        };
        let (result, _, _, _) = run(&mut registry, &config, &[]);
        assert_eq!(
            result,
            Err(VmError::CallDepthExceeded { depth: 4, max: 3 })
        );
    }

    #[test]
    fn test_default_depth_limit_on_test_thread() {
        // Frames live on the interpreter's heap call stack, so the full
        // default depth runs on an ordinary test thread
        let mut registry = ContractRegistry::new();
        let code = call_to_zero(0);
        registry.insert(CALLER, Contract::new(CALLER, code.clone()));
        registry.insert(CALLEE, Contract::new(CALLEE, code));

        let (result, _, _, used) = run(&mut registry, &VmConfig::default(), &[]);
        assert_eq!(
            result,
            Err(VmError::CallDepthExceeded {
                depth: 1025,
                max: 1024
            })
        );
        // Inspection reports the root frame once execution has ended
        assert_eq!(used, CALL_COST);
    }

    #[test]
    fn test_step_enters_and_leaves_callee() {
        let mut registry = ContractRegistry::new();
        registry.insert(CALLER, Contract::new(CALLER, call_to_zero(0)));
        // Callee: PUSH1 1, STOP
        registry.insert(CALLEE, Contract::new(CALLEE, vec![0x60, 0x01, 0x00]));

        let context = Context::default();
        let config = VmConfig::default();
        let deriver = KeccakAddressDerivation;
        let env = FrameEnv::new(&mut registry, &context, &config, &deriver);
        let mut frame = Interpreter::new(env, CALLER, 100_000).unwrap();

        // 8 pushes and a MUL, then the CALL itself
        for _ in 0..10 {
            assert_eq!(frame.step().unwrap(), None);
        }
        assert_eq!(frame.depth(), 1);
        assert_eq!(frame.contract(), CALLEE);
        assert_eq!(frame.pc(), 0);
        assert_eq!(frame.gas().limit(), 255 * 255);

        assert_eq!(frame.step().unwrap(), None);
        assert_eq!(frame.stack().len(), 1);

        // Callee STOP resumes the caller just past its CALL
        assert_eq!(frame.step().unwrap(), None);
        assert_eq!(frame.depth(), 0);
        assert_eq!(frame.contract(), CALLER);
        assert_eq!(frame.pc(), 18);
        assert!(frame.stack().is_empty());

        assert_eq!(frame.step().unwrap(), Some(Halt::Stop));
        assert_eq!(frame.gas().used(), CALL_COST);
    }

    #[test]
    fn test_create_registers_code() {
        // CREATE size 2, offset 1, value 0
        let mut registry = ContractRegistry::new();
        registry.insert(
            CALLER,
            Contract::new(CALLER, vec![0x60, 0x02, 0x60, 0x01, 0x60, 0x00, 0xF0]),
        );

        let context = Context::default();
        let config = VmConfig::default();
        let deriver = KeccakAddressDerivation;
        let env = FrameEnv::new(&mut registry, &context, &config, &deriver);
        let mut frame = Interpreter::new(env, CALLER, 100_000).unwrap();
        frame.load_input(&[0xAA, 0x60, 0x05]).unwrap();

        assert_eq!(frame.run(), Ok(Halt::Stop));
        assert_eq!(frame.gas().used(), 3 * 3 + 32_000);

        let pushed = frame.stack().peek_at(0).unwrap();
        assert_eq!(pushed.kind(), ValueKind::Address);
        let created = pushed.as_address();
        assert_eq!(created, compute_contract_address(CALLER, 0));
        drop(frame);

        let contract = registry.get(&created).unwrap();
        assert_eq!(contract.code.as_slice(), &[0x60, 0x05]);
        assert!(contract.storage.is_empty());
        assert_eq!(registry.nonce(), 1);
    }

    #[test]
    fn test_create_uses_injected_derivation() {
        let mut registry = ContractRegistry::new();
        let code = vec![
            0x60, 0x00, 0x60, 0x00, 0x60, 0x00, 0xF0, // CREATE empty
            0x60, 0x00, 0x60, 0x00, 0x60, 0x00, 0xF0, // CREATE empty
        ];
        registry.insert(CALLER, Contract::new(CALLER, code));

        let context = Context::default();
        let config = VmConfig::default();
        let deriver = |_creator: Address, nonce: u64| {
            let mut bytes = [0x11; 20];
            bytes[19] = u8::try_from(nonce).unwrap_or(u8::MAX);
            Address::new(bytes)
        };
        let env = FrameEnv::new(&mut registry, &context, &config, &deriver);
        let mut frame = Interpreter::new(env, CALLER, 100_000).unwrap();
        frame.run().unwrap();

        let words: Vec<U256> = frame.stack().as_slice().iter().map(Value::word).collect();
        assert_eq!(words.len(), 2);
        assert_ne!(words[0], words[1]);
        drop(frame);

        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_create_then_call() {
        // CREATE a contract whose code is `PUSH1 0x2a`, then CALL it
        let mut registry = ContractRegistry::new();
        let code = vec![
            0x60, 0x00, // args_size
            0x60, 0x00, // args_offset
            0x60, 0x00, // ret_size
            0x60, 0x00, // ret_offset
            0x60, 0x00, // value
            0x60, 0x02, 0x60, 0x00, 0x60, 0x00, 0xF0, // CREATE size 2, offset 0 -> address
            0x60, 0xFF, // gas
            0xF1,
        ];
        registry.insert(CALLER, Contract::new(CALLER, code));

        let (result, _, _, used) = run(&mut registry, &VmConfig::default(), &[0x60, 0x2a]);
        assert_eq!(result, Ok(Halt::Stop));
        assert_eq!(used, 9 * 3 + 32_000 + 40);
        assert_eq!(registry.len(), 2);
    }
}
