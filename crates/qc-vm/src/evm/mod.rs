//! # Virtual Machine
//!
//! Frame-level machinery: bounded stack and memory, gas metering, the opcode
//! table, contract storage and registry, and the interpreter itself.
//!
//! ## Components
//!
//! - `stack.rs` - 1024-slot operand stack
//! - `memory.rs` - Byte memory, 32 MiB ceiling
//! - `gas.rs` - Gas costs and per-frame meter
//! - `opcodes.rs` - Opcode definitions
//! - `storage.rs` - Per-contract key/value storage
//! - `registry.rs` - Deployed contracts shared by all frames
//! - `interpreter.rs` - Fetch/decode/execute loop
//! - `call.rs` - CALL and CREATE

pub mod call;
pub mod gas;
pub mod interpreter;
pub mod memory;
pub mod opcodes;
pub mod registry;
pub mod stack;
pub mod storage;

pub use gas::*;
pub use interpreter::*;
pub use memory::*;
pub use opcodes::*;
pub use registry::*;
pub use stack::*;
pub use storage::*;
