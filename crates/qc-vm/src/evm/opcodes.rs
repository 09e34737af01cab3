//! # Opcodes
//!
//! The closed instruction set with its encoding and gas table.

use crate::evm::gas::costs;
use std::fmt;

/// Supported opcodes.
///
/// Any byte without a variant here is rejected as `UnknownOpcode`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    // 0x00 - Stop and Arithmetic
    /// Halt with no output.
    Stop = 0x00,
    /// Wrapping addition.
    Add = 0x01,
    /// Wrapping multiplication.
    Mul = 0x02,
    /// Wrapping subtraction.
    Sub = 0x03,
    /// Unsigned division; zero divisor yields 0.
    Div = 0x04,

    // 0x10 - Comparison
    /// Less than.
    Lt = 0x10,
    /// Greater than.
    Gt = 0x11,
    /// Equality.
    Eq = 0x14,

    // 0x50 - Storage and Flow
    /// Read a storage slot.
    SLoad = 0x54,
    /// Write a storage slot.
    SStore = 0x55,
    /// Unconditional jump.
    Jump = 0x56,
    /// Jump if the condition is non-zero.
    JumpI = 0x57,

    // 0x60 - Push
    /// Push the next code byte.
    Push1 = 0x60,

    // 0x80 - Duplication
    /// Duplicate the top item.
    Dup1 = 0x80,

    // 0x90 - Exchange
    /// Swap the top two items.
    Swap1 = 0x90,

    // 0xA0 - Logging
    /// Emit a log without topics.
    Log0 = 0xA0,

    // 0xF0 - System
    /// Register new contract code.
    Create = 0xF0,
    /// Run another contract in a nested frame.
    Call = 0xF1,
    /// Halt with output.
    Return = 0xF3,
    /// Halt with output, signalling failure.
    Revert = 0xFD,
}

impl Opcode {
    /// Decode a byte into an opcode.
    #[must_use]
    pub fn from_byte(byte: u8) -> Option<Self> {
        let op = match byte {
            0x00 => Self::Stop,
            0x01 => Self::Add,
            0x02 => Self::Mul,
            0x03 => Self::Sub,
            0x04 => Self::Div,
            0x10 => Self::Lt,
            0x11 => Self::Gt,
            0x14 => Self::Eq,
            0x54 => Self::SLoad,
            0x55 => Self::SStore,
            0x56 => Self::Jump,
            0x57 => Self::JumpI,
            0x60 => Self::Push1,
            0x80 => Self::Dup1,
            0x90 => Self::Swap1,
            0xA0 => Self::Log0,
            0xF0 => Self::Create,
            0xF1 => Self::Call,
            0xF3 => Self::Return,
            0xFD => Self::Revert,
            _ => return None,
        };
        Some(op)
    }

    /// Encoded byte of this opcode.
    #[must_use]
    pub const fn byte(self) -> u8 {
        self as u8
    }

    /// Fixed gas charged before the opcode executes.
    #[rustfmt::skip]
    #[must_use]
    pub const fn gas_cost(self) -> u64 {
        match self {
            Self::Stop | Self::Return | Self::Revert => costs::ZERO,
            Self::Add | Self::Sub => costs::VERY_LOW,
            Self::Lt | Self::Gt | Self::Eq => costs::VERY_LOW,
            Self::Push1 | Self::Dup1 | Self::Swap1 => costs::VERY_LOW,
            Self::Mul | Self::Div => costs::LOW,
            Self::Jump => costs::MID,
            Self::JumpI => costs::HIGH,
            Self::SLoad => costs::SLOAD,
            Self::SStore => costs::SSTORE,
            Self::Log0 => costs::LOG,
            Self::Create => costs::CREATE,
            Self::Call => costs::CALL,
        }
    }

    /// Number of immediate bytes following the opcode.
    #[must_use]
    pub const fn immediate_size(self) -> usize {
        match self {
            Self::Push1 => 1,
            _ => 0,
        }
    }

    /// Number of topics popped by a LOG opcode.
    #[must_use]
    pub const fn log_topics(self) -> Option<usize> {
        match self {
            Self::Log0 => Some(0),
            _ => None,
        }
    }

    /// Returns true if this opcode ends the frame.
    #[must_use]
    pub fn is_terminating(self) -> bool {
        matches!(self, Self::Stop | Self::Return | Self::Revert)
    }

    /// Assembly mnemonic.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Stop => "STOP",
            Self::Add => "ADD",
            Self::Mul => "MUL",
            Self::Sub => "SUB",
            Self::Div => "DIV",
            Self::Lt => "LT",
            Self::Gt => "GT",
            Self::Eq => "EQ",
            Self::SLoad => "SLOAD",
            Self::SStore => "SSTORE",
            Self::Jump => "JUMP",
            Self::JumpI => "JUMPI",
            Self::Push1 => "PUSH1",
            Self::Dup1 => "DUP1",
            Self::Swap1 => "SWAP1",
            Self::Log0 => "LOG0",
            Self::Create => "CREATE",
            Self::Call => "CALL",
            Self::Return => "RETURN",
            Self::Revert => "REVERT",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

impl TryFrom<u8> for Opcode {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Self::from_byte(byte).ok_or(byte)
    }
}

// =============================================================================
// TESTS
// =============================================================================
