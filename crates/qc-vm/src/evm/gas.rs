//! # Gas Metering
//!
//! Fixed per-opcode gas costs and the per-frame gas meter.

use crate::errors::VmError;

// =============================================================================
// BASE GAS COSTS
// =============================================================================

/// Gas costs for every supported opcode.
pub mod costs {
    /// Zero gas (STOP, RETURN, REVERT).
    pub const ZERO: u64 = 0;
    /// Very low cost (ADD, SUB, comparisons, PUSH1, DUP1, SWAP1).
    pub const VERY_LOW: u64 = 3;
    /// Low cost (MUL, DIV).
    pub const LOW: u64 = 5;
    /// Mid cost (JUMP).
    pub const MID: u64 = 8;
    /// High cost (JUMPI).
    pub const HIGH: u64 = 10;

    // Storage costs
    /// Storage read.
    pub const SLOAD: u64 = 200;
    /// Storage write, flat regardless of previous value.
    pub const SSTORE: u64 = 20_000;

    /// LOG base cost.
    pub const LOG: u64 = 375;

    /// CALL base cost; the callee budget is not charged to the caller.
    pub const CALL: u64 = 40;
    /// CREATE opcode cost.
    pub const CREATE: u64 = 32_000;
}

// =============================================================================
// GAS METER
// =============================================================================

/// Remaining gas of one frame.
///
/// ## Invariants
/// - `remaining() <= limit()`
/// - a rejected charge leaves the meter unchanged
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GasMeter {
    limit: u64,
    remaining: u64,
}

impl GasMeter {
    /// Creates a meter holding `limit` gas.
    #[must_use]
    pub const fn new(limit: u64) -> Self {
        Self {
            limit,
            remaining: limit,
        }
    }

    /// Charge `cost` gas.
    ///
    /// # Errors
    ///
    /// Returns `OutOfGas` if `cost` exceeds the remaining gas.
    pub fn consume(&mut self, cost: u64) -> Result<(), VmError> {
        if cost > self.remaining {
            return Err(VmError::OutOfGas {
                cost,
                remaining: self.remaining,
            });
        }
        self.remaining -= cost;
        Ok(())
    }

    /// Gas still available.
    #[must_use]
    pub const fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Gas consumed so far.
    #[must_use]
    pub const fn used(&self) -> u64 {
        self.limit - self.remaining
    }

    /// Initial budget.
    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.limit
    }
}

// =============================================================================
// TESTS
// =============================================================================
