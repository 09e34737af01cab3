//! # Value Stack
//!
//! Bounded LIFO of typed values. Top of stack is the last element.
//! Maximum 1024 elements by default.

use crate::domain::value_objects::Value;
use crate::errors::VmError;

/// Default maximum stack size.
pub const MAX_STACK_SIZE: usize = 1024;

/// Frame-local operand stack.
///
/// A failed push or pop leaves the stack unchanged.
#[derive(Clone, Debug)]
pub struct Stack {
    data: Vec<Value>,
    limit: usize,
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}

impl Stack {
    /// Creates a new empty stack with the default limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limit(MAX_STACK_SIZE)
    }

    /// Creates a new empty stack holding at most `limit` values.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            data: Vec::with_capacity(limit.min(64)),
            limit,
        }
    }

    /// Returns the number of elements on the stack.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the stack is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the maximum number of elements.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Push a value onto the stack.
    ///
    /// # Errors
    ///
    /// Returns `StackOverflow` if the stack is full.
    pub fn push(&mut self, value: Value) -> Result<(), VmError> {
        if self.data.len() >= self.limit {
            return Err(VmError::StackOverflow);
        }
        self.data.push(value);
        Ok(())
    }

    /// Pop a value from the stack.
    ///
    /// # Errors
    ///
    /// Returns `StackUnderflow` if the stack is empty.
    pub fn pop(&mut self) -> Result<Value, VmError> {
        self.data.pop().ok_or(VmError::StackUnderflow)
    }

    /// Peek at a value at a given depth (0 = top).
    ///
    /// # Errors
    ///
    /// Returns `StackUnderflow` if the index is out of bounds.
    pub fn peek_at(&self, depth: usize) -> Result<Value, VmError> {
        if depth >= self.data.len() {
            return Err(VmError::StackUnderflow);
        }
        Ok(self.data[self.data.len() - 1 - depth])
    }

    /// Push a copy of the `n`-th element from the top (DUP1 = top, n = 1).
    ///
    /// # Errors
    ///
    /// Returns `StackUnderflow` if fewer than `n` elements, `StackOverflow` if full.
    pub fn dup(&mut self, n: usize) -> Result<(), VmError> {
        if n == 0 {
            return Err(VmError::StackUnderflow);
        }
        let value = self.peek_at(n - 1)?;
        self.push(value)
    }

    /// Swap the top element with the element `n` positions below it.
    ///
    /// # Errors
    ///
    /// Returns `StackUnderflow` if not enough elements.
    pub fn swap(&mut self, n: usize) -> Result<(), VmError> {
        if n == 0 || n >= self.data.len() {
            return Err(VmError::StackUnderflow);
        }
        let len = self.data.len();
        self.data.swap(len - 1, len - 1 - n);
        Ok(())
    }

    /// Get a reference to the underlying data, bottom first.
    #[must_use]
    pub fn as_slice(&self) -> &[Value] {
        &self.data
    }

    /// Consumes the stack, returning its values bottom first.
    #[must_use]
    pub fn into_vec(self) -> Vec<Value> {
        self.data
    }
}

// =============================================================================
// TESTS
// =============================================================================
