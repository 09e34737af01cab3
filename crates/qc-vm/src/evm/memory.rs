//! # Frame Memory
//!
//! Byte-addressable, zero-initialized buffer owned by one frame.
//! Stores grow it to exactly the touched length; loads never grow it.

use crate::errors::VmError;

/// Default maximum memory size (32 MiB).
pub const MAX_MEMORY_SIZE: usize = 32 * 1024 * 1024;

/// Frame-local memory.
///
/// ## Invariants
/// - `len() <= limit()`
/// - length never shrinks
#[derive(Clone, Debug)]
pub struct Memory {
    data: Vec<u8>,
    limit: usize,
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory {
    /// Creates a new empty memory with the default limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limit(MAX_MEMORY_SIZE)
    }

    /// Creates a new empty memory capped at `limit` bytes.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            data: Vec::new(),
            limit,
        }
    }

    /// Returns the current memory size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if memory is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the size ceiling in bytes.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Write `bytes` at `offset`, zero-filling any gap past the current end.
    ///
    /// # Errors
    ///
    /// Returns `MemoryLimitExceeded` if `offset + bytes.len()` exceeds the limit;
    /// memory is left untouched in that case.
    pub fn store(&mut self, offset: usize, bytes: &[u8]) -> Result<(), VmError> {
        let end = offset
            .checked_add(bytes.len())
            .ok_or(VmError::MemoryLimitExceeded {
                requested: usize::MAX,
                max: self.limit,
            })?;
        if end > self.limit {
            return Err(VmError::MemoryLimitExceeded {
                requested: end,
                max: self.limit,
            });
        }
        if end > self.data.len() {
            self.data.resize(end, 0);
        }
        self.data[offset..end].copy_from_slice(bytes);
        Ok(())
    }

    /// Borrow `size` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns `MemoryOutOfBounds` if the range ends past the current length.
    pub fn load(&self, offset: usize, size: usize) -> Result<&[u8], VmError> {
        match offset.checked_add(size) {
            Some(end) if end <= self.data.len() => Ok(&self.data[offset..end]),
            _ => Err(VmError::MemoryOutOfBounds { offset, size }),
        }
    }

    /// Get a reference to the underlying data.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the memory, returning its bytes.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

// =============================================================================
// TESTS
// =============================================================================
