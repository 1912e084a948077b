//! Intcode memory.
//!
//! A single flat buffer of signed 64-bit cells that holds both code and
//! data. Its length is fixed once a program is loaded.

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Machine memory: one `i64` per program integer.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memory {
    cells: Vec<i64>,
}

impl Memory {
    /// Wrap a loaded program image.
    pub fn new(cells: Vec<i64>) -> Self {
        Self { cells }
    }

    /// Number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Read a cell by index.
    #[inline]
    pub fn read(&self, addr: usize) -> Result<i64, MemoryError> {
        self.cells
            .get(addr)
            .copied()
            .ok_or(MemoryError::AddressOutOfRange { address: addr as i64, size: self.len() })
    }

    /// Write a cell by index.
    #[inline]
    pub fn write(&mut self, addr: usize, value: i64) -> Result<(), MemoryError> {
        let size = self.len();
        match self.cells.get_mut(addr) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(MemoryError::AddressOutOfRange { address: addr as i64, size }),
        }
    }

    /// Turn a raw memory word into a valid index.
    ///
    /// Valid addresses satisfy `0 <= raw < len`.
    pub fn resolve(&self, raw: i64) -> Result<usize, MemoryError> {
        if raw < 0 || raw as u64 >= self.len() as u64 {
            return Err(MemoryError::AddressOutOfRange { address: raw, size: self.len() });
        }
        Ok(raw as usize)
    }

    /// Read through a raw address word.
    pub fn read_at(&self, raw: i64) -> Result<i64, MemoryError> {
        let addr = self.resolve(raw)?;
        Ok(self.cells[addr])
    }

    /// Borrow the whole image.
    pub fn as_slice(&self) -> &[i64] {
        &self.cells
    }

    /// Release the buffer.
    pub fn into_vec(self) -> Vec<i64> {
        self.cells
    }

    /// Dump memory contents (for debugging).
    pub fn dump(&self, start: usize, count: usize) -> Vec<(usize, i64)> {
        let end = start.saturating_add(count).min(self.len());
        (start.min(end)..end)
            .map(|i| (i, self.cells[i]))
            .collect()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let non_zero = self.cells.iter().filter(|cell| **cell != 0).count();

        f.debug_struct("Memory")
            .field("non_zero_cells", &non_zero)
            .field("total_cells", &self.len())
            .finish()
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// Address is outside `[0, size)`.
    #[error("memory address {address} out of range (0 to {size} exclusive)")]
    AddressOutOfRange { address: i64, size: usize },
}

impl MemoryError {
    /// The offending address.
    pub fn address(&self) -> i64 {
        match self {
            MemoryError::AddressOutOfRange { address, .. } => *address,
        }
    }
}
