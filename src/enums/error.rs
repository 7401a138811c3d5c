//! # **Error Module** - *Custom Kernel Error Type*
//!
//! Defines the validated-entry error type for the container-level predicate
//! surface. Hot-path bit operations do not return errors; their
//! preconditions are asserted.

use std::error::Error;
use std::fmt;

/// Error type for validated kernel entry points.
///
/// Each variant carries a contextual message with the specific lengths or
/// arguments that failed validation.
#[derive(Debug, Clone, PartialEq)]
pub enum KernelError {
    /// Column length does not match the bitset or the other column.
    LengthMismatch(String),

    /// Arguments outside the operation's domain.
    InvalidArguments(String),

    /// Index or window outside the logical range.
    OutOfBounds(String),
}

impl KernelError {
    /// Mismatch between the bitset length and a column's row count.
    pub(crate) fn rows_mismatch(op: &str, bits: usize, rows: usize) -> Self {
        KernelError::LengthMismatch(format!(
            "{op}: bitset holds {bits} bits but the column has {rows} rows"
        ))
    }

    /// Mismatch between two operand columns.
    pub(crate) fn columns_mismatch(op: &str, lhs: usize, rhs: usize) -> Self {
        KernelError::LengthMismatch(format!(
            "{op}: operand columns differ in length ({lhs} vs {rhs})"
        ))
    }
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelError::LengthMismatch(msg) => write!(f, "Length mismatch: {}", msg),
            KernelError::InvalidArguments(msg) => write!(f, "Invalid arguments: {}", msg),
            KernelError::OutOfBounds(msg) => write!(f, "Out of bounds: {}", msg),
        }
    }
}

impl Error for KernelError {}
