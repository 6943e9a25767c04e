//! Error types for lanebench kernels.
//!
//! Kernels never panic on bad input: precondition violations are reported to
//! the immediate caller through [`KernelError`]. Degraded SIMD capability and
//! zero norms are not errors and never show up here.

use thiserror::Error;

/// Errors that can occur when calling a kernel, the partitioner or the harness.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KernelError {
    /// Two buffers that must be paired element by element differ in length.
    #[error("Length mismatch: left buffer has {left} elements, right buffer has {right}")]
    LengthMismatch {
        /// Length of the first (left-hand) buffer.
        left: usize,
        /// Length of the second (right-hand) buffer.
        right: usize,
    },
    /// A buffer that must hold at least one element is empty.
    #[error("Empty buffer: `{name}` must contain at least one element")]
    EmptyBuffer {
        /// Name of the offending argument.
        name: &'static str,
    },
    /// No kernel backend exists for the requested lane count.
    #[error("Unsupported vector width: no backend for {lanes} lanes")]
    UnsupportedWidth {
        /// The rejected lane count.
        lanes: usize,
    },
    /// Any other invalid argument (zero cores, malformed descriptor, bad config).
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Human-readable error message.
        message: String,
    },
}

/// Result type alias for lanebench operations.
pub type Result<T> = std::result::Result<T, KernelError>;

/// Creates a length mismatch error.
pub fn length_mismatch(left: usize, right: usize) -> KernelError {
    KernelError::LengthMismatch { left, right }
}

/// Creates an empty buffer error.
pub fn empty_buffer(name: &'static str) -> KernelError {
    KernelError::EmptyBuffer { name }
}

/// Creates an invalid argument error.
pub fn invalid_argument(message: impl Into<String>) -> KernelError {
    KernelError::InvalidArgument {
        message: message.into(),
    }
}

/// Checks the shared precondition of every paired kernel: both buffers
/// non-empty and of equal length.
#[inline]
pub(crate) fn check_pair(a: &[f32], b: &[f32]) -> Result<()> {
    if a.is_empty() {
        return Err(empty_buffer("a"));
    }
    if b.is_empty() {
        return Err(empty_buffer("b"));
    }
    if a.len() != b.len() {
        return Err(length_mismatch(a.len(), b.len()));
    }
    Ok(())
}
