//! Shared error type for buffer operations.

use std::io;

use thiserror::Error;

/// Error type for buffer-level operations.
#[derive(Debug, Error)]
pub enum BufferError {
    /// A finite double that does not fit IEEE-754 single precision.
    #[error("float too large for single precision")]
    Float32Overflow,
    /// Failure from the underlying reader or seeker.
    #[error(transparent)]
    Io(#[from] io::Error),
}
