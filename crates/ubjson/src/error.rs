//! Encoder and decoder error types.

use std::io;

use thiserror::Error;
use ubjson_buffers::BufferError;

/// Errors produced while encoding a value tree into UBJSON bytes.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// A container was reached again while it was still being written.
    #[error("Circular reference detected")]
    CircularReference,
    #[error("Maximum recursion depth exceeded while encoding a UBJSON {0}")]
    RecursionLimit(&'static str),
    /// A finite double overflowed single precision where a float32 payload
    /// was required.
    #[error("Float value too large for float32")]
    Float32Overflow,
    /// Failure from the downstream sink.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// A decode failure, carrying the input offset at which it was detected.
///
/// For truncated payloads the offset points at the start of the item whose
/// bytes ran out.
#[derive(Debug, Error)]
#[error("{kind} (at byte {offset})")]
pub struct DecodeError {
    pub kind: DecodeErrorKind,
    pub offset: usize,
}

/// The kinds of decode failure.
#[derive(Debug, Error)]
pub enum DecodeErrorKind {
    /// Input ended where an item was expected.
    #[error("Insufficient input ({0})")]
    Insufficient(&'static str),
    /// Input ended in the middle of an item.
    #[error("Insufficient (partial) input ({0})")]
    InsufficientPartial(&'static str),
    #[error("Invalid marker 0x{0:02x}")]
    InvalidMarker(u8),
    #[error("Integer marker expected")]
    IntegerMarkerExpected,
    #[error("Negative count/length unexpected")]
    NegativeLength,
    #[error("Invalid container type")]
    InvalidContainerType,
    #[error("Container type without count")]
    TypeWithoutCount,
    #[error("Failed to decode utf8: {0}")]
    InvalidUtf8(&'static str),
    #[error("Failed to decode object key ({0})")]
    InvalidKey(&'static str),
    #[error("Failed to parse high-precision number")]
    InvalidHighPrec,
    #[error("Maximum recursion depth exceeded whilst decoding a UBJSON {0}")]
    RecursionLimit(&'static str),
    /// Failure from the underlying source.
    #[error(transparent)]
    Source(#[from] BufferError),
}
