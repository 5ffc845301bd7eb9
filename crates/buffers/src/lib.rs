//! Byte buffer primitives shared by the ubjson codec: the encoder's
//! grow-or-flush write buffer, the decoder's pull-based byte sources,
//! IEEE-754 pack/unpack helpers, and the [`BufferError`] type they share.

mod error;
pub mod floats;
mod source;
mod writer;

pub use error::BufferError;
pub use source::{ByteSource, SeekSource, SliceSource, StreamSource};
pub use writer::Writer;
