//! Universal Binary JSON (Draft 12) encoder and decoder.
//!
//! The codec converts between [`UbjsonValue`] trees and the UBJSON byte
//! stream. Encoding picks the narrowest integer marker, takes the `[$U#`
//! shorthand for raw bytes, and can emit `#`-count container headers;
//! decoding honours optional `$type` / `#count` container parameters,
//! no-op fillers, and object hooks.
//!
//! ```
//! use ubjson::{decode_from_slice, encode_to_vec, DecodeOptions, EncodeOptions, UbjsonValue};
//!
//! let value = UbjsonValue::Array(vec![
//!     UbjsonValue::Int(1),
//!     UbjsonValue::Int(2),
//!     UbjsonValue::Int(3),
//! ]);
//! let bytes = encode_to_vec(&value, &EncodeOptions::default()).unwrap();
//! assert_eq!(bytes, b"[U\x01U\x02U\x03]".to_vec());
//! assert_eq!(decode_from_slice(&bytes, DecodeOptions::default()).unwrap(), value);
//! ```

use std::io;

mod decoder;
mod encoder;
mod error;
pub mod markers;
mod value;

pub use decoder::{DecodeOptions, ObjectHook, ObjectPairsHook, UbjsonDecoder};
pub use encoder::{EncodeOptions, UbjsonEncoder};
pub use error::{DecodeError, DecodeErrorKind, EncodeError};
pub use ubjson_buffers::{BufferError, ByteSource, SeekSource, SliceSource, StreamSource, Writer};
pub use value::UbjsonValue;

/// Encodes `value` into a fresh byte vector.
pub fn encode_to_vec(value: &UbjsonValue, opts: &EncodeOptions) -> Result<Vec<u8>, EncodeError> {
    let mut encoder = UbjsonEncoder::new(*opts);
    encoder.encode(value)?;
    encoder.finish()
}

/// Encodes `value` through `sink`, flushing as the internal buffer fills.
pub fn encode_into<W: io::Write>(
    value: &UbjsonValue,
    sink: &mut W,
    opts: &EncodeOptions,
) -> Result<(), EncodeError> {
    let mut encoder = UbjsonEncoder::with_sink(*opts, sink);
    encoder.encode(value)?;
    encoder.finish()?;
    Ok(())
}

/// Decodes a single value from an in-memory byte slice.
pub fn decode_from_slice(input: &[u8], opts: DecodeOptions) -> Result<UbjsonValue, DecodeError> {
    UbjsonDecoder::new(SliceSource::new(input), opts).decode()
}

/// Decodes a single value from a reader.
///
/// Bytes read past the end of the value are lost; use
/// [`decode_from_seekable`] when the source can seek.
pub fn decode_from_reader<R: io::Read>(
    reader: R,
    opts: DecodeOptions,
) -> Result<UbjsonValue, DecodeError> {
    UbjsonDecoder::new(StreamSource::new(reader), opts).decode()
}

/// Decodes a single value from a seekable reader, leaving the stream
/// positioned right after the value's last byte.
pub fn decode_from_seekable<R: io::Read + io::Seek>(
    reader: R,
    opts: DecodeOptions,
) -> Result<UbjsonValue, DecodeError> {
    let mut decoder = UbjsonDecoder::new(SeekSource::new(reader), opts);
    let value = decoder.decode()?;
    let mut source = decoder.into_source();
    source.rewind().map_err(|e| DecodeError {
        kind: e.into(),
        offset: source.total_read(),
    })?;
    Ok(value)
}
