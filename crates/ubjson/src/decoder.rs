//! `UbjsonDecoder` — consumes a Draft-12 byte stream and rebuilds the
//! value tree.

use std::collections::HashSet;
use std::str::{self, FromStr};

use bigdecimal::BigDecimal;
use indexmap::IndexMap;
use ubjson_buffers::{floats, ByteSource};

use crate::error::{DecodeError, DecodeErrorKind};
use crate::markers::{
    is_container_value_type, ARRAY_END, ARRAY_START, CONTAINER_COUNT, CONTAINER_TYPE, OBJECT_END,
    OBJECT_START, TYPE_BOOL_FALSE, TYPE_BOOL_TRUE, TYPE_CHAR, TYPE_FLOAT32, TYPE_FLOAT64,
    TYPE_HIGH_PREC, TYPE_INT16, TYPE_INT32, TYPE_INT64, TYPE_INT8, TYPE_NOOP, TYPE_NULL,
    TYPE_STRING, TYPE_UINT8,
};
use crate::value::UbjsonValue;

/// Granularity for length-prefixed payload reads, so a forged length
/// cannot force a huge allocation before any payload bytes exist.
const PAYLOAD_CHUNK: usize = 64 * 1024;
/// Cap on speculative pre-allocation from wire counts.
const PREALLOC_LIMIT: usize = 64 * 1024;

/// Decoder configuration.
#[derive(Debug, Clone, Copy)]
pub struct DecodeOptions {
    /// Decode `[$U#` payloads as arrays of integers instead of bytes.
    pub no_bytes: bool,
    /// Reuse one canonical string per distinct object key.
    pub intern_object_keys: bool,
    /// Maximum container nesting depth.
    pub recursion_limit: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            no_bytes: false,
            intern_object_keys: false,
            recursion_limit: 1000,
        }
    }
}

/// Hook over a finished object; duplicate keys are already collapsed
/// (last value wins).
pub type ObjectHook = Box<dyn FnMut(IndexMap<String, UbjsonValue>) -> UbjsonValue>;

/// Hook over the raw key/value pairs in stream order, duplicates included.
/// Takes precedence over [`ObjectHook`] when both are installed.
pub type ObjectPairsHook = Box<dyn FnMut(Vec<(String, UbjsonValue)>) -> UbjsonValue>;

/// Parameters read from the optional `$type` / `#count` container header.
struct ContainerParams {
    /// Fixed element type, when the header carried `$`.
    fixed_type: Option<u8>,
    counting: bool,
    /// Element count when `counting`, 1 (unused) otherwise.
    count: i64,
    /// First marker for the element loop, when one exists.
    marker: Option<u8>,
}

/// Stateful UBJSON decoder over a [`ByteSource`].
pub struct UbjsonDecoder<S> {
    source: S,
    opts: DecodeOptions,
    object_hook: Option<ObjectHook>,
    object_pairs_hook: Option<ObjectPairsHook>,
    depth: usize,
    interned: HashSet<String>,
}

impl<S: ByteSource> UbjsonDecoder<S> {
    pub fn new(source: S, opts: DecodeOptions) -> Self {
        Self {
            source,
            opts,
            object_hook: None,
            object_pairs_hook: None,
            depth: 0,
            interned: HashSet::new(),
        }
    }

    /// Installs a hook that replaces every decoded object.
    pub fn with_object_hook(mut self, hook: ObjectHook) -> Self {
        self.object_hook = Some(hook);
        self
    }

    /// Installs a hook that receives every object's key/value pairs in
    /// stream order.
    pub fn with_object_pairs_hook(mut self, hook: ObjectPairsHook) -> Self {
        self.object_pairs_hook = Some(hook);
        self
    }

    /// Decodes a single value from the source.
    pub fn decode(&mut self) -> Result<UbjsonValue, DecodeError> {
        self.decode_value(None)
    }

    /// Consumes the decoder and returns the source, e.g. to rewind it.
    pub fn into_source(self) -> S {
        self.source
    }

    fn err(&self, kind: DecodeErrorKind) -> DecodeError {
        DecodeError {
            kind,
            offset: self.source.total_read(),
        }
    }

    /// Reads exactly `len` bytes of a small fixed-size item.
    fn read_exact(&mut self, len: usize, item: &'static str) -> Result<&[u8], DecodeError> {
        if len == 0 {
            return Ok(&[]);
        }
        let start = self.source.total_read();
        let raw = self.source.pull(len).map_err(|e| DecodeError {
            kind: e.into(),
            offset: start,
        })?;
        if raw.len() == len {
            return Ok(raw);
        }
        let kind = if raw.is_empty() {
            DecodeErrorKind::Insufficient(item)
        } else {
            DecodeErrorKind::InsufficientPartial(item)
        };
        Err(DecodeError {
            kind,
            offset: start,
        })
    }

    /// Reads a length-prefixed payload in bounded chunks.
    fn read_payload(&mut self, len: usize, item: &'static str) -> Result<Vec<u8>, DecodeError> {
        let start = self.source.total_read();
        let mut out = Vec::with_capacity(len.min(PREALLOC_LIMIT));
        let mut remaining = len;
        while remaining > 0 {
            let want = remaining.min(PAYLOAD_CHUNK);
            let raw = self.source.pull(want).map_err(|e| DecodeError {
                kind: e.into(),
                offset: start,
            })?;
            out.extend_from_slice(raw);
            remaining -= raw.len();
            if raw.len() < want {
                break;
            }
        }
        if out.len() < len {
            let kind = if out.is_empty() {
                DecodeErrorKind::Insufficient(item)
            } else {
                DecodeErrorKind::InsufficientPartial(item)
            };
            return Err(DecodeError {
                kind,
                offset: start,
            });
        }
        Ok(out)
    }

    fn read_marker(&mut self, item: &'static str) -> Result<u8, DecodeError> {
        Ok(self.read_exact(1, item)?[0])
    }

    fn read_int8(&mut self) -> Result<i64, DecodeError> {
        Ok(i64::from(self.read_exact(1, "int8")?[0] as i8))
    }

    fn read_uint8(&mut self) -> Result<i64, DecodeError> {
        Ok(i64::from(self.read_exact(1, "uint8")?[0]))
    }

    fn read_int16(&mut self) -> Result<i64, DecodeError> {
        let raw = self.read_exact(2, "int16")?;
        Ok(i64::from(i16::from_be_bytes([raw[0], raw[1]])))
    }

    fn read_int32(&mut self) -> Result<i64, DecodeError> {
        let raw = self.read_exact(4, "int32")?;
        Ok(i64::from(i32::from_be_bytes([
            raw[0], raw[1], raw[2], raw[3],
        ])))
    }

    fn read_int64(&mut self) -> Result<i64, DecodeError> {
        let raw = self.read_exact(8, "int64")?;
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(raw);
        Ok(i64::from_be_bytes(bytes))
    }

    /// The length integer following `H`, `S`, `#` and object keys.
    fn read_length(&mut self, given: Option<u8>) -> Result<i64, DecodeError> {
        let marker = match given {
            Some(m) => m,
            None => self.read_marker("Length marker")?,
        };
        let value = match marker {
            TYPE_INT8 => self.read_int8()?,
            TYPE_UINT8 => self.read_uint8()?,
            TYPE_INT16 => self.read_int16()?,
            TYPE_INT32 => self.read_int32()?,
            TYPE_INT64 => self.read_int64()?,
            _ => return Err(self.err(DecodeErrorKind::IntegerMarkerExpected)),
        };
        if value < 0 {
            return Err(self.err(DecodeErrorKind::NegativeLength));
        }
        Ok(value)
    }

    fn read_float32(&mut self) -> Result<f32, DecodeError> {
        let raw = self.read_exact(4, "float32")?;
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(raw);
        Ok(floats::unpack4(bytes, false) as f32)
    }

    fn read_float64(&mut self) -> Result<f64, DecodeError> {
        let raw = self.read_exact(8, "float64")?;
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(raw);
        Ok(floats::unpack8(bytes, false))
    }

    fn read_high_prec(&mut self) -> Result<UbjsonValue, DecodeError> {
        let length = self.read_length(None)? as usize;
        let raw = self.read_payload(length, "highprec")?;
        let text = str::from_utf8(&raw)
            .map_err(|_| self.err(DecodeErrorKind::InvalidUtf8("highprec")))?;
        let dec = BigDecimal::from_str(text)
            .map_err(|_| self.err(DecodeErrorKind::InvalidHighPrec))?;
        Ok(UbjsonValue::HighPrec(dec))
    }

    /// `C` yields a one-codepoint string; the single byte must be ASCII
    /// (the only code points whose UTF-8 form is one byte).
    fn read_char(&mut self) -> Result<UbjsonValue, DecodeError> {
        let byte = self.read_exact(1, "char")?[0];
        if !byte.is_ascii() {
            return Err(self.err(DecodeErrorKind::InvalidUtf8("char")));
        }
        Ok(UbjsonValue::Str((byte as char).to_string()))
    }

    fn read_string(&mut self) -> Result<UbjsonValue, DecodeError> {
        let length = self.read_length(None)? as usize;
        if length == 0 {
            return Ok(UbjsonValue::Str(String::new()));
        }
        let raw = self.read_payload(length, "string")?;
        let text = String::from_utf8(raw)
            .map_err(|_| self.err(DecodeErrorKind::InvalidUtf8("string")))?;
        Ok(UbjsonValue::Str(text))
    }

    /// Object key: like a string but with no `S` marker. Any failure is
    /// reported as a key failure.
    fn read_object_key(
        &mut self,
        marker: u8,
        context: &'static str,
    ) -> Result<String, DecodeError> {
        self.read_object_key_inner(marker)
            .map_err(|e| DecodeError {
                kind: DecodeErrorKind::InvalidKey(context),
                offset: e.offset,
            })
    }

    fn read_object_key_inner(&mut self, marker: u8) -> Result<String, DecodeError> {
        let length = self.read_length(Some(marker))? as usize;
        let raw = self.read_payload(length, "string")?;
        let text =
            str::from_utf8(&raw).map_err(|_| self.err(DecodeErrorKind::InvalidUtf8("string")))?;
        if self.opts.intern_object_keys {
            if let Some(existing) = self.interned.get(text) {
                return Ok(existing.clone());
            }
            let owned = text.to_owned();
            self.interned.insert(owned.clone());
            return Ok(owned);
        }
        Ok(text.to_owned())
    }

    /// Reads the optional `$type` / `#count` header of a container.
    fn container_params(&mut self, in_mapping: bool) -> Result<ContainerParams, DecodeError> {
        let mut marker = self.read_marker("container type, count or 1st key/value type")?;

        // fixed type for all values
        let fixed_type = if marker == CONTAINER_TYPE {
            let fixed = self.read_marker("container type")?;
            if !is_container_value_type(fixed) {
                return Err(self.err(DecodeErrorKind::InvalidContainerType));
            }
            marker = self.read_marker("container count or 1st key/value type")?;
            Some(fixed)
        } else {
            None
        };

        // container value count
        if marker == CONTAINER_COUNT {
            let count = self.read_length(None)?;
            // Reading ahead just to capture the first marker, which is not
            // in the stream when the type is fixed.
            let first = if count > 0 && (in_mapping || fixed_type.is_none()) {
                Some(self.read_marker("1st key/value type")?)
            } else {
                fixed_type
            };
            Ok(ContainerParams {
                fixed_type,
                counting: true,
                count,
                marker: first,
            })
        } else if fixed_type.is_none() {
            Ok(ContainerParams {
                fixed_type,
                counting: false,
                count: 1,
                marker: Some(marker),
            })
        } else {
            Err(self.err(DecodeErrorKind::TypeWithoutCount))
        }
    }

    fn read_array(&mut self) -> Result<UbjsonValue, DecodeError> {
        let params = self.container_params(false)?;

        if params.counting {
            let count = params.count as usize;
            // special case - byte array
            if params.fixed_type == Some(TYPE_UINT8) && !self.opts.no_bytes {
                let raw = self.read_payload(count, "bytes array")?;
                return Ok(UbjsonValue::Bytes(raw));
            }
            // special case - no data types
            if let Some(value) = params.fixed_type.and_then(no_data_value) {
                return Ok(UbjsonValue::Array(vec![value; count]));
            }

            let mut items = Vec::with_capacity(count.min(PREALLOC_LIMIT));
            let mut pending = params.marker;
            let mut remaining = count;
            while remaining > 0 {
                let marker = match pending.take() {
                    Some(m) => m,
                    None => self.read_marker("array value type marker (sized)")?,
                };
                if marker == TYPE_NOOP {
                    // filler, not counted
                    continue;
                }
                items.push(self.decode_value(Some(marker))?);
                remaining -= 1;
                if remaining > 0 {
                    pending = params.fixed_type;
                }
            }
            return Ok(UbjsonValue::Array(items));
        }

        // unsized arrays never carry a fixed type
        let mut items = Vec::new();
        let mut marker = match params.marker {
            Some(m) => m,
            None => self.read_marker("array value type marker")?,
        };
        while marker != ARRAY_END {
            if marker == TYPE_NOOP {
                marker = self.read_marker("array value type marker (after no-op)")?;
                continue;
            }
            items.push(self.decode_value(Some(marker))?);
            marker = self.read_marker("array value type marker")?;
        }
        Ok(UbjsonValue::Array(items))
    }

    fn read_object(&mut self) -> Result<UbjsonValue, DecodeError> {
        let params = self.container_params(true)?;
        let capacity = (params.count.max(0) as usize).min(PREALLOC_LIMIT);
        let mut map = IndexMap::with_capacity(capacity);

        // special case: no data values (keys only)
        if params.counting {
            if let Some(value) = params.fixed_type.and_then(no_data_value) {
                let mut remaining = params.count;
                let mut marker = params.marker.unwrap_or(OBJECT_END);
                while remaining > 0 {
                    let key = self.read_object_key(marker, "sized, no data")?;
                    map.insert(key, value.clone());
                    remaining -= 1;
                    if remaining > 0 {
                        marker = self.read_marker("object key length")?;
                    }
                }
                return Ok(self.finish_object(map));
            }
        }

        let mut remaining = params.count;
        let mut marker = params.marker.unwrap_or(OBJECT_END);
        while remaining > 0 && (params.counting || marker != OBJECT_END) {
            if marker == TYPE_NOOP {
                marker = self.read_marker("object key length")?;
                continue;
            }
            let key = self.read_object_key(marker, "sized/unsized")?;
            let value = self.decode_value(params.fixed_type)?;
            // last write wins, position of the first occurrence kept
            map.insert(key, value);
            if params.counting {
                remaining -= 1;
            }
            if remaining > 0 {
                marker = self.read_marker("object key length")?;
            }
        }
        Ok(self.finish_object(map))
    }

    fn finish_object(&mut self, map: IndexMap<String, UbjsonValue>) -> UbjsonValue {
        match self.object_hook.as_mut() {
            Some(hook) => hook(map),
            None => UbjsonValue::Object(map),
        }
    }

    /// Same traversal as [`read_object`](Self::read_object), but keeps
    /// every pair in stream order for the pairs hook.
    fn read_object_pairs(&mut self) -> Result<Vec<(String, UbjsonValue)>, DecodeError> {
        let params = self.container_params(true)?;
        let capacity = (params.count.max(0) as usize).min(PREALLOC_LIMIT);
        let mut pairs = Vec::with_capacity(capacity);

        if params.counting {
            // special case: no data values (keys only)
            if let Some(value) = params.fixed_type.and_then(no_data_value) {
                let mut remaining = params.count;
                let mut marker = params.marker.unwrap_or(OBJECT_END);
                while remaining > 0 {
                    let key = self.read_object_key(marker, "sized, no data")?;
                    pairs.push((key, value.clone()));
                    remaining -= 1;
                    if remaining > 0 {
                        marker = self.read_marker("object key length")?;
                    }
                }
                return Ok(pairs);
            }

            let mut remaining = params.count;
            let mut marker = params.marker.unwrap_or(OBJECT_END);
            while remaining > 0 {
                if marker == TYPE_NOOP {
                    marker = self.read_marker("object key length (sized, after no-op)")?;
                    continue;
                }
                let key = self.read_object_key(marker, "sized")?;
                let value = self.decode_value(params.fixed_type)?;
                pairs.push((key, value));
                remaining -= 1;
                if remaining > 0 {
                    marker = self.read_marker("object key length (sized)")?;
                }
            }
            return Ok(pairs);
        }

        let mut marker = params.marker.unwrap_or(OBJECT_END);
        while marker != OBJECT_END {
            if marker == TYPE_NOOP {
                marker = self.read_marker("object key length (after no-op)")?;
                continue;
            }
            let key = self.read_object_key(marker, "unsized")?;
            let value = self.decode_value(params.fixed_type)?;
            pairs.push((key, value));
            marker = self.read_marker("object key length")?;
        }
        Ok(pairs)
    }

    fn enter(&mut self, what: &'static str) -> Result<(), DecodeError> {
        if self.depth >= self.opts.recursion_limit {
            return Err(self.err(DecodeErrorKind::RecursionLimit(what)));
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn decode_value(&mut self, given: Option<u8>) -> Result<UbjsonValue, DecodeError> {
        let marker = match given {
            Some(m) => m,
            None => self.read_marker("Type marker")?,
        };
        match marker {
            TYPE_NULL => Ok(UbjsonValue::Null),
            TYPE_BOOL_TRUE => Ok(UbjsonValue::Bool(true)),
            TYPE_BOOL_FALSE => Ok(UbjsonValue::Bool(false)),
            TYPE_CHAR => self.read_char(),
            TYPE_STRING => self.read_string(),
            TYPE_INT8 => Ok(UbjsonValue::Int(self.read_int8()?)),
            TYPE_UINT8 => Ok(UbjsonValue::Int(self.read_uint8()?)),
            TYPE_INT16 => Ok(UbjsonValue::Int(self.read_int16()?)),
            TYPE_INT32 => Ok(UbjsonValue::Int(self.read_int32()?)),
            TYPE_INT64 => Ok(UbjsonValue::Int(self.read_int64()?)),
            TYPE_FLOAT32 => Ok(UbjsonValue::Float32(self.read_float32()?)),
            TYPE_FLOAT64 => Ok(UbjsonValue::Float64(self.read_float64()?)),
            TYPE_HIGH_PREC => self.read_high_prec(),
            ARRAY_START => {
                self.enter("array")?;
                let result = self.read_array();
                self.leave();
                result
            }
            OBJECT_START => {
                self.enter("object")?;
                let result = if self.object_pairs_hook.is_some() {
                    self.read_object_pairs().map(|pairs| {
                        match self.object_pairs_hook.as_mut() {
                            Some(hook) => hook(pairs),
                            None => UbjsonValue::Object(pairs.into_iter().collect()),
                        }
                    })
                } else {
                    self.read_object()
                };
                self.leave();
                result
            }
            other => Err(self.err(DecodeErrorKind::InvalidMarker(other))),
        }
    }
}

/// Values of the three markers that carry no payload.
fn no_data_value(fixed_type: u8) -> Option<UbjsonValue> {
    match fixed_type {
        TYPE_NULL => Some(UbjsonValue::Null),
        TYPE_BOOL_TRUE => Some(UbjsonValue::Bool(true)),
        TYPE_BOOL_FALSE => Some(UbjsonValue::Bool(false)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ubjson_buffers::SliceSource;

    fn decode(input: &[u8]) -> Result<UbjsonValue, DecodeError> {
        UbjsonDecoder::new(SliceSource::new(input), DecodeOptions::default()).decode()
    }

    #[test]
    fn test_scalar_markers() {
        assert_eq!(decode(b"Z").unwrap(), UbjsonValue::Null);
        assert_eq!(decode(b"T").unwrap(), UbjsonValue::Bool(true));
        assert_eq!(decode(b"F").unwrap(), UbjsonValue::Bool(false));
        assert_eq!(decode(&[b'U', 0xff]).unwrap(), UbjsonValue::Int(255));
        assert_eq!(decode(&[b'i', 0xff]).unwrap(), UbjsonValue::Int(-1));
    }

    #[test]
    fn test_sign_extension() {
        assert_eq!(
            decode(&[b'I', 0x80, 0x00]).unwrap(),
            UbjsonValue::Int(-32768)
        );
        assert_eq!(
            decode(&[b'l', 0xff, 0xff, 0x7f, 0xff]).unwrap(),
            UbjsonValue::Int(-32769)
        );
        assert_eq!(
            decode(&[b'L', 0x80, 0, 0, 0, 0, 0, 0, 0]).unwrap(),
            UbjsonValue::Int(i64::MIN)
        );
    }

    #[test]
    fn test_char_requires_ascii() {
        assert_eq!(
            decode(&[b'C', b'A']).unwrap(),
            UbjsonValue::Str("A".to_owned())
        );
        let err = decode(&[b'C', 0x80]).unwrap_err();
        assert!(matches!(err.kind, DecodeErrorKind::InvalidUtf8("char")));
    }

    #[test]
    fn test_top_level_noop_is_invalid() {
        let err = decode(b"N").unwrap_err();
        assert!(matches!(err.kind, DecodeErrorKind::InvalidMarker(b'N')));
    }

    #[test]
    fn test_empty_input() {
        let err = decode(b"").unwrap_err();
        assert!(matches!(err.kind, DecodeErrorKind::Insufficient("Type marker")));
        assert_eq!(err.offset, 0);
    }

    #[test]
    fn test_length_must_be_integer_marker() {
        let err = decode(b"SZ").unwrap_err();
        assert!(matches!(err.kind, DecodeErrorKind::IntegerMarkerExpected));
    }

    #[test]
    fn test_negative_length() {
        let err = decode(&[b'S', b'i', 0xff]).unwrap_err();
        assert!(matches!(err.kind, DecodeErrorKind::NegativeLength));
    }

    #[test]
    fn test_noop_skipped_inside_containers() {
        assert_eq!(decode(b"[N]").unwrap(), UbjsonValue::Array(vec![]));
        assert_eq!(
            decode(&[b'[', b'N', b'i', 1, b'N', b'i', 2, b']']).unwrap(),
            UbjsonValue::Array(vec![UbjsonValue::Int(1), UbjsonValue::Int(2)])
        );
    }

    #[test]
    fn test_counted_array_with_noop_filler() {
        // count 2, untyped, with a no-op between the elements
        let input = [b'[', b'#', b'U', 2, b'N', b'i', 1, b'i', 2];
        assert_eq!(
            decode(&input).unwrap(),
            UbjsonValue::Array(vec![UbjsonValue::Int(1), UbjsonValue::Int(2)])
        );
    }

    #[test]
    fn test_fixed_type_without_count_fails() {
        let err = decode(&[b'[', b'$', b'i', b'Z']).unwrap_err();
        assert!(matches!(err.kind, DecodeErrorKind::TypeWithoutCount));
    }

    #[test]
    fn test_invalid_fixed_type() {
        let err = decode(&[b'[', b'$', b'$']).unwrap_err();
        assert!(matches!(err.kind, DecodeErrorKind::InvalidContainerType));
        // A no-op fixed type is rejected too.
        let err = decode(&[b'[', b'$', b'N']).unwrap_err();
        assert!(matches!(err.kind, DecodeErrorKind::InvalidContainerType));
    }

    #[test]
    fn test_fixed_no_data_containers() {
        assert_eq!(
            decode(&[b'[', b'$', b'Z', b'#', b'U', 3]).unwrap(),
            UbjsonValue::Array(vec![UbjsonValue::Null; 3])
        );
        assert_eq!(
            decode(&[b'[', b'$', b'T', b'#', b'U', 2]).unwrap(),
            UbjsonValue::Array(vec![UbjsonValue::Bool(true); 2])
        );
    }

    #[test]
    fn test_fixed_typed_counted_array() {
        let input = [b'[', b'$', b'i', b'#', b'U', 3, 1, 2, 0xff];
        assert_eq!(
            decode(&input).unwrap(),
            UbjsonValue::Array(vec![
                UbjsonValue::Int(1),
                UbjsonValue::Int(2),
                UbjsonValue::Int(-1),
            ])
        );
    }

    #[test]
    fn test_empty_counted_containers() {
        assert_eq!(
            decode(&[b'[', b'#', b'U', 0]).unwrap(),
            UbjsonValue::Array(vec![])
        );
        assert_eq!(
            decode(&[b'{', b'#', b'U', 0]).unwrap(),
            UbjsonValue::Object(IndexMap::new())
        );
        // Fixed type with a zero count reads no further bytes.
        assert_eq!(
            decode(&[b'[', b'$', b'i', b'#', b'U', 0]).unwrap(),
            UbjsonValue::Array(vec![])
        );
    }

    #[test]
    fn test_object_fixed_value_type() {
        // {$i#U2 "a" 1 "b" 2} — values carry no per-value marker
        let input = [
            b'{', b'$', b'i', b'#', b'U', 2, b'U', 1, b'a', 1, b'U', 1, b'b', 2,
        ];
        let expected: IndexMap<String, UbjsonValue> = [
            ("a".to_owned(), UbjsonValue::Int(1)),
            ("b".to_owned(), UbjsonValue::Int(2)),
        ]
        .into_iter()
        .collect();
        assert_eq!(decode(&input).unwrap(), UbjsonValue::Object(expected));
    }

    #[test]
    fn test_object_keys_only_no_data() {
        let input = [b'{', b'$', b'T', b'#', b'U', 2, b'U', 1, b'x', b'U', 1, b'y'];
        let expected: IndexMap<String, UbjsonValue> = [
            ("x".to_owned(), UbjsonValue::Bool(true)),
            ("y".to_owned(), UbjsonValue::Bool(true)),
        ]
        .into_iter()
        .collect();
        assert_eq!(decode(&input).unwrap(), UbjsonValue::Object(expected));
    }

    #[test]
    fn test_duplicate_keys_last_write_wins() {
        // {"k": 1, "k": 2}
        let input = [
            b'{', b'U', 1, b'k', b'i', 1, b'U', 1, b'k', b'i', 2, b'}',
        ];
        let decoded = decode(&input).unwrap();
        let expected: IndexMap<String, UbjsonValue> =
            [("k".to_owned(), UbjsonValue::Int(2))].into_iter().collect();
        assert_eq!(decoded, UbjsonValue::Object(expected));
    }

    #[test]
    fn test_recursion_limit() {
        let mut input = vec![b'['; 32];
        input.extend_from_slice(&[b']'; 32]);
        let opts = DecodeOptions {
            recursion_limit: 8,
            ..DecodeOptions::default()
        };
        let err = UbjsonDecoder::new(SliceSource::new(&input), opts)
            .decode()
            .unwrap_err();
        assert!(matches!(err.kind, DecodeErrorKind::RecursionLimit("array")));
    }

    #[test]
    fn test_key_interning_reuses_spelling() {
        // [{"k":Z}, {"k":Z}] with interning on
        let input = [
            b'[', b'{', b'U', 1, b'k', b'Z', b'}', b'{', b'U', 1, b'k', b'Z', b'}', b']',
        ];
        let opts = DecodeOptions {
            intern_object_keys: true,
            ..DecodeOptions::default()
        };
        let decoded = UbjsonDecoder::new(SliceSource::new(&input), opts)
            .decode()
            .unwrap();
        if let UbjsonValue::Array(items) = decoded {
            assert_eq!(items.len(), 2);
            for item in items {
                assert!(matches!(item, UbjsonValue::Object(map) if map.contains_key("k")));
            }
        } else {
            panic!("expected array");
        }
    }
}
