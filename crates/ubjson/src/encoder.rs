//! `UbjsonEncoder` — walks a value tree and emits the Draft-12 byte stream.

use std::collections::HashSet;
use std::io::Write as IoWrite;

use bigdecimal::BigDecimal;
use indexmap::IndexMap;
use ubjson_buffers::{floats, Writer};

use crate::error::EncodeError;
use crate::markers::{
    ARRAY_END, ARRAY_START, CONTAINER_COUNT, CONTAINER_TYPE, OBJECT_END, OBJECT_START,
    TYPE_BOOL_FALSE, TYPE_BOOL_TRUE, TYPE_CHAR, TYPE_FLOAT32, TYPE_FLOAT64, TYPE_HIGH_PREC,
    TYPE_INT16, TYPE_INT32, TYPE_INT64, TYPE_INT8, TYPE_NULL, TYPE_STRING, TYPE_UINT8,
};
use crate::value::UbjsonValue;

/// Single-precision range within which finite doubles may be narrowed.
const FLOAT32_MIN_ABS: f64 = 1.18e-38;
const FLOAT32_MAX_ABS: f64 = 3.4e38;

/// Prefix of the byte-array shorthand `[$U#`.
const BYTES_ARRAY_PREFIX: [u8; 4] = [ARRAY_START, CONTAINER_TYPE, TYPE_UINT8, CONTAINER_COUNT];

/// Encoder configuration.
#[derive(Debug, Clone, Copy)]
pub struct EncodeOptions {
    /// Emit `#`-count headers for arrays and objects, omitting the closing
    /// delimiter.
    pub container_count: bool,
    /// Sort object keys by their UTF-8 bytes.
    pub sort_keys: bool,
    /// Never narrow finite non-zero doubles to float32.
    pub no_float32: bool,
    /// Maximum container nesting depth.
    pub recursion_limit: usize,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            container_count: false,
            sort_keys: false,
            no_float32: true,
            recursion_limit: 1000,
        }
    }
}

/// Stateful UBJSON encoder over a [`Writer`].
pub struct UbjsonEncoder<'a> {
    writer: Writer<'a>,
    opts: EncodeOptions,
    /// Identities of the containers on the active traversal path.
    seen: HashSet<usize>,
    depth: usize,
}

impl<'a> UbjsonEncoder<'a> {
    /// Creates an encoder that accumulates bytes in memory.
    pub fn new(opts: EncodeOptions) -> Self {
        Self {
            writer: Writer::new(),
            opts,
            seen: HashSet::new(),
            depth: 0,
        }
    }

    /// Creates an encoder that streams through `sink`.
    pub fn with_sink(opts: EncodeOptions, sink: &'a mut dyn IoWrite) -> Self {
        Self {
            writer: Writer::with_sink(sink),
            opts,
            seen: HashSet::new(),
            depth: 0,
        }
    }

    /// Encodes one value into the underlying buffer.
    pub fn encode(&mut self, value: &UbjsonValue) -> Result<(), EncodeError> {
        self.write_any(value)
    }

    /// Finalises the buffer. Returns the encoded bytes when not sinked,
    /// an empty vector otherwise (the sink has received everything).
    pub fn finish(self) -> Result<Vec<u8>, EncodeError> {
        Ok(self.writer.finish()?)
    }

    fn write_any(&mut self, value: &UbjsonValue) -> Result<(), EncodeError> {
        match value {
            UbjsonValue::Null => Ok(self.writer.u8(TYPE_NULL)?),
            UbjsonValue::Bool(true) => Ok(self.writer.u8(TYPE_BOOL_TRUE)?),
            UbjsonValue::Bool(false) => Ok(self.writer.u8(TYPE_BOOL_FALSE)?),
            UbjsonValue::Int(num) => self.write_int(*num),
            UbjsonValue::HighPrec(dec) => self.write_high_prec(dec),
            UbjsonValue::Float32(num) => self.write_float32(*num),
            UbjsonValue::Float64(num) => self.write_float64(*num),
            UbjsonValue::Char(c) => self.write_char(*c),
            UbjsonValue::Str(s) => self.write_str(s),
            UbjsonValue::Bytes(buf) => self.write_bytes(buf),
            UbjsonValue::Array(items) => {
                self.write_array(value as *const UbjsonValue as usize, items)
            }
            UbjsonValue::Object(map) => {
                self.write_object(value as *const UbjsonValue as usize, map)
            }
        }
    }

    /// Writes `num` with the narrowest integer marker whose range holds it.
    fn write_int(&mut self, num: i64) -> Result<(), EncodeError> {
        if (0..=0xff).contains(&num) {
            self.writer.write(&[TYPE_UINT8, num as u8])?;
        } else if (-0x80..0).contains(&num) {
            self.writer.write(&[TYPE_INT8, num as i8 as u8])?;
        } else if (-0x8000..0x8000).contains(&num) {
            let payload = (num as i16).to_be_bytes();
            self.writer.write(&[TYPE_INT16, payload[0], payload[1]])?;
        } else if (-0x8000_0000..0x8000_0000).contains(&num) {
            let mut out = [TYPE_INT32; 5];
            out[1..].copy_from_slice(&(num as i32).to_be_bytes());
            self.writer.write(&out)?;
        } else {
            let mut out = [TYPE_INT64; 9];
            out[1..].copy_from_slice(&num.to_be_bytes());
            self.writer.write(&out)?;
        }
        Ok(())
    }

    fn write_count(&mut self, len: usize) -> Result<(), EncodeError> {
        self.write_int(len as i64)
    }

    fn write_float32(&mut self, num: f32) -> Result<(), EncodeError> {
        if !num.is_finite() {
            return Ok(self.writer.u8(TYPE_NULL)?);
        }
        let mut out = [TYPE_FLOAT32; 5];
        out[1..].copy_from_slice(&num.to_be_bytes());
        Ok(self.writer.write(&out)?)
    }

    fn write_float64(&mut self, num: f64) -> Result<(), EncodeError> {
        if !num.is_finite() {
            return Ok(self.writer.u8(TYPE_NULL)?);
        }
        if num == 0.0 {
            return self.write_float64_as_float32(num);
        }
        if num.is_subnormal() {
            // Exact decimal expansion of the double's binary value.
            return match BigDecimal::try_from(num) {
                Ok(dec) => self.write_high_prec(&dec),
                Err(_) => Ok(self.writer.u8(TYPE_NULL)?),
            };
        }
        let abs = num.abs();
        if !self.opts.no_float32 && (FLOAT32_MIN_ABS..=FLOAT32_MAX_ABS).contains(&abs) {
            self.write_float64_as_float32(num)
        } else {
            let mut out = [TYPE_FLOAT64; 9];
            let mut payload = [0u8; 8];
            floats::pack8(num, &mut payload, false);
            out[1..].copy_from_slice(&payload);
            Ok(self.writer.write(&out)?)
        }
    }

    fn write_float64_as_float32(&mut self, num: f64) -> Result<(), EncodeError> {
        let mut out = [TYPE_FLOAT32; 5];
        let mut payload = [0u8; 4];
        floats::pack4(num, &mut payload, false).map_err(|_| EncodeError::Float32Overflow)?;
        out[1..].copy_from_slice(&payload);
        Ok(self.writer.write(&out)?)
    }

    fn write_high_prec(&mut self, dec: &BigDecimal) -> Result<(), EncodeError> {
        let text = dec.to_string();
        self.writer.u8(TYPE_HIGH_PREC)?;
        self.write_count(text.len())?;
        Ok(self.writer.write(text.as_bytes())?)
    }

    fn write_char(&mut self, c: char) -> Result<(), EncodeError> {
        if c.is_ascii() {
            return Ok(self.writer.write(&[TYPE_CHAR, c as u8])?);
        }
        let mut buf = [0u8; 4];
        self.write_str(c.encode_utf8(&mut buf))
    }

    /// One-byte strings take the `C` shorthand, everything else `S`.
    fn write_str(&mut self, s: &str) -> Result<(), EncodeError> {
        let raw = s.as_bytes();
        if raw.len() == 1 {
            return Ok(self.writer.write(&[TYPE_CHAR, raw[0]])?);
        }
        self.writer.u8(TYPE_STRING)?;
        self.write_count(raw.len())?;
        Ok(self.writer.write(raw)?)
    }

    /// Object key: length then UTF-8 bytes, no type marker.
    fn write_key(&mut self, key: &str) -> Result<(), EncodeError> {
        let raw = key.as_bytes();
        self.write_count(raw.len())?;
        Ok(self.writer.write(raw)?)
    }

    fn write_bytes(&mut self, buf: &[u8]) -> Result<(), EncodeError> {
        self.writer.write(&BYTES_ARRAY_PREFIX)?;
        self.write_count(buf.len())?;
        // no ARRAY_END since the count was given
        Ok(self.writer.write(buf)?)
    }

    fn enter(&mut self, ident: usize, what: &'static str) -> Result<(), EncodeError> {
        if !self.seen.insert(ident) {
            return Err(EncodeError::CircularReference);
        }
        if self.depth >= self.opts.recursion_limit {
            return Err(EncodeError::RecursionLimit(what));
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self, ident: usize) {
        self.seen.remove(&ident);
        self.depth -= 1;
    }

    fn write_array(&mut self, ident: usize, items: &[UbjsonValue]) -> Result<(), EncodeError> {
        self.enter(ident, "array")?;
        self.writer.u8(ARRAY_START)?;
        if self.opts.container_count {
            self.writer.u8(CONTAINER_COUNT)?;
            self.write_count(items.len())?;
        }
        for item in items {
            self.write_any(item)?;
        }
        if !self.opts.container_count {
            self.writer.u8(ARRAY_END)?;
        }
        self.leave(ident);
        Ok(())
    }

    fn write_object(
        &mut self,
        ident: usize,
        map: &IndexMap<String, UbjsonValue>,
    ) -> Result<(), EncodeError> {
        self.enter(ident, "object")?;
        self.writer.u8(OBJECT_START)?;
        if self.opts.container_count {
            self.writer.u8(CONTAINER_COUNT)?;
            self.write_count(map.len())?;
        }
        if self.opts.sort_keys {
            let mut items: Vec<(&String, &UbjsonValue)> = map.iter().collect();
            items.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
            for (key, value) in items {
                self.write_key(key)?;
                self.write_any(value)?;
            }
        } else {
            for (key, value) in map {
                self.write_key(key)?;
                self.write_any(value)?;
            }
        }
        if !self.opts.container_count {
            self.writer.u8(OBJECT_END)?;
        }
        self.leave(ident);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(value: &UbjsonValue) -> Vec<u8> {
        let mut encoder = UbjsonEncoder::new(EncodeOptions::default());
        encoder.encode(value).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_minimal_integer_markers() {
        assert_eq!(encode(&UbjsonValue::Int(0))[0], TYPE_UINT8);
        assert_eq!(encode(&UbjsonValue::Int(255))[0], TYPE_UINT8);
        assert_eq!(encode(&UbjsonValue::Int(-1))[0], TYPE_INT8);
        assert_eq!(encode(&UbjsonValue::Int(-128))[0], TYPE_INT8);
        assert_eq!(encode(&UbjsonValue::Int(256))[0], TYPE_INT16);
        assert_eq!(encode(&UbjsonValue::Int(-129))[0], TYPE_INT16);
        assert_eq!(encode(&UbjsonValue::Int(32768))[0], TYPE_INT32);
        assert_eq!(encode(&UbjsonValue::Int(-32769))[0], TYPE_INT32);
        assert_eq!(encode(&UbjsonValue::Int(1 << 31))[0], TYPE_INT64);
        assert_eq!(encode(&UbjsonValue::Int(i64::MIN))[0], TYPE_INT64);
    }

    #[test]
    fn test_nonfinite_floats_become_null() {
        assert_eq!(encode(&UbjsonValue::Float64(f64::NAN)), [TYPE_NULL]);
        assert_eq!(encode(&UbjsonValue::Float64(f64::INFINITY)), [TYPE_NULL]);
        assert_eq!(encode(&UbjsonValue::Float32(f32::NAN)), [TYPE_NULL]);
    }

    #[test]
    fn test_zero_emits_float32() {
        assert_eq!(
            encode(&UbjsonValue::Float64(0.0)),
            [TYPE_FLOAT32, 0, 0, 0, 0]
        );
        assert_eq!(
            encode(&UbjsonValue::Float64(-0.0)),
            [TYPE_FLOAT32, 0x80, 0, 0, 0]
        );
    }

    #[test]
    fn test_subnormal_promotes_to_high_prec() {
        let out = encode(&UbjsonValue::Float64(f64::MIN_POSITIVE / 2.0));
        assert_eq!(out[0], TYPE_HIGH_PREC);
    }

    #[test]
    fn test_no_float32_default_keeps_double() {
        assert_eq!(encode(&UbjsonValue::Float64(1.5))[0], TYPE_FLOAT64);
        let mut encoder = UbjsonEncoder::new(EncodeOptions {
            no_float32: false,
            ..EncodeOptions::default()
        });
        encoder.encode(&UbjsonValue::Float64(1.5)).unwrap();
        assert_eq!(encoder.finish().unwrap()[0], TYPE_FLOAT32);
    }

    #[test]
    fn test_active_path_identity_is_rejected() {
        let mut encoder = UbjsonEncoder::new(EncodeOptions::default());
        encoder.enter(0x1000, "array").unwrap();
        match encoder.enter(0x1000, "array") {
            Err(EncodeError::CircularReference) => {}
            other => panic!("expected circular reference, got {other:?}"),
        }
        // A sibling identity is fine once the first one is left.
        encoder.leave(0x1000);
        encoder.enter(0x1000, "array").unwrap();
    }

    #[test]
    fn test_recursion_limit() {
        let mut value = UbjsonValue::Null;
        for _ in 0..40 {
            value = UbjsonValue::Array(vec![value]);
        }
        let mut encoder = UbjsonEncoder::new(EncodeOptions {
            recursion_limit: 16,
            ..EncodeOptions::default()
        });
        match encoder.encode(&value) {
            Err(EncodeError::RecursionLimit("array")) => {}
            other => panic!("expected recursion limit, got {other:?}"),
        }
    }

    #[test]
    fn test_nested_shared_shape_is_not_circular() {
        // Two structurally identical empty arrays are distinct nodes.
        let value = UbjsonValue::Array(vec![
            UbjsonValue::Array(vec![]),
            UbjsonValue::Array(vec![]),
        ]);
        assert_eq!(
            encode(&value),
            [
                ARRAY_START, ARRAY_START, ARRAY_END, ARRAY_START, ARRAY_END, ARRAY_END
            ]
        );
    }
}
