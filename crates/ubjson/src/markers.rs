//! UBJSON Draft-12 wire markers.
//!
//! Every value on the wire starts with one of these single-byte tags.

pub const TYPE_NULL: u8 = b'Z';
pub const TYPE_NOOP: u8 = b'N';
pub const TYPE_BOOL_TRUE: u8 = b'T';
pub const TYPE_BOOL_FALSE: u8 = b'F';
pub const TYPE_INT8: u8 = b'i';
pub const TYPE_UINT8: u8 = b'U';
pub const TYPE_INT16: u8 = b'I';
pub const TYPE_INT32: u8 = b'l';
pub const TYPE_INT64: u8 = b'L';
pub const TYPE_FLOAT32: u8 = b'd';
pub const TYPE_FLOAT64: u8 = b'D';
pub const TYPE_HIGH_PREC: u8 = b'H';
pub const TYPE_CHAR: u8 = b'C';
pub const TYPE_STRING: u8 = b'S';
// Container delimiters
pub const OBJECT_START: u8 = b'{';
pub const OBJECT_END: u8 = b'}';
pub const ARRAY_START: u8 = b'[';
pub const ARRAY_END: u8 = b']';
// Optional container parameters
pub const CONTAINER_TYPE: u8 = b'$';
pub const CONTAINER_COUNT: u8 = b'#';

/// Whether `marker` may follow `$` as the fixed type of a container.
///
/// The no-op marker is excluded: a no-op fixed type would leave the
/// element loop with nothing to decode.
pub fn is_container_value_type(marker: u8) -> bool {
    matches!(
        marker,
        TYPE_NULL
            | TYPE_BOOL_TRUE
            | TYPE_BOOL_FALSE
            | TYPE_CHAR
            | TYPE_STRING
            | TYPE_INT8
            | TYPE_UINT8
            | TYPE_INT16
            | TYPE_INT32
            | TYPE_INT64
            | TYPE_FLOAT32
            | TYPE_FLOAT64
            | TYPE_HIGH_PREC
            | ARRAY_START
            | OBJECT_START
    )
}
