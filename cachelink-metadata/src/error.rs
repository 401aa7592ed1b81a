use crate::wire::WireType;
use thiserror::Error;

/// A metadata buffer that does not follow the wire format.
///
/// Decoding is all-or-nothing: when this error is returned no `Metadata` has
/// been produced.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum CodecError {
    /// The buffer ended in the middle of a field.
    #[error("buffer ended in the middle of a field")]
    Truncated,

    /// A varint ran past ten bytes or past 64 bits.
    #[error("varint exceeds 64 bits")]
    VarintOverflow,

    /// A field key carried a wire type this format does not define.
    #[error("invalid wire type {0}")]
    InvalidWireType(u8),

    /// A field key carried field number zero, or one beyond 32 bits.
    #[error("invalid field number {0}")]
    InvalidFieldNumber(u64),

    /// A known field was encoded with the wrong wire type.
    #[error("field {field} must be a varint but has wire type {wire_type:?}")]
    UnexpectedWireType { field: u32, wire_type: WireType },

    /// A known field carried a value outside its domain.
    #[error("value {value} out of range for field {field}")]
    ValueOutOfRange { field: u32, value: u64 },
}

/// A specialized `Result` for metadata encoding and decoding.
pub type Result<T> = std::result::Result<T, CodecError>;
