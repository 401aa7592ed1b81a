//! Low-level primitives of the tagged varint wire format.
//!
//! A field is a varint key `(field_number << 3) | wire_type` followed by its
//! payload. The layout matches protocol buffers, so any protobuf reader can
//! skip fields it does not know.

use crate::error::{CodecError, Result};
use bytes::{Buf, BufMut};

/// Largest number of bytes a 64-bit varint may occupy.
pub const MAX_VARINT_LEN: usize = 10;

/// How a field's payload is laid out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WireType {
    Varint = 0,
    Fixed64 = 1,
    LengthDelimited = 2,
    Fixed32 = 5,
}

impl TryFrom<u8> for WireType {
    type Error = CodecError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::Fixed64),
            2 => Ok(WireType::LengthDelimited),
            5 => Ok(WireType::Fixed32),
            other => Err(CodecError::InvalidWireType(other)),
        }
    }
}

/// Writes `value` as a little-endian base-128 varint.
pub fn put_varint<B: BufMut>(buf: &mut B, mut value: u64) {
    while value >= 0x80 {
        buf.put_u8((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    buf.put_u8(value as u8);
}

/// Reads a varint, rejecting encodings longer than ten bytes or wider than 64 bits.
pub fn get_varint<B: Buf>(buf: &mut B) -> Result<u64> {
    let mut value = 0u64;
    for index in 0..MAX_VARINT_LEN {
        if !buf.has_remaining() {
            return Err(CodecError::Truncated);
        }
        let byte = buf.get_u8();
        // The tenth byte only has room for the top bit.
        if index == MAX_VARINT_LEN - 1 && byte > 0x01 {
            return Err(CodecError::VarintOverflow);
        }
        value |= u64::from(byte & 0x7f) << (7 * index);
        if byte < 0x80 {
            return Ok(value);
        }
    }
    Err(CodecError::VarintOverflow)
}

/// Returns the number of bytes `value` occupies as a varint.
pub fn varint_len(value: u64) -> usize {
    // 1 byte per started group of 7 significant bits, at least 1.
    let bits = 64 - (value | 1).leading_zeros() as usize;
    (bits + 6) / 7
}

pub fn zigzag_encode_64(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

pub fn zigzag_decode_64(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

pub fn zigzag_encode_32(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

pub fn zigzag_decode_32(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

/// Writes the key of a field.
pub fn put_key<B: BufMut>(buf: &mut B, field: u32, wire_type: WireType) {
    put_varint(buf, (u64::from(field) << 3) | wire_type as u64);
}

/// Reads the key of a field, returning its number and wire type.
pub fn get_key<B: Buf>(buf: &mut B) -> Result<(u32, WireType)> {
    let key = get_varint(buf)?;
    let wire_type = WireType::try_from((key & 0x07) as u8)?;
    let field = key >> 3;
    if field == 0 || field > u64::from(u32::MAX) {
        return Err(CodecError::InvalidFieldNumber(field));
    }
    Ok((field as u32, wire_type))
}

/// Skips over the payload of a field of the given wire type.
pub fn skip_field<B: Buf>(buf: &mut B, wire_type: WireType) -> Result<()> {
    let len = match wire_type {
        WireType::Varint => return get_varint(buf).map(|_| ()),
        WireType::Fixed64 => 8,
        WireType::Fixed32 => 4,
        WireType::LengthDelimited => {
            let len = get_varint(buf)?;
            usize::try_from(len).map_err(|_| CodecError::Truncated)?
        }
    };
    if buf.remaining() < len {
        return Err(CodecError::Truncated);
    }
    buf.advance(len);
    Ok(())
}
