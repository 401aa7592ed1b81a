//! Compact tagged encoding of [`Metadata`].
//!
//! | Field | Tag | Payload | Present when |
//! |-------|-----|---------|--------------|
//! | version counter | 1 | zig-zag varint (64-bit) | a version is set |
//! | topology id | 2 | zig-zag varint (32-bit) | the version is clustered |
//! | lifespan | 3 | varint (milliseconds) | a lifespan is set |
//! | max idle | 4 | varint (milliseconds) | a max-idle time is set |
//!
//! Fields are written in ascending tag order and omitted when they hold their
//! default, so metadata with no version and no expiration encodes to zero
//! bytes. The decoder is driven by tags: it accepts fields in any order, lets
//! the last occurrence of a repeated field win, and skips unknown fields.

use crate::error::{CodecError, Result};
use crate::wire::{
    get_key, get_varint, put_key, put_varint, skip_field, varint_len, zigzag_decode_32,
    zigzag_decode_64, zigzag_encode_32, zigzag_encode_64, WireType,
};
use crate::{EntryVersion, Metadata};
use bytes::{BufMut, Bytes, BytesMut};
use tracing::{debug, trace};

pub const VERSION_COUNTER_TAG: u32 = 1;
pub const TOPOLOGY_ID_TAG: u32 = 2;
pub const LIFESPAN_TAG: u32 = 3;
pub const MAX_IDLE_TAG: u32 = 4;

/// Converts values to and from their binary form.
pub trait Codec<T> {
    fn encode(&self, value: &T) -> Bytes;

    fn decode(&self, bytes: &[u8]) -> Result<T>;
}

/// [`Codec`] for [`Metadata`], delegating to [`encode`] and [`decode`].
#[derive(Clone, Copy, Debug, Default)]
pub struct MetadataCodec;

impl Codec<Metadata> for MetadataCodec {
    fn encode(&self, value: &Metadata) -> Bytes {
        encode(value)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Metadata> {
        decode(bytes)
    }
}

/// Encodes `metadata` into a new buffer.
///
/// # Examples
///
/// ```
/// use cachelink_metadata::{codec, EntryVersion, Metadata};
///
/// assert!(codec::encode(&Metadata::new()).is_empty());
///
/// let metadata = Metadata::builder()
///     .version(EntryVersion::clustered(7, 42))
///     .lifespan_millis(5_000)
///     .build();
/// let bytes = codec::encode(&metadata);
/// assert_eq!(codec::decode(&bytes), Ok(metadata));
/// ```
pub fn encode(metadata: &Metadata) -> Bytes {
    let mut buf = BytesMut::with_capacity(encoded_len(metadata));
    encode_into(metadata, &mut buf);
    buf.freeze()
}

/// Appends the encoding of `metadata` to `buf`.
pub fn encode_into<B: BufMut>(metadata: &Metadata, buf: &mut B) {
    if let Some(version) = metadata.version {
        put_key(buf, VERSION_COUNTER_TAG, WireType::Varint);
        put_varint(buf, zigzag_encode_64(version.counter()));
        if let Some(topology_id) = version.topology_id() {
            put_key(buf, TOPOLOGY_ID_TAG, WireType::Varint);
            put_varint(buf, u64::from(zigzag_encode_32(topology_id)));
        }
    }
    if let Some(lifespan) = metadata.lifespan {
        put_key(buf, LIFESPAN_TAG, WireType::Varint);
        put_varint(buf, lifespan);
    }
    if let Some(max_idle) = metadata.max_idle {
        put_key(buf, MAX_IDLE_TAG, WireType::Varint);
        put_varint(buf, max_idle);
    }
}

/// Returns the number of bytes [`encode`] produces for `metadata`.
pub fn encoded_len(metadata: &Metadata) -> usize {
    // Every known tag fits a single key byte.
    let field = |value: u64| 1 + varint_len(value);

    let mut len = 0;
    if let Some(version) = metadata.version {
        len += field(zigzag_encode_64(version.counter()));
        if let Some(topology_id) = version.topology_id() {
            len += field(u64::from(zigzag_encode_32(topology_id)));
        }
    }
    len += metadata.lifespan.map_or(0, field);
    len += metadata.max_idle.map_or(0, field);
    len
}

/// Decodes metadata from `bytes`, which must hold exactly one encoding.
///
/// # Errors
///
/// Returns a [`CodecError`] if the buffer is truncated, holds an invalid key
/// or varint, encodes a known field with a non-varint wire type, or carries a
/// value outside its field's domain. No partial result is produced.
///
/// A topology id without a version counter does not make a version; it is
/// ignored.
///
/// # Examples
///
/// ```
/// use cachelink_metadata::{codec, EntryVersion, CodecError};
///
/// // Counter 42 (zig-zag 84), no topology.
/// let metadata = codec::decode(&[0x08, 0x54]).unwrap();
/// assert_eq!(metadata.version(), Some(EntryVersion::numeric(42)));
///
/// assert_eq!(codec::decode(&[0x08]), Err(CodecError::Truncated));
/// ```
pub fn decode(mut bytes: &[u8]) -> Result<Metadata> {
    let result = decode_fields(&mut bytes);
    if let Err(err) = &result {
        debug!(error = %err, "failed to decode entry metadata");
    }
    result
}

fn decode_fields(buf: &mut &[u8]) -> Result<Metadata> {
    let mut counter = None;
    let mut topology_id = None;
    let mut lifespan = None;
    let mut max_idle = None;

    while !buf.is_empty() {
        let (field, wire_type) = get_key(buf)?;
        match field {
            VERSION_COUNTER_TAG => {
                counter = Some(zigzag_decode_64(get_known_varint(buf, field, wire_type)?));
            }
            TOPOLOGY_ID_TAG => {
                let value = get_known_varint(buf, field, wire_type)?;
                let raw = u32::try_from(value)
                    .map_err(|_| CodecError::ValueOutOfRange { field, value })?;
                topology_id = Some(zigzag_decode_32(raw));
            }
            LIFESPAN_TAG => {
                lifespan = Some(get_millis(buf, field, wire_type)?);
            }
            MAX_IDLE_TAG => {
                max_idle = Some(get_millis(buf, field, wire_type)?);
            }
            unknown => {
                trace!(field = unknown, ?wire_type, "skipping unknown metadata field");
                skip_field(buf, wire_type)?;
            }
        }
    }

    let version = match (counter, topology_id) {
        (Some(counter), Some(topology_id)) => Some(EntryVersion::clustered(topology_id, counter)),
        (Some(counter), None) => Some(EntryVersion::numeric(counter)),
        (None, Some(_)) => {
            debug!("ignoring topology id without a version counter");
            None
        }
        (None, None) => None,
    };

    Ok(Metadata {
        version,
        lifespan,
        max_idle,
    })
}

fn get_known_varint(buf: &mut &[u8], field: u32, wire_type: WireType) -> Result<u64> {
    if wire_type != WireType::Varint {
        return Err(CodecError::UnexpectedWireType { field, wire_type });
    }
    get_varint(buf)
}

fn get_millis(buf: &mut &[u8], field: u32, wire_type: WireType) -> Result<u64> {
    let value = get_known_varint(buf, field, wire_type)?;
    if value > i64::MAX as u64 {
        return Err(CodecError::ValueOutOfRange { field, value });
    }
    Ok(value)
}
