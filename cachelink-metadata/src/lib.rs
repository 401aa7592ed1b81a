//! # Cachelink Metadata
//!
//! Versions and expiration attributes of cache entries, and the compact binary
//! form in which they travel between cluster members.
//!
//! ## Features
//!
//! - **Entry Versions**: plain counters or counters qualified by cluster topology,
//!   with ordering that refuses to compare the two kinds
//! - **Version Generators**: produce the next version for a write, following
//!   topology changes
//! - **Expiration**: lifespan and max-idle limits with expiry calculation
//! - **Codec**: tag-prefixed varint encoding that omits defaults and skips
//!   unknown fields
//!
//! ## Example
//!
//! ```
//! use cachelink_metadata::{codec, ClusteredVersionGenerator, Metadata, VersionGenerator};
//!
//! let generator = ClusteredVersionGenerator::new(7);
//! let metadata = Metadata::builder()
//!     .version(generator.generate_new())
//!     .max_idle_millis(30_000)
//!     .build();
//!
//! let bytes = codec::encode(&metadata);
//! assert_eq!(codec::decode(&bytes).unwrap(), metadata);
//! ```
//!
pub mod codec;
mod error;
mod generator;
mod metadata;
mod version;
pub mod wire;

pub use codec::{Codec, MetadataCodec};
pub use error::{CodecError, Result};
pub use generator::{ClusteredVersionGenerator, NumericVersionGenerator, VersionGenerator};
pub use metadata::{Metadata, MetadataBuilder, UNSET};
pub use version::{EntryVersion, InequalVersion, VersionError};
