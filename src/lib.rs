//! # Cachelink
//!
//! Building blocks for the clustering layer of a distributed cache: keyed
//! resource managers that share expensive objects safely between threads, and
//! the versioned, expiring entry metadata replicated between cluster members.
//!
//! ## Features
//!
//! - **Create once, close once**: concurrent callers for a key share one value,
//!   built by a single factory call and closed when the last holder releases it
//! - **Same interface, with or without sharing**: [`ConcurrentManager`] and
//!   [`SimpleManager`] both implement [`Manager`]
//! - **Configuration-driven choice**: [`manager_for`] picks the manager from a
//!   cache's [`CacheProperties`]
//! - **Versioned metadata**: [`EntryVersion`] orders numeric and topology-aware
//!   versions for optimistic concurrency checks
//! - **Compact wire form**: [`codec`] encodes metadata in a few bytes and skips
//!   fields it does not know
//!
//! ## Quick Start
//!
//! Share a handle between callers and close it when the last one is done:
//!
//! ```rust
//! use cachelink::{ConcurrentManager, Manager, Release};
//! use std::convert::Infallible;
//! use std::sync::Arc;
//!
//! struct SessionHandle {
//!     id: String,
//!     release: Release,
//! }
//!
//! impl SessionHandle {
//!     fn close(&self) {
//!         self.release.release();
//!     }
//! }
//!
//! let manager = ConcurrentManager::<String, SessionHandle>::builder()
//!     .close_task(|handle: &SessionHandle| println!("closing {}", handle.id))
//!     .build();
//!
//! let open = |release: Release| Ok::<_, Infallible>(Some(SessionHandle { id: "sessionX".into(), release }));
//! let a = manager.acquire("sessionX".to_string(), open).unwrap();
//! let b = manager.acquire("sessionX".to_string(), open).unwrap();
//! assert!(Arc::ptr_eq(&a, &b));
//!
//! a.close();
//! b.close(); // prints "closing sessionX"
//! assert!(manager.is_empty());
//! ```
//!
//! ## Choosing a Manager
//!
//! Caches that lock entries on read already give each caller exclusive access,
//! so they get a [`SimpleManager`]; all others share values through a
//! [`ConcurrentManager`]:
//!
//! ```rust
//! use cachelink::{
//!     manager_for, AnyManager, CacheConfiguration, CacheMode, LockingMode, ManagerKind,
//!     TransactionMode,
//! };
//!
//! let configuration = CacheConfiguration {
//!     mode: CacheMode::Distributed,
//!     transaction: TransactionMode::Full,
//!     locking: LockingMode::Pessimistic,
//!     ..CacheConfiguration::default()
//! };
//!
//! let manager: AnyManager<String, String> = manager_for(&configuration.properties());
//! assert_eq!(manager.kind(), ManagerKind::Simple);
//! ```
//!
//! ## Entry Metadata
//!
//! ```rust
//! use cachelink::{codec, EntryVersion, Metadata, UNSET};
//!
//! let metadata = Metadata::builder()
//!     .version(EntryVersion::clustered(7, 42))
//!     .lifespan_millis(5_000)
//!     .build();
//!
//! let bytes = codec::encode(&metadata);
//! let decoded = codec::decode(&bytes).unwrap();
//!
//! assert_eq!(decoded.version(), Some(EntryVersion::clustered(7, 42)));
//! assert_eq!(decoded.lifespan_millis(), 5_000);
//! assert_eq!(decoded.max_idle_millis(), UNSET);
//! ```

pub use cachelink_core::*;
pub use cachelink_metadata::{
    codec, wire, ClusteredVersionGenerator, Codec, CodecError, EntryVersion, InequalVersion,
    Metadata, MetadataBuilder, MetadataCodec, NumericVersionGenerator, VersionError,
    VersionGenerator, UNSET,
};
