//! # Cachelink Core
//!
//! Keyed resource managers and cache capability contracts for the Cachelink
//! clustered caching library.
//!
//! ## Features
//!
//! - **Shared Values**: [`ConcurrentManager`] builds one value per key and hands it
//!   to every concurrent caller, counting holders
//! - **Exactly-once Lifecycle**: create and close tasks run once per value, the
//!   close task when the last holder releases
//! - **Unshared Values**: [`SimpleManager`] offers the same interface for values
//!   owned by a single caller
//! - **Failure Accounting**: declined or failed constructions never leak a holder
//! - **Cache Properties**: capability flags that tell callers whether to lock,
//!   marshal or join a transaction
//! - **Statistics**: lifecycle counters with the `stats` feature
//!
//! ## Module Organization
//!
//! - [`Manager`] - the common get-or-create interface
//! - [`ConcurrentManager`] - reference-counted, shared values
//! - [`SimpleManager`] - one value per call
//! - [`ManagerKind`] / [`AnyManager`] - runtime choice between the two
//! - [`properties`] - cache capability flags and their derivation from configuration
//!
mod concurrent_manager;
mod error;
mod managed_entry;
mod manager;
mod manager_kind;
mod release;
mod simple_manager;

pub mod properties;

#[cfg(feature = "stats")]
mod stats;

pub use concurrent_manager::{ConcurrentManager, ConcurrentManagerBuilder};
pub use error::AcquireError;
pub use manager::{Manager, Task};
pub use manager_kind::{manager_for, AnyManager, ManagerKind};
pub use properties::{
    CacheConfiguration, CacheMode, CacheProperties, ConfigurationCacheProperties,
    IsolationLevel, LockingMode, PersistenceConfiguration, SimpleCacheProperties,
    SimpleCachePropertiesBuilder, TransactionMode,
};
pub use release::Release;
pub use simple_manager::{SimpleManager, SimpleManagerBuilder};

#[cfg(feature = "stats")]
pub use stats::ManagerStats;
