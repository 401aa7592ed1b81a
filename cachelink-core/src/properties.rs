//! Capability flags describing how a cache must be accessed.
//!
//! Code that fronts a cache consults [`CacheProperties`] to decide whether it
//! has to take locks, marshal values or join a transaction before it asks a
//! [`Manager`](crate::Manager) for a value. The flags are read-only: they come
//! from configuration and the core never changes them.

/// Read-only capability flags of a cache.
pub trait CacheProperties {
    /// Reads take an exclusive lock on the entry.
    fn is_lock_on_read(&self) -> bool;

    /// Writes take an exclusive lock on the entry.
    fn is_lock_on_write(&self) -> bool;

    /// Values must be marshallable, because they leave the local heap.
    fn is_marshalling(&self) -> bool;

    /// Values outlive the local process, so mutations must be written back.
    fn is_persistent(&self) -> bool;

    /// Cache operations take part in transactions.
    fn is_transactional(&self) -> bool;
}

/// A plain set of cache capability flags.
///
/// # Examples
///
/// ```
/// use cachelink_core::{CacheProperties, SimpleCacheProperties};
///
/// let properties = SimpleCacheProperties::builder()
///     .transactional(true)
///     .lock_on_write(true)
///     .build();
///
/// assert!(properties.is_transactional());
/// assert!(properties.is_lock_on_write());
/// assert!(!properties.is_lock_on_read());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SimpleCacheProperties {
    lock_on_read: bool,
    lock_on_write: bool,
    marshalling: bool,
    persistent: bool,
    transactional: bool,
}

impl SimpleCacheProperties {
    /// Starts building a property set with every flag off.
    pub fn builder() -> SimpleCachePropertiesBuilder {
        SimpleCachePropertiesBuilder::default()
    }

    /// Captures the flags of any other [`CacheProperties`] implementation.
    pub fn snapshot<P: CacheProperties + ?Sized>(properties: &P) -> Self {
        Self {
            lock_on_read: properties.is_lock_on_read(),
            lock_on_write: properties.is_lock_on_write(),
            marshalling: properties.is_marshalling(),
            persistent: properties.is_persistent(),
            transactional: properties.is_transactional(),
        }
    }
}

impl CacheProperties for SimpleCacheProperties {
    fn is_lock_on_read(&self) -> bool {
        self.lock_on_read
    }

    fn is_lock_on_write(&self) -> bool {
        self.lock_on_write
    }

    fn is_marshalling(&self) -> bool {
        self.marshalling
    }

    fn is_persistent(&self) -> bool {
        self.persistent
    }

    fn is_transactional(&self) -> bool {
        self.transactional
    }
}

/// Builder for [`SimpleCacheProperties`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SimpleCachePropertiesBuilder {
    properties: SimpleCacheProperties,
}

impl SimpleCachePropertiesBuilder {
    pub fn lock_on_read(mut self, value: bool) -> Self {
        self.properties.lock_on_read = value;
        self
    }

    pub fn lock_on_write(mut self, value: bool) -> Self {
        self.properties.lock_on_write = value;
        self
    }

    pub fn marshalling(mut self, value: bool) -> Self {
        self.properties.marshalling = value;
        self
    }

    pub fn persistent(mut self, value: bool) -> Self {
        self.properties.persistent = value;
        self
    }

    pub fn transactional(mut self, value: bool) -> Self {
        self.properties.transactional = value;
        self
    }

    pub fn build(self) -> SimpleCacheProperties {
        self.properties
    }
}

/// How a cache distributes its entries across the cluster.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CacheMode {
    /// Entries live on this node only.
    #[default]
    Local,
    /// Entries live locally; other nodes are told to drop stale copies.
    Invalidation,
    /// Every node holds every entry.
    Replicated,
    /// Each entry is held by a subset of owners.
    Distributed,
}

impl CacheMode {
    /// Returns `true` for modes in which entries cross node boundaries.
    pub fn is_clustered(self) -> bool {
        !matches!(self, CacheMode::Local)
    }
}

/// Whether and how a cache participates in transactions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TransactionMode {
    #[default]
    NonTransactional,
    /// Transactions are enlisted without a recovery log.
    NonXa,
    /// Full two-phase transactions.
    Full,
}

/// When a transactional cache acquires entry locks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LockingMode {
    /// Locks are taken at commit time.
    #[default]
    Optimistic,
    /// Locks are taken when the entry is first written.
    Pessimistic,
}

/// Isolation level of reads within a transaction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum IsolationLevel {
    ReadCommitted,
    #[default]
    RepeatableRead,
}

/// Settings of a cache's persistent store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PersistenceConfiguration {
    /// Entries are written to the store only when evicted from memory.
    pub passivation: bool,
}

/// The subset of a cache's configuration that determines its capabilities.
///
/// # Examples
///
/// ```
/// use cachelink_core::{
///     CacheConfiguration, CacheMode, CacheProperties, IsolationLevel, LockingMode,
///     TransactionMode,
/// };
///
/// let configuration = CacheConfiguration {
///     mode: CacheMode::Distributed,
///     transaction: TransactionMode::NonXa,
///     locking: LockingMode::Pessimistic,
///     isolation: IsolationLevel::RepeatableRead,
///     persistence: None,
/// };
///
/// let properties = configuration.properties();
/// assert!(properties.is_lock_on_read());
/// assert!(properties.is_marshalling());
/// assert!(properties.is_persistent());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CacheConfiguration {
    pub mode: CacheMode,
    pub transaction: TransactionMode,
    pub locking: LockingMode,
    pub isolation: IsolationLevel,
    pub persistence: Option<PersistenceConfiguration>,
}

impl CacheConfiguration {
    /// Derives the capability flags implied by this configuration.
    pub fn properties(&self) -> ConfigurationCacheProperties {
        ConfigurationCacheProperties::from(self)
    }
}

/// Capability flags derived from a [`CacheConfiguration`].
///
/// | Flag | Set when |
/// |------|----------|
/// | transactional | the cache is not `NonTransactional` |
/// | lock-on-write | transactional with pessimistic locking |
/// | lock-on-read | lock-on-write with repeatable-read isolation |
/// | marshalling | clustered, or backed by a store |
/// | persistent | clustered, or backed by a store without passivation |
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConfigurationCacheProperties {
    lock_on_read: bool,
    lock_on_write: bool,
    marshalling: bool,
    persistent: bool,
    transactional: bool,
}

impl From<&CacheConfiguration> for ConfigurationCacheProperties {
    fn from(configuration: &CacheConfiguration) -> Self {
        let transactional = configuration.transaction != TransactionMode::NonTransactional;
        let lock_on_write = transactional && configuration.locking == LockingMode::Pessimistic;
        let lock_on_read =
            lock_on_write && configuration.isolation == IsolationLevel::RepeatableRead;
        let clustered = configuration.mode.is_clustered();
        let stored = configuration.persistence.is_some();
        let passivating = configuration
            .persistence
            .map_or(false, |persistence| persistence.passivation);

        Self {
            lock_on_read,
            lock_on_write,
            marshalling: clustered || stored,
            persistent: clustered || (stored && !passivating),
            transactional,
        }
    }
}

impl CacheProperties for ConfigurationCacheProperties {
    fn is_lock_on_read(&self) -> bool {
        self.lock_on_read
    }

    fn is_lock_on_write(&self) -> bool {
        self.lock_on_write
    }

    fn is_marshalling(&self) -> bool {
        self.marshalling
    }

    fn is_persistent(&self) -> bool {
        self.persistent
    }

    fn is_transactional(&self) -> bool {
        self.transactional
    }
}
