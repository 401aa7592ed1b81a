#[cfg(feature = "stats")]
use crate::ManagerStats;
use crate::managed_entry::ManagedEntry;
use crate::manager::{noop_task, Task};
use crate::{AcquireError, Manager, Release};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// A thread-safe manager that shares one value per key among all its holders.
///
/// The first caller to acquire a key builds the value with its factory; every
/// other caller acquiring the same key while the value is alive receives the
/// same `Arc`. Each acquisition counts as one holder, and the value is closed
/// and evicted as soon as the last holder invokes its [`Release`].
///
/// # Type Parameters
///
/// * `K` - The key identifying a logical resource
/// * `V` - The type of the shared value
///
/// # Guarantees
///
/// - **At-most-once construction**: for a live key the factory runs once; racing
///   callers wait for it and observe the same value
/// - **Count before construction**: the holder count is incremented before the
///   value exists, so a release racing an in-flight construction cannot evict
///   the slot
/// - **Exactly-once tasks**: the create task runs once per constructed value,
///   right after construction; the close task runs once per value, when the
///   holder count reaches zero
/// - **No leaked holders**: a declined, failed or panicking construction
///   releases the caller's reference before the error or panic reaches it
///
/// # Thread Safety
///
/// The key table is a `DashMap`. Incrementing a key's holder count, and
/// decrementing it together with eviction, are each a single operation under
/// the lock of the shard owning that key, so they are linearizable per key.
/// Construction happens outside the shard lock on a per-key `OnceCell`, so a
/// slow factory only blocks callers of the same key.
///
/// The close task runs after the entry has been evicted and the shard lock
/// released, so a concurrent acquire of the same key may already be building
/// a fresh value while the old one closes. Tasks must never call back into
/// the manager.
///
/// # Panics
///
/// A panic in the factory or the create task propagates out of `acquire`,
/// and a panic in the close task propagates out of [`Release::release`]. In
/// both cases the holder count has been restored first: the caller's holder
/// is given back, or the closed entry is already evicted.
///
/// # Examples
///
/// ```
/// use cachelink_core::{ConcurrentManager, Manager, Release};
/// use std::convert::Infallible;
/// use std::sync::Arc;
///
/// struct Handle {
///     name: String,
///     release: Release,
/// }
///
/// let manager = ConcurrentManager::<String, Handle>::new();
/// let open = |name: &str| {
///     let name = name.to_string();
///     move |release| Ok::<_, Infallible>(Some(Handle { name, release }))
/// };
///
/// let first = manager.acquire("sessionX".to_string(), open("sessionX")).unwrap();
/// let second = manager.acquire("sessionX".to_string(), open("sessionX")).unwrap();
/// assert!(Arc::ptr_eq(&first, &second));
/// assert_eq!(manager.reference_count(&"sessionX".to_string()), Some(2));
///
/// first.release.release();
/// second.release.release();
/// assert!(manager.is_empty());
/// ```
pub struct ConcurrentManager<K, V> {
    inner: Arc<Inner<K, V>>,
}

struct Inner<K, V> {
    table: DashMap<K, ManagedEntry<V>>,
    create_task: Task<V>,
    close_task: Task<V>,
    #[cfg(feature = "stats")]
    stats: ManagerStats,
}

impl<K, V> ConcurrentManager<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// Creates a manager with no create or close tasks.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts configuring a manager.
    ///
    /// # Examples
    ///
    /// ```
    /// use cachelink_core::{ConcurrentManager, Manager};
    /// use std::convert::Infallible;
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    /// use std::sync::Arc;
    ///
    /// let closed = Arc::new(AtomicUsize::new(0));
    /// let counter = Arc::clone(&closed);
    ///
    /// let manager = ConcurrentManager::<u32, u32>::builder()
    ///     .close_task(move |_value: &u32| {
    ///         counter.fetch_add(1, Ordering::SeqCst);
    ///     })
    ///     .build();
    ///
    /// let mut release = None;
    /// manager
    ///     .acquire(1, |r| {
    ///         release = Some(r);
    ///         Ok::<_, Infallible>(Some(10))
    ///     })
    ///     .unwrap();
    ///
    /// release.unwrap().release();
    /// assert_eq!(closed.load(Ordering::SeqCst), 1);
    /// ```
    pub fn builder() -> ConcurrentManagerBuilder<K, V> {
        ConcurrentManagerBuilder::new()
    }

    /// Returns the number of keys with at least one live holder.
    pub fn len(&self) -> usize {
        self.inner.table.len()
    }

    /// Returns `true` if no key currently has a holder.
    pub fn is_empty(&self) -> bool {
        self.inner.table.is_empty()
    }

    /// Returns `true` if `key` currently has at least one holder.
    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.table.contains_key(key)
    }

    /// Returns the number of live holders of `key`, or `None` if the key is not managed.
    pub fn reference_count(&self, key: &K) -> Option<usize> {
        self.inner.table.get(key).map(|entry| entry.holders)
    }

    /// Returns the lifecycle statistics of this manager.
    #[cfg(feature = "stats")]
    pub fn stats(&self) -> &ManagerStats {
        &self.inner.stats
    }
}

impl<K, V> Manager<K, V> for ConcurrentManager<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// Returns the shared value for `key`, building it if no holder exists yet.
    ///
    /// # Arguments
    ///
    /// * `key` - The key identifying the resource
    /// * `factory` - Builds the value; invoked at most once while the key is live,
    ///   and not at all if the value already exists
    ///
    /// # Returns
    ///
    /// * `Ok(Arc<V>)` - The shared value; the caller is now one of its holders
    /// * `Err(AcquireError)` - Construction was declined or failed; the caller
    ///   holds nothing
    ///
    /// A caller waiting on another thread's construction of the same key does
    /// not see that thread's failure: once the failing thread gives up the
    /// slot, the waiter runs its own factory.
    fn acquire<F, E>(&self, key: K, factory: F) -> Result<Arc<V>, AcquireError<E>>
    where
        F: FnOnce(Release) -> Result<Option<V>, E>,
    {
        #[cfg(feature = "stats")]
        self.inner.stats.record_acquisition();

        let cell = self.inner.retain(key.clone());
        // Gives the holder back unless construction succeeds, including when
        // the factory or the create task panics.
        let holder = HolderGuard {
            inner: &self.inner,
            key: Some(key.clone()),
        };

        // Fast path: value already constructed.
        if let Some(value) = cell.get() {
            holder.disarm();
            return Ok(Arc::clone(value));
        }

        let release = Inner::release_for(&self.inner, key);
        let value = cell.get_or_try_init(|| self.inner.construct(factory, release))?;
        holder.disarm();
        Ok(Arc::clone(value))
    }
}

impl<K, V> Inner<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// Inserts a fresh entry or adds a holder to the existing one.
    fn retain(&self, key: K) -> Arc<OnceCell<Arc<V>>> {
        match self.table.entry(key) {
            Entry::Occupied(mut occupied) => {
                let cell = occupied.get_mut().retain();
                trace!(holders = occupied.get().holders, "added holder to managed entry");
                cell
            }
            Entry::Vacant(vacant) => {
                let entry = ManagedEntry::new();
                let cell = Arc::clone(&entry.value);
                vacant.insert(entry);
                trace!("created managed entry");
                cell
            }
        }
    }

    /// Drops one holder of `key`, closing and evicting the value on the last one.
    fn release(&self, key: &K) {
        match self.table.entry(key.clone()) {
            Entry::Occupied(mut occupied) => {
                if !occupied.get_mut().release() {
                    trace!(holders = occupied.get().holders, "removed holder from managed entry");
                    return;
                }
                // The entry is out of the table before the close task runs.
                let (_, entry) = occupied.remove_entry();
                trace!("evicted managed entry");
                if let Some(value) = entry.value() {
                    (self.close_task)(&**value);
                    #[cfg(feature = "stats")]
                    self.stats.record_close();
                    debug!("closed managed value");
                }
            }
            Entry::Vacant(_) => {
                warn!("release called for a key with no live holders");
            }
        }
    }

    fn release_for(this: &Arc<Self>, key: K) -> Release {
        let inner = Arc::clone(this);
        Release::new(move || inner.release(&key))
    }

    fn construct<F, E>(&self, factory: F, release: Release) -> Result<Arc<V>, AcquireError<E>>
    where
        F: FnOnce(Release) -> Result<Option<V>, E>,
    {
        match factory(release) {
            Ok(Some(value)) => {
                let value = Arc::new(value);
                (self.create_task)(&*value);
                #[cfg(feature = "stats")]
                self.stats.record_creation();
                debug!("constructed managed value");
                Ok(value)
            }
            Ok(None) => {
                #[cfg(feature = "stats")]
                self.stats.record_declined();
                warn!("factory declined to construct a managed value");
                Err(AcquireError::Declined)
            }
            Err(e) => {
                #[cfg(feature = "stats")]
                self.stats.record_failure();
                debug!("factory failed to construct a managed value");
                Err(AcquireError::Factory(e))
            }
        }
    }
}

/// Holder taken by an in-flight `acquire`, given back on drop unless disarmed.
struct HolderGuard<'a, K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    inner: &'a Inner<K, V>,
    key: Option<K>,
}

impl<K, V> HolderGuard<'_, K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// Keeps the holder: the caller now owns it through the returned value.
    fn disarm(mut self) {
        self.key = None;
    }
}

impl<K, V> Drop for HolderGuard<'_, K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.inner.release(&key);
        }
    }
}

impl<K, V> Clone for ConcurrentManager<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> Default for ConcurrentManager<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for ConcurrentManager<K, V>
where
    K: Hash + Eq,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrentManager")
            .field("entries", &self.inner.table.len())
            .finish_non_exhaustive()
    }
}

/// Builder for [`ConcurrentManager`].
pub struct ConcurrentManagerBuilder<K, V> {
    create_task: Option<Task<V>>,
    close_task: Option<Task<V>>,
    _key: PhantomData<fn() -> K>,
}

impl<K, V> ConcurrentManagerBuilder<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    fn new() -> Self {
        Self {
            create_task: None,
            close_task: None,
            _key: PhantomData,
        }
    }

    /// Runs `task` once on every value right after its factory builds it.
    pub fn create_task<F>(mut self, task: F) -> Self
    where
        F: Fn(&V) + Send + Sync + 'static,
    {
        self.create_task = Some(Arc::new(task));
        self
    }

    /// Runs `task` once on every value when its last holder releases it.
    pub fn close_task<F>(mut self, task: F) -> Self
    where
        F: Fn(&V) + Send + Sync + 'static,
    {
        self.close_task = Some(Arc::new(task));
        self
    }

    pub fn build(self) -> ConcurrentManager<K, V> {
        ConcurrentManager {
            inner: Arc::new(Inner {
                table: DashMap::new(),
                create_task: self.create_task.unwrap_or_else(noop_task),
                close_task: self.close_task.unwrap_or_else(noop_task),
                #[cfg(feature = "stats")]
                stats: ManagerStats::new(),
            }),
        }
    }
}
