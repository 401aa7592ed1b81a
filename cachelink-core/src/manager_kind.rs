use crate::{
    AcquireError, CacheProperties, ConcurrentManager, Manager, Release, SimpleManager,
};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

/// Selects which [`Manager`] implementation fronts a cache.
///
/// # Variants
///
/// * `Concurrent` - **Shared values** (default)
///   - Concurrent callers for the same key receive the same value
///   - The value is closed when its last holder releases it
///   - Right for caches that do not lock entries on read
///
/// * `Simple` - **Unshared values**
///   - Every call builds its own value and closes it on release
///   - No table, no counting
///   - Right for caches that lock entries on read, where each caller has
///     exclusive access anyway
///
/// # Examples
///
/// ```
/// use cachelink_core::{ManagerKind, SimpleCacheProperties};
///
/// let default_kind = ManagerKind::default();
/// assert_eq!(default_kind, ManagerKind::Concurrent);
///
/// let kind: ManagerKind = "simple".into();
/// assert_eq!(kind, ManagerKind::Simple);
///
/// let locking = SimpleCacheProperties::builder().lock_on_read(true).build();
/// assert_eq!(ManagerKind::for_properties(&locking), ManagerKind::Simple);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ManagerKind {
    #[default]
    Concurrent,
    Simple,
}

impl ManagerKind {
    /// Picks the manager suited to a cache with the given capabilities.
    pub fn for_properties<P: CacheProperties + ?Sized>(properties: &P) -> Self {
        if properties.is_lock_on_read() {
            ManagerKind::Simple
        } else {
            ManagerKind::Concurrent
        }
    }
}

/// Converts a string slice to a `ManagerKind`.
///
/// The conversion is case-insensitive and defaults to `Concurrent` for
/// unrecognized values.
///
/// # Supported Values
///
/// - `"simple"` → `ManagerKind::Simple`
/// - `"concurrent"` → `ManagerKind::Concurrent`
/// - Any other value → `ManagerKind::Concurrent` (default)
impl From<&str> for ManagerKind {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "simple" => ManagerKind::Simple,
            _ => ManagerKind::Concurrent,
        }
    }
}

/// A manager whose implementation is chosen at runtime.
///
/// [`Manager::acquire`] is generic over the factory, so the trait cannot be
/// used as a trait object; this enum stands in for `Box<dyn Manager<K, V>>`.
///
/// # Examples
///
/// ```
/// use cachelink_core::{manager_for, AnyManager, Manager, SimpleCacheProperties};
/// use std::convert::Infallible;
///
/// let properties = SimpleCacheProperties::builder().build();
/// let manager: AnyManager<u32, u32> = manager_for(&properties);
/// assert!(matches!(manager, AnyManager::Concurrent(_)));
///
/// let value = manager.acquire(1, |_| Ok::<_, Infallible>(Some(42))).unwrap();
/// assert_eq!(*value, 42);
/// ```
pub enum AnyManager<K, V> {
    Concurrent(ConcurrentManager<K, V>),
    Simple(SimpleManager<K, V>),
}

impl<K, V> AnyManager<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// Creates a manager of `kind` with no create or close tasks.
    pub fn new(kind: ManagerKind) -> Self {
        match kind {
            ManagerKind::Concurrent => AnyManager::Concurrent(ConcurrentManager::new()),
            ManagerKind::Simple => AnyManager::Simple(SimpleManager::new()),
        }
    }

    /// Creates a manager of `kind` that runs the given lifecycle tasks.
    pub fn with_tasks<C, D>(kind: ManagerKind, create_task: C, close_task: D) -> Self
    where
        C: Fn(&V) + Send + Sync + 'static,
        D: Fn(&V) + Send + Sync + 'static,
    {
        match kind {
            ManagerKind::Concurrent => AnyManager::Concurrent(
                ConcurrentManager::builder()
                    .create_task(create_task)
                    .close_task(close_task)
                    .build(),
            ),
            ManagerKind::Simple => AnyManager::Simple(
                SimpleManager::builder()
                    .create_task(create_task)
                    .close_task(close_task)
                    .build(),
            ),
        }
    }

    /// Returns which implementation this manager uses.
    pub fn kind(&self) -> ManagerKind {
        match self {
            AnyManager::Concurrent(_) => ManagerKind::Concurrent,
            AnyManager::Simple(_) => ManagerKind::Simple,
        }
    }
}

impl<K, V> Manager<K, V> for AnyManager<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    fn acquire<F, E>(&self, key: K, factory: F) -> Result<Arc<V>, AcquireError<E>>
    where
        F: FnOnce(Release) -> Result<Option<V>, E>,
    {
        match self {
            AnyManager::Concurrent(manager) => manager.acquire(key, factory),
            AnyManager::Simple(manager) => manager.acquire(key, factory),
        }
    }
}

impl<K, V> fmt::Debug for AnyManager<K, V>
where
    K: Hash + Eq,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnyManager::Concurrent(manager) => f.debug_tuple("Concurrent").field(manager).finish(),
            AnyManager::Simple(manager) => f.debug_tuple("Simple").field(manager).finish(),
        }
    }
}

/// Builds the manager suited to a cache with the given capabilities.
pub fn manager_for<K, V, P>(properties: &P) -> AnyManager<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
    P: CacheProperties + ?Sized,
{
    AnyManager::new(ManagerKind::for_properties(properties))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CacheConfiguration, LockingMode, SimpleCacheProperties, TransactionMode};
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_from_str_is_case_insensitive() {
        assert_eq!(ManagerKind::from("SIMPLE"), ManagerKind::Simple);
        assert_eq!(ManagerKind::from("Concurrent"), ManagerKind::Concurrent);
        assert_eq!(ManagerKind::from("shared"), ManagerKind::Concurrent);
    }

    #[test]
    fn test_lock_on_write_alone_keeps_sharing() {
        let properties = SimpleCacheProperties::builder()
            .transactional(true)
            .lock_on_write(true)
            .build();
        assert_eq!(ManagerKind::for_properties(&properties), ManagerKind::Concurrent);
    }

    #[test]
    fn test_pessimistic_repeatable_read_cache_gets_simple_manager() {
        let configuration = CacheConfiguration {
            transaction: TransactionMode::Full,
            locking: LockingMode::Pessimistic,
            ..CacheConfiguration::default()
        };
        let manager: AnyManager<u8, u8> = manager_for(&configuration.properties());
        assert_eq!(manager.kind(), ManagerKind::Simple);
    }

    #[test]
    fn test_with_tasks_wires_both_variants() {
        for kind in [ManagerKind::Concurrent, ManagerKind::Simple] {
            let created = Arc::new(AtomicUsize::new(0));
            let closed = Arc::new(AtomicUsize::new(0));
            let (c, d) = (Arc::clone(&created), Arc::clone(&closed));
            let manager: AnyManager<u8, (u8, Release)> = AnyManager::with_tasks(
                kind,
                move |_| {
                    c.fetch_add(1, Ordering::SeqCst);
                },
                move |_| {
                    d.fetch_add(1, Ordering::SeqCst);
                },
            );

            let value = manager
                .acquire(1, |release| Ok::<_, Infallible>(Some((7, release))))
                .unwrap();
            assert_eq!(value.0, 7);
            assert_eq!(created.load(Ordering::SeqCst), 1, "{:?}", kind);

            value.1.release();
            assert_eq!(closed.load(Ordering::SeqCst), 1, "{:?}", kind);
        }
    }
}
