#[cfg(feature = "stats")]
use crate::ManagerStats;
use crate::manager::{noop_task, Task};
use crate::{AcquireError, Manager, Release};
use parking_lot::Mutex;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, warn};

/// A manager for values that are never shared between callers.
///
/// Every call to [`acquire`](Manager::acquire) runs the factory and returns a
/// fresh value, so there is no table and no holder count. The first
/// invocation of the value's [`Release`] runs the close task; any further
/// invocation is a no-op.
///
/// Use this variant where each caller already has exclusive access to the
/// underlying resource, e.g. when the cache locks entries on read. It shares
/// the [`Manager`] interface with [`ConcurrentManager`](crate::ConcurrentManager)
/// so callers need not know which one they are given.
///
/// # Examples
///
/// ```
/// use cachelink_core::{Manager, Release, SimpleManager};
/// use std::convert::Infallible;
/// use std::sync::Arc;
///
/// struct Handle {
///     release: Release,
/// }
///
/// let manager = SimpleManager::<&str, Handle>::new();
/// let a = manager.acquire("k", |release| Ok::<_, Infallible>(Some(Handle { release }))).unwrap();
/// let b = manager.acquire("k", |release| Ok::<_, Infallible>(Some(Handle { release }))).unwrap();
///
/// // Same key, independent values.
/// assert!(!Arc::ptr_eq(&a, &b));
/// a.release.release();
/// b.release.release();
/// ```
pub struct SimpleManager<K, V> {
    create_task: Task<V>,
    close_task: Task<V>,
    #[cfg(feature = "stats")]
    stats: Arc<ManagerStats>,
    _key: PhantomData<fn(K)>,
}

impl<K, V> SimpleManager<K, V>
where
    V: Send + Sync + 'static,
{
    /// Creates a manager with no create or close tasks.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts configuring a manager.
    pub fn builder() -> SimpleManagerBuilder<K, V> {
        SimpleManagerBuilder {
            create_task: None,
            close_task: None,
            _key: PhantomData,
        }
    }

    /// Returns the lifecycle statistics of this manager.
    #[cfg(feature = "stats")]
    pub fn stats(&self) -> &ManagerStats {
        &self.stats
    }

    fn release_for(&self, value: Arc<Mutex<Option<Arc<V>>>>) -> Release {
        let close_task = Arc::clone(&self.close_task);
        #[cfg(feature = "stats")]
        let stats = Arc::clone(&self.stats);
        Release::new(move || {
            // Taking the value makes every release after the first a no-op.
            let taken = value.lock().take();
            if let Some(value) = taken {
                close_task(&*value);
                #[cfg(feature = "stats")]
                stats.record_close();
                debug!("closed unshared value");
            }
        })
    }
}

impl<K, V> Manager<K, V> for SimpleManager<K, V>
where
    V: Send + Sync + 'static,
{
    fn acquire<F, E>(&self, _key: K, factory: F) -> Result<Arc<V>, AcquireError<E>>
    where
        F: FnOnce(Release) -> Result<Option<V>, E>,
    {
        #[cfg(feature = "stats")]
        self.stats.record_acquisition();

        let slot = Arc::new(Mutex::new(None));
        let release = self.release_for(Arc::clone(&slot));

        match factory(release) {
            Ok(Some(value)) => {
                let value = Arc::new(value);
                (self.create_task)(&*value);
                #[cfg(feature = "stats")]
                self.stats.record_creation();
                *slot.lock() = Some(Arc::clone(&value));
                Ok(value)
            }
            Ok(None) => {
                #[cfg(feature = "stats")]
                self.stats.record_declined();
                warn!("factory declined to construct an unshared value");
                Err(AcquireError::Declined)
            }
            Err(e) => {
                #[cfg(feature = "stats")]
                self.stats.record_failure();
                debug!("factory failed to construct an unshared value");
                Err(AcquireError::Factory(e))
            }
        }
    }
}

impl<K, V> Default for SimpleManager<K, V>
where
    V: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for SimpleManager<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleManager").finish_non_exhaustive()
    }
}

/// Builder for [`SimpleManager`].
pub struct SimpleManagerBuilder<K, V> {
    create_task: Option<Task<V>>,
    close_task: Option<Task<V>>,
    _key: PhantomData<fn(K)>,
}

impl<K, V> SimpleManagerBuilder<K, V>
where
    V: Send + Sync + 'static,
{
    /// Runs `task` once on every value right after its factory builds it.
    pub fn create_task<F>(mut self, task: F) -> Self
    where
        F: Fn(&V) + Send + Sync + 'static,
    {
        self.create_task = Some(Arc::new(task));
        self
    }

    /// Runs `task` once on every value when it is released.
    pub fn close_task<F>(mut self, task: F) -> Self
    where
        F: Fn(&V) + Send + Sync + 'static,
    {
        self.close_task = Some(Arc::new(task));
        self
    }

    pub fn build(self) -> SimpleManager<K, V> {
        SimpleManager {
            create_task: self.create_task.unwrap_or_else(noop_task),
            close_task: self.close_task.unwrap_or_else(noop_task),
            #[cfg(feature = "stats")]
            stats: Arc::new(ManagerStats::new()),
            _key: PhantomData,
        }
    }
}
