use crate::{AcquireError, Release};
use std::sync::Arc;

/// Callback run against a managed value at a lifecycle point.
///
/// Tasks run synchronously on the thread that triggered them and must not
/// call back into the manager that invoked them.
///
/// Tasks cannot return errors; a task that fails panics. The panic reaches
/// the caller unchanged: a create task's panic unwinds out of
/// [`Manager::acquire`], and a close task's panic unwinds out of
/// [`Release::release`]. Managers repair their bookkeeping before the panic
/// leaves them, so the failed acquisition holds nothing and a value whose
/// close task panicked is no longer handed out.
pub type Task<V> = Arc<dyn Fn(&V) + Send + Sync>;

pub(crate) fn noop_task<V>() -> Task<V> {
    Arc::new(|_: &V| {})
}

/// Keyed get-or-create access to values with a managed lifecycle.
///
/// A manager hands out values built by a caller-supplied factory. The factory
/// receives a [`Release`] which the value's holder invokes when it is done.
/// Whether concurrent callers for the same key share one value or each get
/// their own is up to the implementation, so code written against this trait
/// works with either [`ConcurrentManager`](crate::ConcurrentManager) or
/// [`SimpleManager`](crate::SimpleManager).
///
/// # Factory Contract
///
/// * `Ok(Some(value))` - the value was built; the manager's create task runs
/// * `Ok(None)` - construction was declined; `acquire` returns
///   [`AcquireError::Declined`]
/// * `Err(e)` - construction failed; `acquire` returns [`AcquireError::Factory`]
///
/// In both failure cases the manager releases the caller's reference before
/// returning, so failures never leak a holder. The same holds when the
/// factory or the create task panics: the reference is released while the
/// panic unwinds, and the panic then propagates to the caller.
///
/// # Examples
///
/// ```
/// use cachelink_core::{Manager, Release, SimpleManager, ConcurrentManager};
/// use std::convert::Infallible;
///
/// struct Session {
///     id: String,
///     release: Release,
/// }
///
/// fn open<M: Manager<String, Session>>(manager: &M, id: &str) -> String {
///     let session = manager
///         .acquire(id.to_string(), |release| {
///             Ok::<_, Infallible>(Some(Session { id: id.to_string(), release }))
///         })
///         .unwrap();
///     session.release.release();
///     session.id.clone()
/// }
///
/// assert_eq!(open(&SimpleManager::new(), "a"), "a");
/// assert_eq!(open(&ConcurrentManager::new(), "b"), "b");
/// ```
pub trait Manager<K, V> {
    /// Returns the value for `key`, building it with `factory` if needed.
    fn acquire<F, E>(&self, key: K, factory: F) -> Result<Arc<V>, AcquireError<E>>
    where
        F: FnOnce(Release) -> Result<Option<V>, E>;
}
