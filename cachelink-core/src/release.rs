use std::fmt;
use std::sync::Arc;

/// Callback handed to a factory so a holder can later give its value back.
///
/// The factory typically stores the `Release` inside the value it builds, and
/// the value's owner calls [`Release::release`] when it is done. What a release
/// does depends on the manager that created it:
///
/// - [`ConcurrentManager`](crate::ConcurrentManager): every call drops one
///   holder of the shared value; the close task runs when the last one goes.
/// - [`SimpleManager`](crate::SimpleManager): the first call closes the value;
///   later calls do nothing.
///
/// `Release` is cheap to clone; all clones share the same underlying action.
///
/// # Examples
///
/// ```
/// use cachelink_core::{ConcurrentManager, Manager, Release};
/// use std::convert::Infallible;
///
/// struct Connection {
///     release: Release,
/// }
///
/// let manager = ConcurrentManager::<&str, Connection>::new();
/// let conn = manager
///     .acquire("db", |release| Ok::<_, Infallible>(Some(Connection { release })))
///     .unwrap();
///
/// assert!(manager.contains_key(&"db"));
/// conn.release.release();
/// assert!(!manager.contains_key(&"db"));
/// ```
#[derive(Clone)]
pub struct Release {
    action: Arc<dyn Fn() + Send + Sync>,
}

impl Release {
    /// Wraps a release action.
    pub fn new<F>(action: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            action: Arc::new(action),
        }
    }

    /// A release that does nothing.
    ///
    /// Useful for values built outside of a manager that still need to
    /// satisfy an API expecting a `Release`.
    pub fn noop() -> Self {
        Self::new(|| {})
    }

    /// Signals that one holder is done with the value.
    pub fn release(&self) {
        (self.action)()
    }
}

impl fmt::Debug for Release {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Release").finish_non_exhaustive()
    }
}
