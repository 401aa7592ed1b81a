use std::sync::atomic::{AtomicU64, Ordering};

/// Lifecycle statistics for a resource manager.
///
/// Tracks how often values are requested, materialized, closed, declined by
/// their factory, or failed to construct. All counters use atomic operations
/// with `Relaxed` ordering; they are monitoring data, not synchronization.
///
/// # Examples
///
/// ```
/// use cachelink_core::ManagerStats;
///
/// let stats = ManagerStats::new();
///
/// stats.record_acquisition();
/// stats.record_creation();
/// stats.record_acquisition();
/// stats.record_close();
///
/// assert_eq!(stats.acquisitions(), 2);
/// assert_eq!(stats.creations(), 1);
/// assert_eq!(stats.closes(), 1);
/// assert_eq!(stats.active(), 0);
/// ```
#[derive(Debug)]
pub struct ManagerStats {
    acquisitions: AtomicU64,
    creations: AtomicU64,
    closes: AtomicU64,
    declined: AtomicU64,
    failures: AtomicU64,
}

impl ManagerStats {
    /// Creates a new `ManagerStats` instance with zero counters.
    ///
    /// # Examples
    ///
    /// ```
    /// use cachelink_core::ManagerStats;
    ///
    /// let stats = ManagerStats::new();
    /// assert_eq!(stats.acquisitions(), 0);
    /// assert_eq!(stats.creations(), 0);
    /// ```
    pub fn new() -> Self {
        Self {
            acquisitions: AtomicU64::new(0),
            creations: AtomicU64::new(0),
            closes: AtomicU64::new(0),
            declined: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    /// Records a call to `acquire`, whatever its outcome.
    #[inline]
    pub fn record_acquisition(&self) {
        self.acquisitions.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a value materialized by a factory.
    #[inline]
    pub fn record_creation(&self) {
        self.creations.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a value handed to the close task.
    #[inline]
    pub fn record_close(&self) {
        self.closes.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a factory that returned no value.
    #[inline]
    pub fn record_declined(&self) {
        self.declined.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a factory that returned an error.
    #[inline]
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the total number of `acquire` calls.
    #[inline]
    pub fn acquisitions(&self) -> u64 {
        self.acquisitions.load(Ordering::Relaxed)
    }

    /// Returns the number of values materialized so far.
    ///
    /// # Examples
    ///
    /// ```
    /// use cachelink_core::ManagerStats;
    ///
    /// let stats = ManagerStats::new();
    /// stats.record_creation();
    /// stats.record_creation();
    /// assert_eq!(stats.creations(), 2);
    /// ```
    #[inline]
    pub fn creations(&self) -> u64 {
        self.creations.load(Ordering::Relaxed)
    }

    /// Returns the number of values closed so far.
    #[inline]
    pub fn closes(&self) -> u64 {
        self.closes.load(Ordering::Relaxed)
    }

    /// Returns the number of declined constructions.
    #[inline]
    pub fn declined(&self) -> u64 {
        self.declined.load(Ordering::Relaxed)
    }

    /// Returns the number of failed constructions.
    #[inline]
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Returns the number of values created but not yet closed.
    ///
    /// Counters are read independently, so under concurrent updates this is
    /// a snapshot, not an exact figure.
    ///
    /// # Examples
    ///
    /// ```
    /// use cachelink_core::ManagerStats;
    ///
    /// let stats = ManagerStats::new();
    /// stats.record_creation();
    /// stats.record_creation();
    /// stats.record_close();
    /// assert_eq!(stats.active(), 1);
    /// ```
    #[inline]
    pub fn active(&self) -> u64 {
        self.creations().saturating_sub(self.closes())
    }

    /// Resets all counters to zero.
    pub fn reset(&self) {
        self.acquisitions.store(0, Ordering::Relaxed);
        self.creations.store(0, Ordering::Relaxed);
        self.closes.store(0, Ordering::Relaxed);
        self.declined.store(0, Ordering::Relaxed);
        self.failures.store(0, Ordering::Relaxed);
    }
}

impl Default for ManagerStats {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for ManagerStats {
    fn clone(&self) -> Self {
        Self {
            acquisitions: AtomicU64::new(self.acquisitions()),
            creations: AtomicU64::new(self.creations()),
            closes: AtomicU64::new(self.closes()),
            declined: AtomicU64::new(self.declined()),
            failures: AtomicU64::new(self.failures()),
        }
    }
}
