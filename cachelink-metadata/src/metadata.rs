use crate::EntryVersion;
use std::time::Duration;

/// Sentinel used by the millisecond accessors for "no limit".
pub const UNSET: i64 = -1;

/// Version and expiration attributes of a cache entry.
///
/// A `Metadata` value is immutable: every write to the cache builds a fresh
/// one, typically from the previous value via [`Metadata::to_builder`].
///
/// # Fields
///
/// * `version` - The entry's revision, if versioning is enabled
/// * `lifespan` - How long the entry may live after creation; unset means forever
/// * `max_idle` - How long the entry may go unaccessed; unset means forever
///
/// Both durations are whole milliseconds in `0..=i64::MAX`. The millisecond
/// accessors report an unset limit as [`UNSET`] (`-1`).
///
/// # Examples
///
/// ```
/// use cachelink_metadata::{EntryVersion, Metadata, UNSET};
///
/// let metadata = Metadata::builder()
///     .version(EntryVersion::clustered(7, 42))
///     .lifespan_millis(5_000)
///     .build();
///
/// assert_eq!(metadata.lifespan_millis(), 5_000);
/// assert_eq!(metadata.max_idle_millis(), UNSET);
/// assert!(!metadata.is_immortal());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Metadata {
    pub(crate) version: Option<EntryVersion>,
    pub(crate) lifespan: Option<u64>,
    pub(crate) max_idle: Option<u64>,
}

impl Metadata {
    /// Returns metadata with no version and no expiration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> MetadataBuilder {
        MetadataBuilder::default()
    }

    /// Returns a builder seeded with this metadata's attributes.
    pub fn to_builder(&self) -> MetadataBuilder {
        MetadataBuilder { metadata: *self }
    }

    pub fn version(&self) -> Option<EntryVersion> {
        self.version
    }

    pub fn lifespan(&self) -> Option<Duration> {
        self.lifespan.map(Duration::from_millis)
    }

    /// Returns the lifespan in milliseconds, or [`UNSET`].
    pub fn lifespan_millis(&self) -> i64 {
        to_millis(self.lifespan)
    }

    pub fn max_idle(&self) -> Option<Duration> {
        self.max_idle.map(Duration::from_millis)
    }

    /// Returns the max-idle time in milliseconds, or [`UNSET`].
    pub fn max_idle_millis(&self) -> i64 {
        to_millis(self.max_idle)
    }

    /// Returns `true` if the entry never expires.
    pub fn is_immortal(&self) -> bool {
        self.lifespan.is_none() && self.max_idle.is_none()
    }

    /// Returns the instant, in epoch milliseconds, after which the entry is expired.
    ///
    /// # Arguments
    ///
    /// * `created` - When the entry was created
    /// * `last_used` - When the entry was last accessed
    ///
    /// # Returns
    ///
    /// The earlier of `created + lifespan` and `last_used + max_idle`, counting
    /// only the limits that are set, or `None` for an immortal entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use cachelink_metadata::Metadata;
    ///
    /// let metadata = Metadata::builder()
    ///     .lifespan_millis(1_000)
    ///     .max_idle_millis(100)
    ///     .build();
    ///
    /// // Idle limit hits first.
    /// assert_eq!(metadata.expiry_time(0, 500), Some(600));
    /// // Lifespan hits first.
    /// assert_eq!(metadata.expiry_time(0, 950), Some(1_000));
    ///
    /// assert_eq!(Metadata::new().expiry_time(0, 0), None);
    /// ```
    pub fn expiry_time(&self, created: i64, last_used: i64) -> Option<i64> {
        let by_lifespan = self.lifespan.map(|lifespan| add_millis(created, lifespan));
        let by_idle = self.max_idle.map(|idle| add_millis(last_used, idle));
        match (by_lifespan, by_idle) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Returns `true` if the entry is expired at `now`.
    ///
    /// An entry is still alive at exactly its expiry time and expired
    /// strictly after it.
    pub fn is_expired(&self, created: i64, last_used: i64, now: i64) -> bool {
        self.expiry_time(created, last_used)
            .map_or(false, |expiry| now > expiry)
    }
}

fn to_millis(value: Option<u64>) -> i64 {
    value.map_or(UNSET, |millis| millis as i64)
}

fn add_millis(base: i64, millis: u64) -> i64 {
    // Stored limits never exceed i64::MAX.
    base.saturating_add(millis as i64)
}

/// Builder for [`Metadata`].
#[derive(Clone, Copy, Debug, Default)]
pub struct MetadataBuilder {
    metadata: Metadata,
}

impl MetadataBuilder {
    pub fn version(mut self, version: EntryVersion) -> Self {
        self.metadata.version = Some(version);
        self
    }

    /// Sets or clears the version.
    pub fn maybe_version(mut self, version: Option<EntryVersion>) -> Self {
        self.metadata.version = version;
        self
    }

    /// Sets the lifespan in milliseconds; any negative value clears it.
    pub fn lifespan_millis(mut self, millis: i64) -> Self {
        self.metadata.lifespan = from_millis(millis);
        self
    }

    /// Sets the lifespan, truncated to whole milliseconds; `None` clears it.
    pub fn lifespan(mut self, lifespan: Option<Duration>) -> Self {
        self.metadata.lifespan = lifespan.map(duration_millis);
        self
    }

    /// Sets the max-idle time in milliseconds; any negative value clears it.
    pub fn max_idle_millis(mut self, millis: i64) -> Self {
        self.metadata.max_idle = from_millis(millis);
        self
    }

    /// Sets the max-idle time, truncated to whole milliseconds; `None` clears it.
    pub fn max_idle(mut self, max_idle: Option<Duration>) -> Self {
        self.metadata.max_idle = max_idle.map(duration_millis);
        self
    }

    pub fn build(self) -> Metadata {
        self.metadata
    }
}

fn from_millis(millis: i64) -> Option<u64> {
    u64::try_from(millis).ok()
}

fn duration_millis(duration: Duration) -> u64 {
    duration.as_millis().min(i64::MAX as u128) as u64
}
