use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// Revision of a cache entry, used for optimistic concurrency checks.
///
/// # Variants
///
/// * `Numeric` - A plain monotonic counter
/// * `Clustered` - A counter qualified by the topology in which it was assigned
///
/// # Ordering
///
/// Two `Numeric` versions order by counter. Two `Clustered` versions order by
/// topology id first: a version from a newer topology supersedes any version
/// from an older one, whatever the counters. Within a topology the counter
/// decides.
///
/// The two variants do not order against each other. [`PartialOrd`] returns
/// `None` for such pairs and [`EntryVersion::try_cmp`] reports
/// [`VersionError::VariantMismatch`].
///
/// # Examples
///
/// ```
/// use cachelink_metadata::EntryVersion;
///
/// let old = EntryVersion::clustered(3, 1_000);
/// let new = EntryVersion::clustered(4, 1);
/// assert!(new > old);
///
/// assert!(EntryVersion::numeric(2) > EntryVersion::numeric(1));
/// assert!(EntryVersion::numeric(2)
///     .partial_cmp(&EntryVersion::clustered(1, 1))
///     .is_none());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryVersion {
    Numeric { counter: i64 },
    Clustered { topology_id: i32, counter: i64 },
}

/// Outcome of comparing one version against another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InequalVersion {
    /// This version precedes the other.
    Before,
    /// This version supersedes the other.
    After,
    Equal,
    /// The versions are of different kinds and cannot be ordered.
    Conflicting,
}

/// Misuse of version comparison.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum VersionError {
    /// A numeric version was compared with a clustered one.
    #[error("cannot compare {left} with {right}: numeric and clustered versions are not ordered")]
    VariantMismatch {
        left: EntryVersion,
        right: EntryVersion,
    },
}

impl EntryVersion {
    pub const fn numeric(counter: i64) -> Self {
        EntryVersion::Numeric { counter }
    }

    pub const fn clustered(topology_id: i32, counter: i64) -> Self {
        EntryVersion::Clustered {
            topology_id,
            counter,
        }
    }

    /// Returns the version counter.
    pub fn counter(&self) -> i64 {
        match *self {
            EntryVersion::Numeric { counter } | EntryVersion::Clustered { counter, .. } => counter,
        }
    }

    /// Returns the topology id of a clustered version.
    pub fn topology_id(&self) -> Option<i32> {
        match *self {
            EntryVersion::Numeric { .. } => None,
            EntryVersion::Clustered { topology_id, .. } => Some(topology_id),
        }
    }

    pub fn is_clustered(&self) -> bool {
        matches!(self, EntryVersion::Clustered { .. })
    }

    /// Orders two versions of the same kind.
    ///
    /// # Errors
    ///
    /// Returns [`VersionError::VariantMismatch`] when one version is numeric
    /// and the other clustered.
    ///
    /// # Examples
    ///
    /// ```
    /// use cachelink_metadata::{EntryVersion, VersionError};
    /// use std::cmp::Ordering;
    ///
    /// let a = EntryVersion::clustered(7, 42);
    /// let b = EntryVersion::clustered(7, 43);
    /// assert_eq!(a.try_cmp(&b), Ok(Ordering::Less));
    ///
    /// let numeric = EntryVersion::numeric(42);
    /// assert!(matches!(
    ///     a.try_cmp(&numeric),
    ///     Err(VersionError::VariantMismatch { .. })
    /// ));
    /// ```
    pub fn try_cmp(&self, other: &EntryVersion) -> Result<Ordering, VersionError> {
        match (*self, *other) {
            (EntryVersion::Numeric { counter: a }, EntryVersion::Numeric { counter: b }) => {
                Ok(a.cmp(&b))
            }
            (
                EntryVersion::Clustered {
                    topology_id: ta,
                    counter: a,
                },
                EntryVersion::Clustered {
                    topology_id: tb,
                    counter: b,
                },
            ) => Ok(ta.cmp(&tb).then(a.cmp(&b))),
            (left, right) => Err(VersionError::VariantMismatch { left, right }),
        }
    }

    /// Compares this version against `other`, reporting mixed kinds as
    /// [`InequalVersion::Conflicting`] rather than as an error.
    pub fn compare_to(&self, other: &EntryVersion) -> InequalVersion {
        match self.try_cmp(other) {
            Ok(Ordering::Less) => InequalVersion::Before,
            Ok(Ordering::Greater) => InequalVersion::After,
            Ok(Ordering::Equal) => InequalVersion::Equal,
            Err(_) => InequalVersion::Conflicting,
        }
    }

    /// Returns the next version within the same topology.
    ///
    /// The counter saturates at `i64::MAX`.
    pub fn increment(&self) -> EntryVersion {
        match *self {
            EntryVersion::Numeric { counter } => EntryVersion::numeric(counter.saturating_add(1)),
            EntryVersion::Clustered {
                topology_id,
                counter,
            } => EntryVersion::clustered(topology_id, counter.saturating_add(1)),
        }
    }
}

impl PartialOrd for EntryVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.try_cmp(other).ok()
    }
}

impl fmt::Display for EntryVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryVersion::Numeric { counter } => write!(f, "NumericVersion({})", counter),
            EntryVersion::Clustered {
                topology_id,
                counter,
            } => write!(f, "ClusteredVersion({}:{})", topology_id, counter),
        }
    }
}
