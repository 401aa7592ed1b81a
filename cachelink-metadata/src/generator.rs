use crate::EntryVersion;
use std::sync::atomic::{AtomicI32, Ordering};
use tracing::debug;

/// Source of entry versions for writes.
pub trait VersionGenerator: Send + Sync {
    /// Returns the version of an entry written for the first time.
    fn generate_new(&self) -> EntryVersion;

    /// Returns the version that supersedes `version`.
    fn increment(&self, version: &EntryVersion) -> EntryVersion;
}

/// Generates [`EntryVersion::Numeric`] versions for local caches.
///
/// # Examples
///
/// ```
/// use cachelink_metadata::{EntryVersion, NumericVersionGenerator, VersionGenerator};
///
/// let generator = NumericVersionGenerator;
/// let first = generator.generate_new();
/// assert_eq!(first, EntryVersion::numeric(1));
/// assert_eq!(generator.increment(&first), EntryVersion::numeric(2));
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct NumericVersionGenerator;

impl VersionGenerator for NumericVersionGenerator {
    fn generate_new(&self) -> EntryVersion {
        EntryVersion::numeric(1)
    }

    /// Increments the counter of `version`, dropping any topology id.
    fn increment(&self, version: &EntryVersion) -> EntryVersion {
        EntryVersion::numeric(version.counter().saturating_add(1))
    }
}

/// Generates [`EntryVersion::Clustered`] versions tagged with the current topology.
///
/// The generator tracks the newest topology id it has seen. Versions from an
/// older topology restart at counter 1 in the current one, which still orders
/// them after the old version because the topology id is compared first.
///
/// # Examples
///
/// ```
/// use cachelink_metadata::{ClusteredVersionGenerator, EntryVersion, VersionGenerator};
///
/// let generator = ClusteredVersionGenerator::new(3);
/// let v1 = generator.generate_new();
/// let v2 = generator.increment(&v1);
/// assert_eq!(v2, EntryVersion::clustered(3, 2));
///
/// generator.on_topology_change(4);
/// let v3 = generator.increment(&v2);
/// assert_eq!(v3, EntryVersion::clustered(4, 1));
/// assert!(v3 > v2);
/// ```
#[derive(Debug, Default)]
pub struct ClusteredVersionGenerator {
    topology_id: AtomicI32,
}

impl ClusteredVersionGenerator {
    pub fn new(topology_id: i32) -> Self {
        Self {
            topology_id: AtomicI32::new(topology_id),
        }
    }

    /// Returns the topology id new versions are assigned in.
    pub fn topology_id(&self) -> i32 {
        self.topology_id.load(Ordering::Acquire)
    }

    /// Records a new cluster topology.
    ///
    /// Topology ids only move forward; an id older than the current one is
    /// ignored. Returns the topology id in effect afterwards.
    pub fn on_topology_change(&self, topology_id: i32) -> i32 {
        let previous = self.topology_id.fetch_max(topology_id, Ordering::AcqRel);
        if topology_id > previous {
            debug!(previous, current = topology_id, "version topology changed");
            topology_id
        } else {
            previous
        }
    }
}

impl VersionGenerator for ClusteredVersionGenerator {
    fn generate_new(&self) -> EntryVersion {
        EntryVersion::clustered(self.topology_id(), 1)
    }

    fn increment(&self, version: &EntryVersion) -> EntryVersion {
        // A version from a newer topology than ours means we missed a view change.
        let current = match version.topology_id() {
            Some(topology_id) => self.on_topology_change(topology_id),
            None => self.topology_id(),
        };
        match *version {
            EntryVersion::Clustered {
                topology_id,
                counter,
            } if topology_id == current => {
                EntryVersion::clustered(current, counter.saturating_add(1))
            }
            _ => EntryVersion::clustered(current, 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_numeric_increment_drops_topology() {
        let generator = NumericVersionGenerator;
        assert_eq!(
            generator.increment(&EntryVersion::clustered(9, 4)),
            EntryVersion::numeric(5)
        );
    }

    #[test]
    fn test_clustered_generate_new_uses_current_topology() {
        let generator = ClusteredVersionGenerator::new(12);
        assert_eq!(generator.generate_new(), EntryVersion::clustered(12, 1));
    }

    #[test]
    fn test_topology_never_moves_backwards() {
        let generator = ClusteredVersionGenerator::new(5);
        assert_eq!(generator.on_topology_change(3), 5);
        assert_eq!(generator.topology_id(), 5);
        assert_eq!(generator.on_topology_change(6), 6);
        assert_eq!(generator.topology_id(), 6);
    }

    #[test]
    fn test_increment_of_newer_version_catches_up() {
        let generator = ClusteredVersionGenerator::new(1);
        let remote = EntryVersion::clustered(4, 17);

        let next = generator.increment(&remote);
        assert_eq!(next, EntryVersion::clustered(4, 18));
        assert_eq!(generator.topology_id(), 4);
        assert!(next > remote);
    }

    #[test]
    fn test_increment_of_numeric_version_restarts() {
        let generator = ClusteredVersionGenerator::new(2);
        assert_eq!(
            generator.increment(&EntryVersion::numeric(50)),
            EntryVersion::clustered(2, 1)
        );
    }

    #[test]
    fn test_concurrent_topology_changes_keep_maximum() {
        let generator = Arc::new(ClusteredVersionGenerator::new(0));
        let handles: Vec<_> = (1..=8)
            .map(|id| {
                let generator = Arc::clone(&generator);
                thread::spawn(move || {
                    generator.on_topology_change(id);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(generator.topology_id(), 8);
    }
}
