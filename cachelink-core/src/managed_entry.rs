use once_cell::sync::OnceCell;
use std::sync::Arc;

/// Internal table slot that tracks the holders of a shared value.
///
/// Each key in a [`ConcurrentManager`](crate::ConcurrentManager) maps to one
/// `ManagedEntry`. The entry counts the callers that currently hold the key
/// and owns a once-initialized cell for the value itself.
///
/// # Type Parameters
///
/// * `V` - The type of the managed value
///
/// # Fields
///
/// * `holders` - Number of live holders; only zero transiently, while the
///   entry is being removed from the table
/// * `value` - The shared value; empty until the first successful construction
///
/// The cell is behind an `Arc` so that callers can wait on initialization
/// after the table's shard lock has been released. Waiting on one entry never
/// blocks callers of unrelated keys.
pub(crate) struct ManagedEntry<V> {
    pub(crate) holders: usize,
    pub(crate) value: Arc<OnceCell<Arc<V>>>,
}

impl<V> ManagedEntry<V> {
    /// Creates an entry with a single holder and no value.
    pub(crate) fn new() -> Self {
        Self {
            holders: 1,
            value: Arc::new(OnceCell::new()),
        }
    }

    /// Adds a holder, returning the cell the holder should read from.
    pub(crate) fn retain(&mut self) -> Arc<OnceCell<Arc<V>>> {
        self.holders = self.holders.saturating_add(1);
        Arc::clone(&self.value)
    }

    /// Drops a holder, returning `true` if it was the last one.
    pub(crate) fn release(&mut self) -> bool {
        self.holders = self.holders.saturating_sub(1);
        self.holders == 0
    }

    /// Returns the value if it has been constructed.
    pub(crate) fn value(&self) -> Option<&Arc<V>> {
        self.value.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entry_has_one_holder() {
        let entry: ManagedEntry<i32> = ManagedEntry::new();
        assert_eq!(entry.holders, 1);
        assert!(entry.value().is_none());
    }

    #[test]
    fn test_retain_shares_cell() {
        let mut entry: ManagedEntry<i32> = ManagedEntry::new();
        let cell = entry.retain();
        assert_eq!(entry.holders, 2);

        cell.set(Arc::new(7)).unwrap();
        assert_eq!(entry.value().map(|v| **v), Some(7));
    }

    #[test]
    fn test_release_reports_last_holder() {
        let mut entry: ManagedEntry<i32> = ManagedEntry::new();
        entry.retain();
        assert!(!entry.release());
        assert!(entry.release());
        assert!(entry.release());
        assert_eq!(entry.holders, 0);
    }
}
