//! Restores index order on the writer side.

use std::collections::BTreeMap;

/// Holds out-of-order items until every lower index has arrived.
///
/// Its size is bounded by the number of claimed-but-unwritten items, which
/// the pipeline caps with a semaphore.
#[derive(Debug)]
pub struct ReorderBuffer<T> {
    next: u64,
    pending: BTreeMap<u64, T>,
    high_water: usize,
}

impl<T> ReorderBuffer<T> {
    /// Buffer expecting `first` as the first index.
    pub fn new(first: u64) -> Self {
        Self {
            next: first,
            pending: BTreeMap::new(),
            high_water: 0,
        }
    }

    /// Add an item. Returns it back if the index was already released or is
    /// already pending.
    pub fn insert(&mut self, index: u64, item: T) -> Result<(), T> {
        if index < self.next || self.pending.contains_key(&index) {
            return Err(item);
        }
        self.pending.insert(index, item);
        self.high_water = self.high_water.max(self.pending.len());
        Ok(())
    }

    /// Next item in order, if it has arrived.
    pub fn pop_ready(&mut self) -> Option<T> {
        let item = self.pending.remove(&self.next)?;
        self.next += 1;
        Some(item)
    }

    /// Index the buffer is waiting for.
    pub fn next_index(&self) -> u64 {
        self.next
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Largest number of items held at once.
    pub fn high_water(&self) -> usize {
        self.high_water
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(buffer: &mut ReorderBuffer<&'static str>) -> Vec<&'static str> {
        std::iter::from_fn(|| buffer.pop_ready()).collect()
    }

    #[test]
    fn test_releases_only_contiguous_prefix() {
        let mut buffer = ReorderBuffer::new(1);
        buffer.insert(3, "c").unwrap();
        buffer.insert(2, "b").unwrap();
        assert!(drain(&mut buffer).is_empty());

        buffer.insert(1, "a").unwrap();
        assert_eq!(drain(&mut buffer), vec!["a", "b", "c"]);
        assert_eq!(buffer.next_index(), 4);

        buffer.insert(6, "f").unwrap();
        buffer.insert(4, "d").unwrap();
        assert_eq!(drain(&mut buffer), vec!["d"]);
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.high_water(), 3);
    }

    #[test]
    fn test_rejects_stale_and_duplicate_indices() {
        let mut buffer = ReorderBuffer::new(1);
        buffer.insert(1, "a").unwrap();
        assert_eq!(buffer.insert(1, "again"), Err("again"));
        buffer.pop_ready();
        assert_eq!(buffer.insert(1, "late"), Err("late"));
        assert!(buffer.is_empty());
    }
}
