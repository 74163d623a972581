use std::collections::BTreeMap;

/// Reorders batches that complete out of order so they are released
/// strictly by batch index.
#[derive(Debug)]
pub struct BatchSequencer<T> {
    next: u32,
    parked: BTreeMap<u32, T>,
}

impl<T> BatchSequencer<T> {
    pub fn new(first: u32) -> Self {
        Self {
            next: first,
            parked: BTreeMap::new(),
        }
    }

    /// Parks `batch`. Indices already released are dropped.
    pub fn insert(&mut self, index: u32, batch: T) {
        if index >= self.next {
            self.parked.insert(index, batch);
        }
    }

    /// Next batch in order, if it has arrived.
    pub fn pop_ready(&mut self) -> Option<(u32, T)> {
        let batch = self.parked.remove(&self.next)?;
        let index = self.next;
        self.next += 1;
        Some((index, batch))
    }

    pub fn next_index(&self) -> u32 {
        self.next
    }

    pub fn parked(&self) -> usize {
        self.parked.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_releases_in_index_order() {
        let mut seq = BatchSequencer::new(0);
        seq.insert(2, "c");
        seq.insert(1, "b");
        assert!(seq.pop_ready().is_none());
        assert_eq!(seq.parked(), 2);

        seq.insert(0, "a");
        assert_eq!(seq.pop_ready(), Some((0, "a")));
        assert_eq!(seq.pop_ready(), Some((1, "b")));
        assert_eq!(seq.pop_ready(), Some((2, "c")));
        assert!(seq.pop_ready().is_none());
        assert_eq!(seq.next_index(), 3);
    }

    #[test]
    fn test_ignores_released_indices() {
        let mut seq = BatchSequencer::new(5);
        seq.insert(4, ());
        assert_eq!(seq.parked(), 0);
    }
}
