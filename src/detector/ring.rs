//! Fixed-capacity ring buffer for execution history
//!
//! Arena + index structure: fixed backing vector, write cursor, fill
//! count. Once full, pushes silently overwrite the oldest slot.

/// Bounded buffer that overwrites its oldest entry when full
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    slots: Vec<T>,
    cursor: usize,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    /// Create a buffer holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: Vec::with_capacity(capacity),
            cursor: 0,
            capacity,
        }
    }

    /// Append an entry, overwriting the oldest once full
    pub fn push(&mut self, item: T) {
        if self.slots.len() < self.capacity {
            self.slots.push(item);
            self.cursor = self.slots.len() % self.capacity;
        } else {
            self.slots[self.cursor] = item;
            self.cursor = (self.cursor + 1) % self.capacity;
        }
    }

    /// Number of entries currently held
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the buffer holds no entries
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate oldest to newest.
    ///
    /// Two cases: while not yet full, chronological order is the backing
    /// array order; once full, it starts at the write cursor and wraps.
    pub fn iter_chronological(&self) -> impl Iterator<Item = &T> {
        let split = if self.slots.len() < self.capacity {
            0
        } else {
            self.cursor
        };
        self.slots[split..].iter().chain(self.slots[..split].iter())
    }

    /// Drop all entries
    pub fn clear(&mut self) {
        self.slots.clear();
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_push_below_capacity() {
        let mut ring = RingBuffer::new(4);
        ring.push(1);
        ring.push(2);
        assert_eq!(ring.len(), 2);
        let items: Vec<_> = ring.iter_chronological().copied().collect();
        assert_eq!(items, vec![1, 2]);
    }

    #[test]
    fn test_wraparound_overwrites_oldest() {
        let mut ring = RingBuffer::new(3);
        for i in 1..=5 {
            ring.push(i);
        }
        assert_eq!(ring.len(), 3);
        let items: Vec<_> = ring.iter_chronological().copied().collect();
        assert_eq!(items, vec![3, 4, 5]);
    }

    #[test]
    fn test_exactly_full() {
        let mut ring = RingBuffer::new(3);
        for i in 1..=3 {
            ring.push(i);
        }
        let items: Vec<_> = ring.iter_chronological().copied().collect();
        assert_eq!(items, vec![1, 2, 3]);
    }

    #[test]
    fn test_clear_resets() {
        let mut ring = RingBuffer::new(2);
        ring.push(1);
        ring.push(2);
        ring.push(3);
        ring.clear();
        assert!(ring.is_empty());
        ring.push(9);
        let items: Vec<_> = ring.iter_chronological().copied().collect();
        assert_eq!(items, vec![9]);
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let mut ring = RingBuffer::new(0);
        assert_eq!(ring.capacity(), 1);
        ring.push(1);
        ring.push(2);
        let items: Vec<_> = ring.iter_chronological().copied().collect();
        assert_eq!(items, vec![2]);
    }

    proptest! {
        /// Chronological order always equals the tail of the pushed
        /// sequence, across every wraparound state.
        #[test]
        fn prop_chronological_matches_tail(capacity in 1usize..16, count in 0usize..64) {
            let mut ring = RingBuffer::new(capacity);
            for i in 0..count {
                ring.push(i);
            }
            let got: Vec<_> = ring.iter_chronological().copied().collect();
            let expected: Vec<_> = (count.saturating_sub(capacity)..count).collect();
            prop_assert_eq!(got, expected);
        }
    }
}
