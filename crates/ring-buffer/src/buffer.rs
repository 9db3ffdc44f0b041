//! Ring Buffer Implementation

use serde::{Serialize, Serializer};

/// Default buffer capacity (30 samples = ~1s of movement at 30fps)
pub const DEFAULT_CAPACITY: usize = 30;

/// Bounded FIFO window that overwrites its oldest entry when full.
///
/// Unlike a lock-free SPSC queue this buffer is owned by exactly one
/// tracker and mutated through `&mut self`, so no atomics are needed.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    /// Pre-allocated slots
    storage: Box<[Option<T>]>,
    /// Index of the oldest element
    tail: usize,
    /// Number of occupied slots
    len: usize,
    /// Total items ever pushed (for statistics)
    total_written: usize,
}

impl<T> RingBuffer<T> {
    /// Create a new ring buffer holding at most `capacity` items
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Ring buffer capacity must be > 0");
        let storage: Vec<Option<T>> = (0..capacity).map(|_| None).collect();
        Self {
            storage: storage.into_boxed_slice(),
            tail: 0,
            len: 0,
            total_written: 0,
        }
    }

    /// Create a buffer with default capacity (30 items)
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }

    /// Push an item, returning the evicted oldest item if the buffer was full
    pub fn push(&mut self, item: T) -> Option<T> {
        let capacity = self.capacity();
        self.total_written += 1;

        if self.len < capacity {
            let head = (self.tail + self.len) % capacity;
            self.storage[head] = Some(item);
            self.len += 1;
            None
        } else {
            // Full: the slot at tail is both the oldest and the next write slot
            let evicted = self.storage[self.tail].replace(item);
            self.tail = (self.tail + 1) % capacity;
            evicted
        }
    }

    /// Number of items currently held
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Check if buffer is full
    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Get the buffer capacity
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Get fill ratio (0.0 to 1.0)
    pub fn fill_ratio(&self) -> f64 {
        self.len as f64 / self.capacity() as f64
    }

    /// Get total items written (for statistics)
    pub fn total_written(&self) -> usize {
        self.total_written
    }

    /// Most recently pushed item
    pub fn latest(&self) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        let idx = (self.tail + self.len - 1) % self.capacity();
        self.storage[idx].as_ref()
    }

    /// Iterate oldest to newest
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            buffer: self,
            offset: 0,
        }
    }

    /// Clear the buffer
    pub fn clear(&mut self) {
        for slot in self.storage.iter_mut() {
            *slot = None;
        }
        self.tail = 0;
        self.len = 0;
    }

    fn get(&self, offset: usize) -> Option<&T> {
        if offset >= self.len {
            return None;
        }
        let idx = (self.tail + offset) % self.capacity();
        self.storage[idx].as_ref()
    }
}

impl<T: Clone> RingBuffer<T> {
    /// Read the last N items (most recent first)
    pub fn read_last(&self, count: usize) -> Vec<T> {
        let count = count.min(self.len);
        (0..count)
            .filter_map(|i| self.get(self.len - 1 - i).cloned())
            .collect()
    }

    /// Copy out the contents, oldest to newest
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }
}

impl<T> Default for RingBuffer<T> {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

/// Oldest-to-newest iterator over a [`RingBuffer`]
pub struct Iter<'a, T> {
    buffer: &'a RingBuffer<T>,
    offset: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.buffer.get(self.offset)?;
        self.offset += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.buffer.len.saturating_sub(self.offset);
        (remaining, Some(remaining))
    }
}

impl<'a, T> ExactSizeIterator for Iter<'a, T> {}

impl<'a, T> IntoIterator for &'a RingBuffer<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: Serialize> Serialize for RingBuffer<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}
