//! Ring Buffer Implementation

/// Fixed-capacity ring buffer, oldest sample dropped on overflow
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    /// Pre-allocated storage
    storage: Box<[T]>,
    /// Index of the next write
    head: usize,
    /// Number of valid samples
    len: usize,
}

impl<T: Copy + Default> RingBuffer<T> {
    /// Create a new ring buffer with given capacity
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Ring buffer capacity must be > 0");
        Self {
            storage: vec![T::default(); capacity].into_boxed_slice(),
            head: 0,
            len: 0,
        }
    }

    /// Push a sample into the buffer (overwrites oldest if full)
    pub fn push(&mut self, value: T) {
        let capacity = self.capacity();
        self.storage[self.head] = value;
        self.head = (self.head + 1) % capacity;
        self.len = (self.len + 1).min(capacity);
    }

    /// Iterate samples from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        let capacity = self.capacity();
        let start = (self.head + capacity - self.len) % capacity;
        (0..self.len).map(move |i| &self.storage[(start + i) % capacity])
    }
}

impl<T> RingBuffer<T> {
    /// Get the number of samples currently in the buffer
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get the buffer capacity
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }
}

impl RingBuffer<f64> {
    /// Arithmetic mean of the buffered samples, `None` when empty
    pub fn mean(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        Some(self.iter().sum::<f64>() / self.len as f64)
    }
}
