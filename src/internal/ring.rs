//! Fixed-capacity circular queue of buffer indices.
//!
//! The Free, Full and Pending lists are all instances of [`HandleQueue`]:
//! an arena index per entry, a wraparound head and a length. No entry is
//! ever stored twice in one queue.

/// Circular queue of `u8` indices with wraparound head.
pub struct HandleQueue<const N: usize> {
    /// Backing slots
    slots: [u8; N],
    /// Index of the front entry
    head: usize,
    /// Number of live entries
    len: usize,
}

impl<const N: usize> HandleQueue<N> {
    /// Create an empty queue
    #[must_use]
    pub const fn new() -> Self {
        const { assert!(N <= 256, "handle queue indices are u8") };
        Self {
            slots: [0; N],
            head: 0,
            len: 0,
        }
    }

    /// Create a queue holding `0..count` in order
    #[must_use]
    pub fn filled(count: usize) -> Self {
        let mut queue = Self::new();
        for idx in 0..count.min(N) {
            queue.push_back(idx as u8);
        }
        queue
    }

    /// Number of live entries
    #[inline(always)]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    fn slot(&self, pos: usize) -> usize {
        (self.head + pos) % N
    }

    /// Entry at logical position `pos` (0 = front)
    #[inline(always)]
    pub fn get(&self, pos: usize) -> Option<u8> {
        (pos < self.len).then(|| self.slots[self.slot(pos)])
    }

    /// Front entry without removing it
    #[inline(always)]
    pub fn front(&self) -> Option<u8> {
        self.get(0)
    }

    /// Back entry without removing it
    #[inline(always)]
    pub fn back(&self) -> Option<u8> {
        self.len.checked_sub(1).and_then(|pos| self.get(pos))
    }

    /// Append at the back. Returns `false` when full.
    pub fn push_back(&mut self, idx: u8) -> bool {
        if self.len == N {
            return false;
        }
        let slot = self.slot(self.len);
        self.slots[slot] = idx;
        self.len += 1;
        true
    }

    /// Insert at the front. Returns `false` when full.
    pub fn push_front(&mut self, idx: u8) -> bool {
        if self.len == N {
            return false;
        }
        self.head = (self.head + N - 1) % N;
        self.slots[self.head] = idx;
        self.len += 1;
        true
    }

    /// Remove and return the front entry
    pub fn pop_front(&mut self) -> Option<u8> {
        let idx = self.front()?;
        self.head = (self.head + 1) % N;
        self.len -= 1;
        Some(idx)
    }

    /// Position of `idx`, if queued
    pub fn position(&self, idx: u8) -> Option<usize> {
        self.iter().position(|queued| queued == idx)
    }

    /// True when `idx` is queued
    pub fn contains(&self, idx: u8) -> bool {
        self.position(idx).is_some()
    }

    /// Remove `idx` wherever it sits, keeping the order of the rest.
    pub fn remove(&mut self, idx: u8) -> bool {
        let Some(pos) = self.position(idx) else {
            return false;
        };
        for p in pos..self.len - 1 {
            let (dst, src) = (self.slot(p), self.slot(p + 1));
            self.slots[dst] = self.slots[src];
        }
        self.len -= 1;
        true
    }

    /// Insert keeping entries ascending by `key`. Equal keys go after
    /// existing entries. Returns `false` when full.
    pub fn insert_sorted_by_key<K: Ord>(&mut self, idx: u8, mut key: impl FnMut(u8) -> K) -> bool {
        if self.len == N {
            return false;
        }
        let new_key = key(idx);
        let pos = self
            .iter()
            .position(|queued| key(queued) > new_key)
            .unwrap_or(self.len);

        let mut p = self.len;
        while p > pos {
            let (dst, src) = (self.slot(p), self.slot(p - 1));
            self.slots[dst] = self.slots[src];
            p -= 1;
        }
        let slot = self.slot(pos);
        self.slots[slot] = idx;
        self.len += 1;
        true
    }

    /// Iterate front to back
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (0..self.len).map(move |pos| self.slots[self.slot(pos)])
    }
}

// =============================================================================
// Tests
// =============================================================================
