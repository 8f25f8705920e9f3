//! Receive buffer pool.
//!
//! A fixed arena of descriptors cycling FREE -> FULL -> PENDING -> FREE.
//! The three lists are index queues over the arena, so a descriptor is
//! named by its `u8` index and never by pointer.
//!
//! - **Free**: order not significant
//! - **Full**: FIFO in arrival order, drained by delivery
//! - **Pending**: ascending by window offset, so the window allocator can
//!   merge-walk it
//!
//! Every method here runs inside the receive critical section.

use super::buffer::{BufferState, RxBuffer, Storage};
use crate::driver::error::{DmaResult, IoError, IoResult};
use crate::driver::protocol::PendingFrame;
use crate::internal::ring::HandleQueue;
use crate::internal::window::{Span, find_largest_free_span};

/// Number of buffers on each list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PoolCounts {
    /// Buffers ready to receive
    pub free: usize,
    /// Buffers holding undelivered frames
    pub full: usize,
    /// Buffers lent to the consumer
    pub pending: usize,
}

/// Buffer at the head of the Full list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FullHead {
    pub(crate) index: u8,
    pub(crate) generation: u16,
    pub(crate) storage: Storage,
}

/// Fixed pool of `N` receive descriptors plus `N` private SIR spares.
pub(crate) struct RxPool<const N: usize> {
    buffers: [RxBuffer; N],
    free: HandleQueue<N>,
    full: HandleQueue<N>,
    pending: HandleQueue<N>,
    spares: HandleQueue<N>,
}

impl<const N: usize> RxPool<N> {
    /// Every descriptor Free, every spare available
    pub(crate) fn new() -> Self {
        Self {
            buffers: [RxBuffer::new(); N],
            free: HandleQueue::filled(N),
            full: HandleQueue::new(),
            pending: HandleQueue::new(),
            spares: HandleQueue::filled(N),
        }
    }

    pub(crate) fn counts(&self) -> PoolCounts {
        PoolCounts {
            free: self.free.len(),
            full: self.full.len(),
            pending: self.pending.len(),
        }
    }

    // =========================================================================
    // FREE -> FULL
    // =========================================================================

    /// Pop a Free descriptor. `None` means the incoming frame must be dropped.
    #[inline]
    pub(crate) fn acquire_free(&mut self) -> Option<u8> {
        self.free.pop_front()
    }

    /// Put back a descriptor taken by [`acquire_free`](Self::acquire_free)
    /// that never received a payload.
    pub(crate) fn unacquire(&mut self, index: u8) {
        debug_assert_eq!(self.buffers[index as usize].state, BufferState::Free);
        self.free.push_front(index);
    }

    /// Take a private SIR spare
    #[inline]
    pub(crate) fn acquire_spare(&mut self) -> Option<u8> {
        self.spares.pop_front()
    }

    /// Record the payload and queue the buffer for delivery.
    pub(crate) fn mark_full(&mut self, index: u8, storage: Storage) {
        let buf = &mut self.buffers[index as usize];
        debug_assert_eq!(buf.state, BufferState::Free, "mark_full on a busy buffer");
        buf.state = BufferState::Full;
        buf.storage = Some(storage);
        self.full.push_back(index);
    }

    // =========================================================================
    // FULL -> FREE / PENDING
    // =========================================================================

    /// Oldest undelivered buffer, left on the Full list
    pub(crate) fn full_front(&self) -> Option<FullHead> {
        let index = self.full.front()?;
        let buf = &self.buffers[index as usize];
        Some(FullHead {
            index,
            generation: buf.generation,
            storage: buf.storage?,
        })
    }

    /// FULL -> FREE: frame consumed synchronously or discarded.
    pub(crate) fn release_full(&mut self, index: u8) {
        if self.full.remove(index) {
            self.release(index);
        }
    }

    /// FULL -> PENDING: the consumer keeps the frame (`len` deliverable bytes).
    pub(crate) fn defer(&mut self, index: u8, len: usize) {
        if !self.full.remove(index) {
            return;
        }
        let buf = &mut self.buffers[index as usize];
        buf.state = BufferState::Pending;
        buf.storage = buf.storage.map(|s| s.truncated(len));

        let buffers = &self.buffers;
        self.pending
            .insert_sorted_by_key(index, |i| buffers[i as usize].window_span().map_or(0, |s| s.offset));
    }

    /// Drop every undelivered frame (teardown, speed change with no consumer)
    pub(crate) fn reclaim_full(&mut self) {
        while let Some(index) = self.full.pop_front() {
            self.release(index);
        }
    }

    // =========================================================================
    // PENDING -> FREE
    // =========================================================================

    /// True when `token` names a buffer currently lent to the consumer
    pub(crate) fn is_pending(&self, token: &PendingFrame) -> bool {
        self.buffers
            .get(token.index() as usize)
            .is_some_and(|b| b.state == BufferState::Pending && b.generation == token.generation())
    }

    /// Storage lent out under `token`
    pub(crate) fn pending_storage(&self, token: &PendingFrame) -> Option<Storage> {
        if self.is_pending(token) {
            self.buffers[token.index() as usize].storage
        } else {
            None
        }
    }

    /// PENDING -> FREE. Stale or unknown tokens are rejected.
    pub(crate) fn release_pending(&mut self, token: PendingFrame) -> IoResult<()> {
        if !self.is_pending(&token) {
            return Err(IoError::NotPending);
        }
        self.pending.remove(token.index());
        self.release(token.index());
        Ok(())
    }

    /// Common exit to Free: drop the payload claim, return SIR storage to
    /// the spares, invalidate outstanding tokens.
    fn release(&mut self, index: u8) {
        let buf = &mut self.buffers[index as usize];
        if let Some(Storage::Private { slot, .. }) = buf.storage.take() {
            self.spares.push_back(slot);
        }
        buf.state = BufferState::Free;
        buf.generation = buf.generation.wrapping_add(1);
        self.free.push_back(index);
    }

    // =========================================================================
    // Window allocation
    // =========================================================================

    /// Largest free span of a `window_len` window not claimed by a Full or
    /// Pending buffer.
    pub(crate) fn largest_free_span(&self, window_len: usize, min_len: usize) -> DmaResult<Span> {
        // Full is in arrival order; a burst split by a transmit can leave it
        // out of address order, so sort the window claims first.
        let mut claims = [Span::default(); N];
        let mut count = 0;
        for span in self.full.iter().filter_map(|i| self.buffers[i as usize].window_span()) {
            let mut pos = count;
            while pos > 0 && claims[pos - 1].offset > span.offset {
                claims[pos] = claims[pos - 1];
                pos -= 1;
            }
            claims[pos] = span;
            count += 1;
        }

        let buffers = &self.buffers;
        find_largest_free_span(
            claims[..count].iter().map(|s| Some(*s)),
            self.pending.iter().map(|i| buffers[i as usize].window_span()),
            window_len,
            min_len,
        )
    }

    /// Check list membership and window disjointness.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        for (index, buf) in self.buffers.iter().enumerate() {
            let idx = index as u8;
            let lists = [
                self.free.contains(idx),
                self.full.contains(idx),
                self.pending.contains(idx),
            ];
            assert_eq!(lists.iter().filter(|&&on| on).count(), 1, "buffer {index} on {lists:?}");
            match buf.state {
                BufferState::Free => {
                    assert!(lists[0]);
                    assert!(buf.storage.is_none(), "free buffer {index} holds a payload");
                }
                BufferState::Full => assert!(lists[1]),
                BufferState::Pending => assert!(lists[2]),
            }
        }

        let claimed = || {
            self.full
                .iter()
                .chain(self.pending.iter())
                .filter_map(|i| self.buffers[i as usize].window_span())
        };
        for (a_pos, a) in claimed().enumerate() {
            for b in claimed().skip(a_pos + 1) {
                assert!(!a.overlaps(&b), "{a:?} overlaps {b:?}");
            }
        }

        let mut last = 0;
        for span in self.pending.iter().filter_map(|i| self.buffers[i as usize].window_span()) {
            assert!(span.offset >= last, "pending list out of address order");
            last = span.offset;
        }

        let private = self
            .buffers
            .iter()
            .filter(|b| matches!(b.storage, Some(Storage::Private { .. })))
            .count();
        assert_eq!(self.spares.len() + private, N, "spare leaked");
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
