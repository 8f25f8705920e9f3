//! Outbound frame queue.
//!
//! Fixed slots, each holding a copy of one frame. The order queue keeps
//! strict FIFO; the only edit a queued frame ever sees is having its
//! turnaround delay cleared once it has been waited out.

use crate::driver::error::{DmaError, DmaResult};
use crate::driver::protocol::FrameId;
use crate::internal::constants::MAX_FRAME_SIZE;
use crate::internal::ring::HandleQueue;

/// One queued frame
pub(crate) struct TxSlot {
    pub(crate) id: FrameId,
    /// Minimum turnaround still to be waited before this frame goes out
    pub(crate) turnaround_us: u32,
    len: usize,
    data: [u8; MAX_FRAME_SIZE],
}

impl TxSlot {
    const fn new() -> Self {
        Self {
            id: FrameId(0),
            turnaround_us: 0,
            len: 0,
            data: [0; MAX_FRAME_SIZE],
        }
    }

    /// Frame bytes (no FCS)
    #[inline(always)]
    pub(crate) fn data(&self) -> &[u8] {
        &self.data[..self.len]
    }
}

/// FIFO of up to `N` frames.
pub(crate) struct SendQueue<const N: usize> {
    slots: [TxSlot; N],
    order: HandleQueue<N>,
    free: HandleQueue<N>,
}

impl<const N: usize> SendQueue<N> {
    pub(crate) fn new() -> Self {
        Self {
            slots: [const { TxSlot::new() }; N],
            order: HandleQueue::new(),
            free: HandleQueue::filled(N),
        }
    }

    #[inline(always)]
    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    /// Copy `frame` to the tail.
    pub(crate) fn push(&mut self, id: FrameId, frame: &[u8], turnaround_us: u32) -> DmaResult<()> {
        if frame.len() > MAX_FRAME_SIZE {
            return Err(DmaError::FrameTooLarge);
        }
        let slot = self.free.pop_front().ok_or(DmaError::QueueFull)?;
        let entry = &mut self.slots[slot as usize];
        entry.id = id;
        entry.turnaround_us = turnaround_us;
        entry.len = frame.len();
        entry.data[..frame.len()].copy_from_slice(frame);
        self.order.push_back(slot);
        Ok(())
    }

    pub(crate) fn head(&self) -> Option<&TxSlot> {
        self.order.front().map(|slot| &self.slots[slot as usize])
    }

    pub(crate) fn head_mut(&mut self) -> Option<&mut TxSlot> {
        self.order.front().map(|slot| &mut self.slots[slot as usize])
    }

    /// Id of the most recently queued frame
    pub(crate) fn tail_id(&self) -> Option<FrameId> {
        self.order.back().map(|slot| self.slots[slot as usize].id)
    }

    /// Remove the head, returning its id
    pub(crate) fn pop(&mut self) -> Option<FrameId> {
        let slot = self.order.pop_front()?;
        self.free.push_back(slot);
        Some(self.slots[slot as usize].id)
    }
}
