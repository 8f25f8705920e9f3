//! Transmit scheduling and adapter state.
//!
//! [`TxScheduler`] lives behind the adapter's queue lock. It decides what
//! happens next on the transmit side; the adapter carries the decision out
//! against the hardware and the receive engine.

#[cfg(feature = "log")]
use log::debug;

use super::queue::{SendQueue, TxSlot};
use crate::driver::config::{AdapterState, Speed};
use crate::driver::error::DmaResult;
use crate::driver::protocol::FrameId;
use crate::internal::constants::TURNAROUND_TICK_US;

/// Next transmit step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TxAction {
    /// Nothing to do: queue empty, frame in flight, or timer running
    Idle,
    /// Head frame must wait; arm the turnaround timer for this many ms
    Wait(u32),
    /// Hand the head frame to the hardware
    Send,
}

/// When a requested speed takes effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SpeedRequest {
    /// Nothing queued; switch now
    Now,
    /// Switch once this frame has completed
    After(FrameId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SpeedChange {
    speed: Speed,
    after: FrameId,
}

/// Convert a turnaround delay to timer ticks: rounded to the nearest
/// millisecond, never less than one.
#[inline]
pub(crate) fn turnaround_ms(us: u32) -> u32 {
    (us.saturating_add(TURNAROUND_TICK_US / 2) / TURNAROUND_TICK_US).max(1)
}

pub(crate) struct TxScheduler<const N: usize> {
    queue: SendQueue<N>,
    state: AdapterState,
    open: bool,
    speed: Speed,
    write_pending: bool,
    turnaround_armed: bool,
    speed_change: Option<SpeedChange>,
    next_id: u32,
}

impl<const N: usize> TxScheduler<N> {
    pub(crate) fn new(speed: Speed) -> Self {
        Self {
            queue: SendQueue::new(),
            state: AdapterState::None,
            open: false,
            speed,
            write_pending: false,
            turnaround_armed: false,
            speed_change: None,
            next_id: 0,
        }
    }

    // =========================================================================
    // State
    // =========================================================================

    #[inline(always)]
    pub(crate) fn is_open(&self) -> bool {
        self.open
    }

    #[inline(always)]
    pub(crate) fn state(&self) -> AdapterState {
        self.state
    }

    #[inline(always)]
    pub(crate) fn speed(&self) -> Speed {
        self.speed
    }

    #[inline(always)]
    pub(crate) fn write_pending(&self) -> bool {
        self.write_pending
    }

    pub(crate) fn open(&mut self, speed: Speed) {
        self.open = true;
        self.speed = speed;
        self.state = AdapterState::Receiving;
    }

    /// Close and hand every queued id, in order, to `abort`.
    pub(crate) fn close(&mut self, mut abort: impl FnMut(FrameId)) {
        self.open = false;
        self.state = AdapterState::None;
        self.write_pending = false;
        self.turnaround_armed = false;
        self.speed_change = None;
        while let Some(id) = self.queue.pop() {
            abort(id);
        }
    }

    pub(crate) fn set_receiving(&mut self) {
        self.state = AdapterState::Receiving;
    }

    pub(crate) fn set_speed(&mut self, speed: Speed) {
        self.speed = speed;
    }

    // =========================================================================
    // Queue
    // =========================================================================

    /// Queue a frame and assign its id.
    pub(crate) fn enqueue(&mut self, frame: &[u8], turnaround_us: u32) -> DmaResult<FrameId> {
        let id = FrameId(self.next_id);
        self.queue.push(id, frame, turnaround_us)?;
        self.next_id = self.next_id.wrapping_add(1);
        Ok(id)
    }

    /// Frames queued, including the one in flight
    #[inline(always)]
    pub(crate) fn queued(&self) -> usize {
        self.queue.len()
    }

    pub(crate) fn head(&self) -> Option<&TxSlot> {
        self.queue.head()
    }

    /// Decide what to do with the queue head.
    ///
    /// A head with a turnaround delay stays at the head with its delay
    /// cleared, so it is waited for exactly once.
    pub(crate) fn next_action(&mut self) -> TxAction {
        if self.write_pending || self.turnaround_armed {
            return TxAction::Idle;
        }
        let Some(head) = self.queue.head_mut() else {
            return TxAction::Idle;
        };
        if head.turnaround_us > 0 {
            let ms = turnaround_ms(head.turnaround_us);
            head.turnaround_us = 0;
            self.turnaround_armed = true;
            return TxAction::Wait(ms);
        }
        TxAction::Send
    }

    /// The adapter handed the head frame to the hardware.
    pub(crate) fn mark_transmitting(&mut self) {
        self.state = AdapterState::Transmitting;
        self.write_pending = true;
    }

    /// Turnaround timer fired. Returns `true` if it was ours.
    pub(crate) fn turnaround_expired(&mut self) -> bool {
        core::mem::replace(&mut self.turnaround_armed, false)
    }

    /// The in-flight frame completed. Pops it and returns its id plus the
    /// speed to switch to, if a change was waiting on this frame.
    pub(crate) fn complete(&mut self) -> Option<(FrameId, Option<Speed>)> {
        if !self.write_pending {
            return None;
        }
        self.write_pending = false;
        let id = self.queue.pop()?;

        let switch = match self.speed_change {
            Some(change) if change.after == id => {
                self.speed_change = None;
                Some(change.speed)
            }
            _ => None,
        };
        Some((id, switch))
    }

    // =========================================================================
    // Speed
    // =========================================================================

    /// Record a speed request. Applies after the last frame queued so far.
    pub(crate) fn request_speed(&mut self, speed: Speed) -> SpeedRequest {
        match self.queue.tail_id() {
            Some(after) => {
                #[cfg(feature = "log")]
                debug!("irda: speed change deferred until frame {} completes", after.value());
                self.speed_change = Some(SpeedChange { speed, after });
                SpeedRequest::After(after)
            }
            None => {
                self.speed_change = None;
                SpeedRequest::Now
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    extern crate std;
    use std::vec::Vec;

    use super::*;

    fn open_scheduler() -> TxScheduler<4> {
        let mut tx = TxScheduler::new(Speed::Fir4M);
        tx.open(Speed::Fir4M);
        tx
    }

    #[test]
    fn turnaround_rounding() {
        assert_eq!(turnaround_ms(1), 1);
        assert_eq!(turnaround_ms(499), 1);
        assert_eq!(turnaround_ms(1499), 1);
        assert_eq!(turnaround_ms(1500), 2);
        assert_eq!(turnaround_ms(5000), 5);
        assert_eq!(turnaround_ms(20_000), 20);
        assert_eq!(turnaround_ms(1_000_000), 1000);
        assert_eq!(turnaround_ms(u32::MAX), u32::MAX / 1000);
    }

    #[test]
    fn send_then_complete() {
        let mut tx = open_scheduler();
        let id = tx.enqueue(&[0xFF, 0x3F], 0).unwrap();

        assert_eq!(tx.next_action(), TxAction::Send);
        tx.mark_transmitting();
        assert_eq!(tx.state(), AdapterState::Transmitting);
        assert_eq!(tx.next_action(), TxAction::Idle);

        assert_eq!(tx.complete(), Some((id, None)));
        assert_eq!(tx.queued(), 0);
        assert_eq!(tx.complete(), None);
    }

    #[test]
    fn turnaround_waited_exactly_once() {
        let mut tx = open_scheduler();
        tx.enqueue(&[1, 2], 2000).unwrap();

        assert_eq!(tx.next_action(), TxAction::Wait(2));
        assert_eq!(tx.next_action(), TxAction::Idle);
        assert!(tx.turnaround_expired());
        assert!(!tx.turnaround_expired());
        assert_eq!(tx.next_action(), TxAction::Send);
    }

    #[test]
    fn speed_change_waits_for_last_queued_frame() {
        let mut tx = open_scheduler();
        let first = tx.enqueue(&[1, 1], 0).unwrap();
        let last = tx.enqueue(&[2, 2], 0).unwrap();

        assert_eq!(tx.request_speed(Speed::Sir9600), SpeedRequest::After(last));
        tx.enqueue(&[3, 3], 0).unwrap();

        tx.mark_transmitting();
        assert_eq!(tx.complete(), Some((first, None)));
        tx.mark_transmitting();
        assert_eq!(tx.complete(), Some((last, Some(Speed::Sir9600))));
    }

    #[test]
    fn speed_change_immediate_when_idle() {
        let mut tx = open_scheduler();
        assert_eq!(tx.request_speed(Speed::Mir1152k), SpeedRequest::Now);
    }

    #[test]
    fn close_aborts_in_order() {
        let mut tx = open_scheduler();
        let ids: Vec<_> = (0..3).map(|_| tx.enqueue(&[0, 0], 0).unwrap()).collect();

        let mut aborted = Vec::new();
        tx.close(|id| aborted.push(id));
        assert_eq!(aborted, ids);
        assert!(!tx.is_open());
        assert_eq!(tx.state(), AdapterState::None);
    }

    #[test]
    fn ids_are_sequential() {
        let mut tx = open_scheduler();
        let a = tx.enqueue(&[0, 0], 0).unwrap();
        let b = tx.enqueue(&[0, 0], 0).unwrap();
        assert_eq!(b.value(), a.value() + 1);
    }
}
