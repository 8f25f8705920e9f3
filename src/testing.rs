//! Testing utilities and mock implementations
//!
//! Mock hardware and a recording protocol consumer for exercising the
//! engine on the host.
//!
//! Only available when running `cargo test`.

// Note: The #[cfg(test)] attribute is applied in lib.rs where this module is declared
#![allow(missing_docs)]
#![allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]

extern crate std;

use core::cell::RefCell;
use std::collections::VecDeque;
use std::vec::Vec;

use crate::driver::config::Speed;
use crate::driver::interrupt::InterruptMask;
use crate::driver::protocol::{Delivery, FrameId, PendingFrame, Protocol, SendStatus};
use crate::hal::{DmaDirection, DmaTransfer, FrameStatus, IrdaHardware, TimerKind};

// =============================================================================
// Mock Hardware
// =============================================================================

/// One call made by the engine into the hardware
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HwEvent {
    StartDma {
        offset: usize,
        len: usize,
        direction: DmaDirection,
        at_ms: u64,
    },
    CompleteDma {
        remaining: usize,
    },
    SetMask(InterruptMask),
    SetSpeed(Speed),
    SirTransmit {
        len: usize,
        at_ms: u64,
    },
    ArmTimer {
        kind: TimerKind,
        ms: u32,
    },
}

#[derive(Debug, Default)]
struct MockState {
    status_fifo: VecDeque<FrameStatus>,
    active: Option<DmaTransfer>,
    written: usize,
    tx_underrun: bool,
    events: Vec<HwEvent>,
    now_ms: u64,
    turnaround_deadline: Option<u64>,
    poll_deadline: Option<u64>,
    mask: InterruptMask,
    speed: Option<Speed>,
    transmitted: Vec<Vec<u8>>,
}

/// Mock IrDA controller.
///
/// Received MIR/FIR frames are written through the address of the active
/// receive DMA, exactly where the engine told the hardware to put them,
/// and a matching entry is pushed onto the frame-status FIFO.
///
/// # Example
///
/// ```ignore
/// let hw = MockHardware::new();
/// let irda = TestIrda::new(hw, fir_config()).unwrap();
/// irda.open().unwrap();
/// irda.hardware().receive_frame(&[0xAA; 64], 4);
/// ```
#[derive(Debug, Default)]
pub struct MockHardware {
    state: RefCell<MockState>,
}

impl MockHardware {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `data` plus `fcs_size` trailer bytes into the receive DMA and
    /// report a good frame.
    pub fn receive_frame(&self, data: &[u8], fcs_size: usize) {
        let size = data.len() + fcs_size;
        self.write_dma(data);
        self.write_dma(&std::vec![0xFC; fcs_size]);
        self.push_status(FrameStatus::good(size as u16));
    }

    /// Write `size` bytes and report them with the given error bits.
    pub fn receive_bad_frame(&self, size: usize, error_bits: u8) {
        self.write_dma(&std::vec![0xEE; size]);
        self.push_status(FrameStatus::new(
            crate::internal::constants::frame_stat::FRAME_PENDING | error_bits,
            size as u16,
        ));
    }

    /// Append raw bytes to the active receive DMA
    pub fn write_dma(&self, bytes: &[u8]) {
        let mut state = self.state.borrow_mut();
        let transfer = state.active.expect("no receive DMA armed");
        assert!(transfer.is_receive(), "DMA armed for transmit");
        assert!(state.written + bytes.len() <= transfer.len, "receive DMA overflow");
        for (i, byte) in bytes.iter().enumerate() {
            // SAFETY: the engine programmed `transfer.len` writable bytes at
            // `transfer.addr`; the bound is asserted above.
            unsafe { transfer.addr.add(state.written + i).write(*byte) };
        }
        state.written += bytes.len();
    }

    pub fn push_status(&self, status: FrameStatus) {
        self.state.borrow_mut().status_fifo.push_back(status);
    }

    pub fn status_fifo_len(&self) -> usize {
        self.state.borrow().status_fifo.len()
    }

    pub fn set_underrun(&self) {
        self.state.borrow_mut().tx_underrun = true;
    }

    /// Active receive DMA as `(offset, len)`
    pub fn rx_dma(&self) -> Option<(usize, usize)> {
        self.state
            .borrow()
            .active
            .filter(DmaTransfer::is_receive)
            .map(|t| (t.offset, t.len))
    }

    pub fn events(&self) -> Vec<HwEvent> {
        self.state.borrow().events.clone()
    }

    pub fn clear_events(&self) {
        self.state.borrow_mut().events.clear();
    }

    /// Frames handed to the transmitter, in order (SIR frames carry their FCS)
    pub fn transmitted(&self) -> Vec<Vec<u8>> {
        self.state.borrow().transmitted.clone()
    }

    /// Times at which transmissions were started, in order
    pub fn transmit_times(&self) -> Vec<u64> {
        self.state
            .borrow()
            .events
            .iter()
            .filter_map(|e| match e {
                HwEvent::StartDma {
                    direction: DmaDirection::Transmit,
                    at_ms,
                    ..
                }
                | HwEvent::SirTransmit { at_ms, .. } => Some(*at_ms),
                _ => None,
            })
            .collect()
    }

    pub fn mask(&self) -> InterruptMask {
        self.state.borrow().mask
    }

    pub fn speed(&self) -> Option<Speed> {
        self.state.borrow().speed
    }

    pub fn now_ms(&self) -> u64 {
        self.state.borrow().now_ms
    }

    pub fn turnaround_deadline(&self) -> Option<u64> {
        self.state.borrow().turnaround_deadline
    }

    /// Advance the clock. Returns the interrupt bits of timers that expired.
    pub fn advance_ms(&self, ms: u64) -> u8 {
        let mut state = self.state.borrow_mut();
        state.now_ms += ms;
        let now = state.now_ms;
        let mut bits = 0;
        if state.turnaround_deadline.is_some_and(|d| d <= now) {
            state.turnaround_deadline = None;
            bits |= TimerKind::Turnaround.irq_bit();
        }
        if state.poll_deadline.is_some_and(|d| d <= now) {
            state.poll_deadline = None;
            bits |= TimerKind::RxPoll.irq_bit();
        }
        bits
    }
}

impl IrdaHardware for MockHardware {
    fn read_status_fifo(&self) -> FrameStatus {
        self.state
            .borrow_mut()
            .status_fifo
            .pop_front()
            .unwrap_or_else(FrameStatus::empty)
    }

    fn start_dma(&self, transfer: DmaTransfer) {
        let mut state = self.state.borrow_mut();
        assert!(state.active.is_none(), "DMA started while another is active");
        let at_ms = state.now_ms;
        state.events.push(HwEvent::StartDma {
            offset: transfer.offset,
            len: transfer.len,
            direction: transfer.direction,
            at_ms,
        });
        if transfer.direction == DmaDirection::Transmit {
            // SAFETY: the engine hands over `len` readable bytes at `addr`.
            let bytes = unsafe { core::slice::from_raw_parts(transfer.addr, transfer.len) };
            state.transmitted.push(bytes.to_vec());
        }
        state.active = Some(transfer);
        state.written = 0;
    }

    fn complete_dma(&self) -> usize {
        let mut state = self.state.borrow_mut();
        let remaining = match state.active.take() {
            Some(t) if t.is_receive() => t.len - state.written,
            _ => 0,
        };
        state.written = 0;
        state.events.push(HwEvent::CompleteDma { remaining });
        remaining
    }

    fn dma_remaining(&self) -> usize {
        let state = self.state.borrow();
        state.active.map_or(0, |t| t.len - state.written)
    }

    fn set_interrupt_mask(&self, mask: InterruptMask) {
        let mut state = self.state.borrow_mut();
        state.mask = mask;
        state.events.push(HwEvent::SetMask(mask));
    }

    fn set_speed(&self, speed: Speed) {
        let mut state = self.state.borrow_mut();
        state.speed = Some(speed);
        state.events.push(HwEvent::SetSpeed(speed));
    }

    fn take_tx_underrun(&self) -> bool {
        core::mem::take(&mut self.state.borrow_mut().tx_underrun)
    }

    fn start_sir_transmit(&self, frame: &[u8]) {
        let mut state = self.state.borrow_mut();
        let at_ms = state.now_ms;
        state.events.push(HwEvent::SirTransmit {
            len: frame.len(),
            at_ms,
        });
        state.transmitted.push(frame.to_vec());
    }

    fn arm_timer(&self, kind: TimerKind, ms: u32) {
        let mut state = self.state.borrow_mut();
        let deadline = state.now_ms + u64::from(ms);
        match kind {
            TimerKind::Turnaround => state.turnaround_deadline = Some(deadline),
            TimerKind::RxPoll => state.poll_deadline = Some(deadline),
        }
        state.events.push(HwEvent::ArmTimer { kind, ms });
    }
}

// =============================================================================
// Mock Protocol
// =============================================================================

/// Recording consumer.
///
/// Accepts or defers every frame according to `policy`; deferred tokens are
/// kept in `tokens` for the test to release.
#[derive(Debug)]
pub struct MockProtocol {
    pub policy: Delivery,
    pub received: Vec<Vec<u8>>,
    pub tokens: Vec<PendingFrame>,
    pub completions: Vec<(FrameId, SendStatus)>,
    pub media_busy: usize,
}

impl MockProtocol {
    pub fn accepting() -> Self {
        Self::with_policy(Delivery::Accepted)
    }

    pub fn deferring() -> Self {
        Self::with_policy(Delivery::Deferred)
    }

    fn with_policy(policy: Delivery) -> Self {
        Self {
            policy,
            received: Vec::new(),
            tokens: Vec::new(),
            completions: Vec::new(),
            media_busy: 0,
        }
    }
}

impl Protocol for MockProtocol {
    fn on_frame_received(&mut self, frame: &[u8], token: PendingFrame) -> Delivery {
        self.received.push(frame.to_vec());
        if self.policy == Delivery::Deferred {
            self.tokens.push(token);
        }
        self.policy
    }

    fn on_send_complete(&mut self, id: FrameId, status: SendStatus) {
        self.completions.push((id, status));
    }

    fn on_media_busy(&mut self) {
        self.media_busy += 1;
    }
}
