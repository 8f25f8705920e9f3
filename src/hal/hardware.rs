//! Hardware collaborator trait.
//!
//! Implementations wrap the controller's register bank. All methods take
//! `&self` because the same register accessor is reached from interrupt,
//! deferred and caller contexts; the engine serializes the calls that must
//! not interleave.

use crate::driver::config::Speed;
use crate::driver::interrupt::InterruptMask;
use crate::internal::constants::{STATUS_FIFO_DEPTH, frame_stat, irq};

/// Direction of a DMA transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmaDirection {
    /// Controller writes received bytes into memory
    Receive,
    /// Controller reads bytes to transmit from memory
    Transmit,
}

/// One DMA programming request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DmaTransfer {
    /// Address of the first byte of the transfer
    pub addr: *mut u8,
    /// Offset of `addr` from the start of its buffer (window offset for
    /// receive, zero for transmit)
    pub offset: usize,
    /// Transfer length in bytes
    pub len: usize,
    /// Transfer direction
    pub direction: DmaDirection,
}

impl DmaTransfer {
    /// True for receive transfers
    #[inline(always)]
    pub fn is_receive(&self) -> bool {
        self.direction == DmaDirection::Receive
    }
}

/// Classified hardware frame error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Status FIFO overflowed; earlier entries were lost
    StatusFifoOverflow,
    /// Receive FIFO overran before DMA drained it
    RxFifoOverrun,
    /// Bad CRC
    Crc,
    /// Anything else (PHY decode error, length limit)
    Other,
}

/// One frame-status FIFO entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameStatus {
    /// Raw status byte (see `frame_stat` bits)
    pub status: u8,
    /// Bytes the frame occupies in the window, FCS included
    pub size: u16,
}

impl FrameStatus {
    /// Create a status entry
    #[must_use]
    pub const fn new(status: u8, size: u16) -> Self {
        Self { status, size }
    }

    /// A good frame of `size` bytes (FCS included)
    #[must_use]
    pub const fn good(size: u16) -> Self {
        Self::new(frame_stat::FRAME_PENDING, size)
    }

    /// An empty entry: nothing pending
    #[must_use]
    pub const fn empty() -> Self {
        Self::new(0, 0)
    }

    /// True when the entry describes a frame
    #[inline(always)]
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.status & frame_stat::FRAME_PENDING != 0
    }

    /// Classify the error bits, if any are set.
    ///
    /// Precedence follows how much of the stream is suspect: a lost status
    /// entry first, then lost bytes, then a bad CRC.
    #[must_use]
    pub const fn error(&self) -> Option<FrameError> {
        let bits = self.status & frame_stat::ALL_ERRORS;
        if bits == 0 {
            None
        } else if bits & frame_stat::STATUS_FIFO_OVERRUN != 0 {
            Some(FrameError::StatusFifoOverflow)
        } else if bits & frame_stat::RX_FIFO_OVERRUN != 0 {
            Some(FrameError::RxFifoOverrun)
        } else if bits & frame_stat::BAD_CRC != 0 {
            Some(FrameError::Crc)
        } else {
            Some(FrameError::Other)
        }
    }
}

/// One-shot timer purposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerKind {
    /// Minimum turnaround before the head frame may be sent
    Turnaround,
    /// Next receive DMA progress check
    RxPoll,
}

impl TimerKind {
    /// Interrupt bit raised when this timer expires
    #[inline(always)]
    pub const fn irq_bit(self) -> u8 {
        match self {
            TimerKind::Turnaround => irq::TURNAROUND_TIMER,
            TimerKind::RxPoll => irq::POLL_TIMER,
        }
    }
}

/// Operations the engine needs from the IrDA controller.
pub trait IrdaHardware {
    /// Pop the next frame-status FIFO entry. An empty FIFO returns an entry
    /// without `FRAME_PENDING`.
    fn read_status_fifo(&self) -> FrameStatus;

    /// Program and start a DMA transfer.
    fn start_dma(&self, transfer: DmaTransfer);

    /// Stop the active DMA transfer and return the bytes it did not move.
    fn complete_dma(&self) -> usize;

    /// Bytes the active DMA transfer has not yet moved, without stopping it.
    fn dma_remaining(&self) -> usize;

    /// Program the interrupt enable mask.
    fn set_interrupt_mask(&self, mask: InterruptMask);

    /// Reprogram the link bit rate (UART divisor, framer mode, DMA setup).
    fn set_speed(&self, speed: Speed);

    /// Read and clear the transmit underrun flag.
    ///
    /// Called once per completed send. An underrun must still be followed by
    /// the frame's `DMA_TX`/`SIR_TX` completion event.
    fn take_tx_underrun(&self) -> bool;

    /// Hand a complete SIR frame (FCS appended) to the byte-stuffing
    /// transmitter.
    fn start_sir_transmit(&self, frame: &[u8]);

    /// Arm the one-shot timer for `kind`, replacing an earlier arming of
    /// the same kind. Expiry raises [`TimerKind::irq_bit`].
    fn arm_timer(&self, kind: TimerKind, ms: u32);

    /// Discard everything left in the frame-status FIFO.
    fn flush_status_fifo(&self) {
        for _ in 0..STATUS_FIFO_DEPTH {
            if !self.read_status_fifo().is_pending() {
                break;
            }
        }
    }
}
