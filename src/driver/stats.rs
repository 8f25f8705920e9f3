//! Per-adapter statistics counters.
//!
//! Counters are updated from interrupt, deferred and caller contexts, so each
//! one is an independent relaxed atomic. [`Statistics::snapshot`] copies them
//! into a plain [`IrdaStats`] for reporting.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::hal::FrameError;

/// Plain copy of the adapter counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IrdaStats {
    /// Frames handed to the upstream consumer
    pub rx_delivered: u32,
    /// Frames dropped for any reason
    pub rx_dropped: u32,
    /// CRC/FCS failures (hardware-reported or SIR software check)
    pub rx_crc_errors: u32,
    /// Frame-status FIFO overflows
    pub rx_status_fifo_overflows: u32,
    /// Receive FIFO overruns
    pub rx_fifo_overruns: u32,
    /// Other hardware-reported frame errors (PHY, length limit)
    pub rx_other_errors: u32,
    /// Frames outside `[min_header_size, max_frame_size]`
    pub rx_size_errors: u32,
    /// Frames dropped because no receive buffer was free
    pub rx_no_buffer: u32,
    /// Times reception stalled for lack of window space
    pub rx_window_stalls: u32,
    /// Frames handed to the transmitter
    pub tx_started: u32,
    /// Sends completed successfully
    pub tx_completed: u32,
    /// Sends failed by transmit underrun
    pub tx_underruns: u32,
    /// Queued sends discarded at close
    pub tx_aborted: u32,
}

/// Live counters owned by the adapter.
#[derive(Debug, Default)]
pub struct Statistics {
    rx_delivered: AtomicU32,
    rx_dropped: AtomicU32,
    rx_crc_errors: AtomicU32,
    rx_status_fifo_overflows: AtomicU32,
    rx_fifo_overruns: AtomicU32,
    rx_other_errors: AtomicU32,
    rx_size_errors: AtomicU32,
    rx_no_buffer: AtomicU32,
    rx_window_stalls: AtomicU32,
    tx_started: AtomicU32,
    tx_completed: AtomicU32,
    tx_underruns: AtomicU32,
    tx_aborted: AtomicU32,
}

#[inline(always)]
fn bump(counter: &AtomicU32) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl Statistics {
    /// Create zeroed counters (const, suitable for static initialization)
    pub const fn new() -> Self {
        Self {
            rx_delivered: AtomicU32::new(0),
            rx_dropped: AtomicU32::new(0),
            rx_crc_errors: AtomicU32::new(0),
            rx_status_fifo_overflows: AtomicU32::new(0),
            rx_fifo_overruns: AtomicU32::new(0),
            rx_other_errors: AtomicU32::new(0),
            rx_size_errors: AtomicU32::new(0),
            rx_no_buffer: AtomicU32::new(0),
            rx_window_stalls: AtomicU32::new(0),
            tx_started: AtomicU32::new(0),
            tx_completed: AtomicU32::new(0),
            tx_underruns: AtomicU32::new(0),
            tx_aborted: AtomicU32::new(0),
        }
    }

    pub(crate) fn record_delivered(&self) {
        bump(&self.rx_delivered);
    }

    /// A hardware-reported frame error. Counts one drop plus its class.
    pub(crate) fn record_frame_error(&self, error: FrameError) {
        bump(&self.rx_dropped);
        bump(match error {
            FrameError::StatusFifoOverflow => &self.rx_status_fifo_overflows,
            FrameError::RxFifoOverrun => &self.rx_fifo_overruns,
            FrameError::Crc => &self.rx_crc_errors,
            FrameError::Other => &self.rx_other_errors,
        });
    }

    pub(crate) fn record_size_error(&self) {
        bump(&self.rx_dropped);
        bump(&self.rx_size_errors);
    }

    pub(crate) fn record_no_buffer(&self) {
        bump(&self.rx_dropped);
        bump(&self.rx_no_buffer);
    }

    pub(crate) fn record_window_stall(&self) {
        bump(&self.rx_window_stalls);
    }

    pub(crate) fn record_tx_started(&self) {
        bump(&self.tx_started);
    }

    pub(crate) fn record_tx_completed(&self) {
        bump(&self.tx_completed);
    }

    pub(crate) fn record_tx_underrun(&self) {
        bump(&self.tx_underruns);
    }

    pub(crate) fn record_tx_aborted(&self) {
        bump(&self.tx_aborted);
    }

    /// Copy every counter
    pub fn snapshot(&self) -> IrdaStats {
        let load = |c: &AtomicU32| c.load(Ordering::Relaxed);
        IrdaStats {
            rx_delivered: load(&self.rx_delivered),
            rx_dropped: load(&self.rx_dropped),
            rx_crc_errors: load(&self.rx_crc_errors),
            rx_status_fifo_overflows: load(&self.rx_status_fifo_overflows),
            rx_fifo_overruns: load(&self.rx_fifo_overruns),
            rx_other_errors: load(&self.rx_other_errors),
            rx_size_errors: load(&self.rx_size_errors),
            rx_no_buffer: load(&self.rx_no_buffer),
            rx_window_stalls: load(&self.rx_window_stalls),
            tx_started: load(&self.tx_started),
            tx_completed: load(&self.tx_completed),
            tx_underruns: load(&self.tx_underruns),
            tx_aborted: load(&self.tx_aborted),
        }
    }
}
